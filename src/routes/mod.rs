//! Router assembly and the middleware stack shared by every route.

mod common;
mod diagnostics;
mod entity;

pub use common::common_routes;
pub use diagnostics::diagnostic_routes;
pub use entity::entity_routes;

use crate::error::AppError;
use crate::response::ApiResponse;
use crate::state::AppState;
use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::middleware::map_response;
use axum::response::{IntoResponse, Response};
use axum::Router;
use std::any::Any;
use thiserror::Error;
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;

/// A handler panicked; carries the panic payload when it was a string.
#[derive(Error, Debug)]
#[error("{0}")]
pub struct PanicError(String);

fn panic_envelope(payload: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "handler panicked".to_string()
    };
    AppError::Internal {
        kind: "panic",
        source: Box::new(PanicError(detail)),
    }
    .into_response()
}

async fn not_found() -> ApiResponse<()> {
    ApiResponse::not_found()
}

/// Handlers always answer 200, so any other status was produced by the router
/// itself (405, 413 ...) with a bare body. Re-wrap it as an envelope.
async fn envelope_router_status(response: Response) -> Response {
    let status = response.status();
    if status == StatusCode::OK {
        return response;
    }
    tracing::debug!(status = status.as_u16(), "wrapping router response in envelope");
    let message = status.canonical_reason().unwrap_or(crate::response::ERROR_MESSAGE);
    ApiResponse::<()>::error_code(status.as_u16(), message).into_response()
}

/// Health/readiness/version plus the greeting and diagnostic endpoints.
pub fn base_routes(state: AppState) -> Router {
    common_routes(state).merge(diagnostic_routes())
}

/// Wrap a fully assembled router with tracing, panic capture and a request body cap.
/// Oversized bodies are rejected by the extractors and still produce an envelope;
/// unknown paths and unsupported methods do too.
pub fn with_layers(router: Router, body_limit: usize) -> Router {
    router.fallback(not_found).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CatchPanicLayer::custom(panic_envelope as fn(_) -> _))
            .layer(map_response(envelope_router_status))
            .layer(DefaultBodyLimit::max(body_limit)),
    )
}
