//! Common routes: health, readiness, version.

use crate::response::ApiResponse;
use crate::state::AppState;
use axum::{extract::State, routing::get, Router};
use serde::Serialize;

#[derive(Serialize)]
struct ReadyBody {
    status: &'static str,
    database: &'static str,
}

async fn health() -> ApiResponse<&'static str> {
    ApiResponse::success_with("ok")
}

async fn ready(State(state): State<AppState>) -> ApiResponse<ReadyBody> {
    if let Err(e) = sqlx::query("SELECT 1").fetch_optional(&state.pool).await {
        tracing::warn!(error = %e, "readiness check failed");
        return ApiResponse::new(
            503,
            "database unavailable",
            Some(ReadyBody {
                status: "degraded",
                database: "unavailable",
            }),
        );
    }
    ApiResponse::success_with(ReadyBody {
        status: "ok",
        database: "ok",
    })
}

async fn version() -> ApiResponse<serde_json::Value> {
    ApiResponse::success_with(serde_json::json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// GET /health, GET /ready (database ping), GET /version.
pub fn common_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready))
        .route("/version", get(version))
        .with_state(state)
}
