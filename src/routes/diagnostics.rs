//! Greeting and error-boundary diagnostic routes.

use crate::handlers::diagnostics::{business_exception, exception, hello, illegal_argument, success};
use axum::{routing::get, Router};

/// GET /hello and GET /api/test/{success,exception,business-exception,illegal-argument}.
pub fn diagnostic_routes() -> Router {
    Router::new().route("/hello", get(hello)).nest(
        "/api/test",
        Router::new()
            .route("/success", get(success))
            .route("/exception", get(exception))
            .route("/business-exception", get(business_exception))
            .route("/illegal-argument", get(illegal_argument)),
    )
}
