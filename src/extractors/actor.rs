//! Extract the acting user id from the request (`X-User-Id` header).

use crate::error::AppError;
use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};

/// Header carrying the caller's numeric user id.
pub const ACTOR_ID_HEADER: &str = "X-User-Id";

/// Optional actor id. Handlers copy it into `create_by` / `update_by`;
/// the service layer never fills those fields itself.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Actor(pub Option<i64>);

#[async_trait]
impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(raw) = parts.headers.get(ACTOR_ID_HEADER) else {
            return Ok(Actor(None));
        };
        let text = raw
            .to_str()
            .map_err(|_| AppError::invalid_argument(format!("{} must be ASCII", ACTOR_ID_HEADER)))?
            .trim();
        if text.is_empty() {
            return Ok(Actor(None));
        }
        let id = text.parse::<i64>().map_err(|_| {
            AppError::invalid_argument(format!("{} must be an integer, got '{}'", ACTOR_ID_HEADER, text))
        })?;
        Ok(Actor(Some(id)))
    }
}
