//! Typed errors and the boundary that turns every error into a response envelope.

use crate::response::ApiResponse;
use axum::response::{IntoResponse, Response};
use serde_json::{json, Value};
use std::any::type_name;
use thiserror::Error;

/// Code used by [`BusinessError::new`] when the caller gives none.
pub const DEFAULT_BUSINESS_CODE: u16 = 500;

const INVALID_ARGUMENT_PREFIX: &str = "参数异常: ";
const INTERNAL_PREFIX: &str = "系统异常: ";

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// An expected domain failure that carries its own status code.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct BusinessError {
    code: u16,
    message: String,
}

impl BusinessError {
    pub fn new(message: impl Into<String>) -> Self {
        Self::with_code(DEFAULT_BUSINESS_CODE, message)
    }

    pub fn with_code(code: u16, message: impl Into<String>) -> Self {
        BusinessError {
            code,
            message: message.into(),
        }
    }

    pub fn code(&self) -> u16 {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid value for {key}: '{value}' ({reason})")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Failures raised by the persistence layer itself rather than by the driver.
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("stale version {version} for {table} id {id}")]
    StaleVersion {
        table: &'static str,
        id: i64,
        version: i64,
    },
    #[error("{table} id {id} does not exist")]
    MissingRow { table: &'static str, id: i64 },
    #[error("batch operation on {table} exceeded {seconds}s")]
    Timeout { table: &'static str, seconds: u64 },
    #[error("invalid stored timestamp {0}")]
    Timestamp(i64),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Business(#[from] BusinessError),
    #[error("{0}")]
    InvalidArgument(String),
    /// Anything unexpected. `kind` is the runtime type name of `source`.
    #[error("{source}")]
    Internal { kind: &'static str, source: BoxError },
}

impl AppError {
    pub fn business(message: impl Into<String>) -> Self {
        AppError::Business(BusinessError::new(message))
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        AppError::InvalidArgument(message.into())
    }

    /// Wrap an arbitrary error, recording its type name for diagnostics.
    pub fn internal<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        AppError::Internal {
            kind: type_name::<E>(),
            source: Box::new(err),
        }
    }

    /// Business status code this error maps to.
    pub fn code(&self) -> u16 {
        match self {
            AppError::Business(e) => e.code(),
            AppError::InvalidArgument(_) => 400,
            AppError::Internal { .. } => 500,
        }
    }

    /// Log the error and build its envelope. Never fails.
    pub fn to_envelope(&self) -> ApiResponse<Value> {
        match self {
            AppError::Business(e) => {
                tracing::error!(code = e.code(), error = %e, "business error");
                ApiResponse::new(
                    e.code(),
                    e.message(),
                    Some(json!({ "code": e.code(), "message": e.message() })),
                )
            }
            AppError::InvalidArgument(msg) => {
                tracing::error!(error = %msg, "invalid argument");
                ApiResponse::new(
                    400,
                    format!("{}{}", INVALID_ARGUMENT_PREFIX, msg),
                    Some(json!({ "error": "InvalidArgument", "message": msg })),
                )
            }
            AppError::Internal { kind, source } => {
                tracing::error!(kind = %kind, error = %source, chain = ?source, "system error");
                ApiResponse::new(
                    500,
                    format!("{}{}", INTERNAL_PREFIX, source),
                    Some(json!({ "error": kind, "message": source.to_string() })),
                )
            }
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        AppError::internal(e)
    }
}

impl From<PersistenceError> for AppError {
    fn from(e: PersistenceError) -> Self {
        AppError::internal(e)
    }
}

impl From<ConfigError> for AppError {
    fn from(e: ConfigError) -> Self {
        AppError::internal(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.to_envelope().into_response()
    }
}
