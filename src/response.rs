//! Uniform response envelope. Always sent at HTTP 200; the outcome lives in `code`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

pub const SUCCESS_MESSAGE: &str = "操作成功";
pub const ERROR_MESSAGE: &str = "操作失败";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub code: u16,
    pub message: String,
    pub data: Option<T>,
    /// Construction instant, epoch milliseconds.
    pub timestamp: i64,
}

impl<T> ApiResponse<T> {
    pub fn new(code: u16, message: impl Into<String>, data: Option<T>) -> Self {
        ApiResponse {
            code,
            message: message.into(),
            data,
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }

    pub fn success() -> Self {
        Self::new(200, SUCCESS_MESSAGE, None)
    }

    pub fn success_with(data: T) -> Self {
        Self::new(200, SUCCESS_MESSAGE, Some(data))
    }

    pub fn success_msg(message: impl Into<String>, data: T) -> Self {
        Self::new(200, message, Some(data))
    }

    pub fn error() -> Self {
        Self::new(500, ERROR_MESSAGE, None)
    }

    pub fn error_msg(message: impl Into<String>) -> Self {
        Self::new(500, message, None)
    }

    pub fn error_code(code: u16, message: impl Into<String>) -> Self {
        Self::new(code, message, None)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(400, message, None)
    }

    pub fn unauthorized() -> Self {
        Self::new(401, "未授权", None)
    }

    pub fn forbidden() -> Self {
        Self::new(403, "禁止访问", None)
    }

    pub fn not_found() -> Self {
        Self::new(404, "资源未找到", None)
    }

    pub fn is_success(&self) -> bool {
        self.code == 200
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}
