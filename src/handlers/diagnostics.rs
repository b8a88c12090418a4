//! Greeting and error-boundary diagnostic handlers.

use crate::error::{AppError, BusinessError};
use crate::extractors::ApiQuery;
use crate::response::{ApiResponse, SUCCESS_MESSAGE};
use serde::Deserialize;
use thiserror::Error;

/// Integer arithmetic fault (division by zero, overflow).
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("/ by zero")]
pub struct ArithmeticError;

#[derive(Debug, Deserialize)]
pub struct HelloParams {
    #[serde(default = "default_name")]
    pub name: String,
}

fn default_name() -> String {
    "World".to_string()
}

pub async fn hello(ApiQuery(params): ApiQuery<HelloParams>) -> ApiResponse<String> {
    ApiResponse::success_with(format!("Hello, {}!", params.name))
}

pub async fn success() -> ApiResponse<String> {
    ApiResponse::success_with(SUCCESS_MESSAGE.to_string())
}

fn divide(dividend: i32, divisor: i32) -> Result<i32, ArithmeticError> {
    dividend.checked_div(divisor).ok_or(ArithmeticError)
}

pub async fn exception() -> Result<ApiResponse<String>, AppError> {
    let quotient = divide(1, 0).map_err(AppError::internal)?;
    Ok(ApiResponse::success_with(quotient.to_string()))
}

pub async fn business_exception() -> Result<ApiResponse<String>, AppError> {
    Err(BusinessError::new("这是一个业务异常").into())
}

pub async fn illegal_argument() -> Result<ApiResponse<String>, AppError> {
    Err(AppError::invalid_argument("参数不合法"))
}
