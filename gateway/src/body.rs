//! 请求体与响应体工具

use axum::{
    Json,
    body::Bytes,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use portal_errors::{AppError, AppResult, ErrorBody};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// 解析 JSON 请求体，空请求体按 `T::default()` 处理
pub fn parse_json<T: DeserializeOwned + Default>(body: &Bytes) -> AppResult<T> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|_| AppError::validation("格式错误"))
}

/// 宽松解析：无法解析时为 `Value::Null`
pub fn parse_json_value(body: &Bytes) -> Value {
    serde_json::from_slice(body).unwrap_or(Value::Null)
}

/// 带固定文案的失败响应
pub fn failure(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(ErrorBody {
            success: false,
            error: message.to_string(),
        }),
    )
        .into_response()
}
