//! AirScript 响应信封解析
//!
//! 脚本返回结构不固定，常见形态：
//! - `{"data": {"result": ...}, "status": "finished", "error": ""}`
//! - `{"records": [...]}` / `{"result": {"records": [...]}}`
//! - 直接返回数组
//!
//! `data.result` 可能是字符串化的 JSON，需要再解析一次。

use portal_errors::{AppError, AppResult};
use serde_json::Value;

/// 信封中携带的错误信息
pub fn error_message(body: &Value) -> Option<String> {
    if let Some(errno) = body.get("errno").and_then(Value::as_i64).filter(|n| *n != 0) {
        let msg = body.get("msg").and_then(Value::as_str).unwrap_or_default();
        return Some(format!("{} ({})", msg, errno));
    }

    match body.get("error") {
        Some(Value::String(e)) if !e.is_empty() => Some(e.clone()),
        Some(Value::Null) | Some(Value::String(_)) | None => None,
        Some(other) => Some(other.to_string()),
    }
}

/// 严格检查：出现错误或状态不是 `finished` 都视为失败
pub fn check_status(body: &Value) -> AppResult<()> {
    if let Some(error) = error_message(body) {
        return Err(AppError::external_service(format!("AirScript error: {}", error)));
    }

    match body.get("status").and_then(Value::as_str) {
        Some("finished") => Ok(()),
        other => Err(AppError::external_service(format!(
            "AirScript status: {}",
            other.unwrap_or("missing")
        ))),
    }
}

/// 解析字符串化的 JSON，失败时原样返回
pub fn parse_stringified(value: Value) -> Value {
    match value {
        Value::String(s) => serde_json::from_str(&s).unwrap_or(Value::String(s)),
        other => other,
    }
}

/// 取 `data.result`
pub fn extract_result(body: &Value) -> Option<Value> {
    body.get("data")
        .and_then(|data| data.get("result"))
        .filter(|result| !result.is_null())
        .cloned()
        .map(parse_stringified)
}

fn as_records(value: Option<&Value>) -> Option<Vec<Value>> {
    value.and_then(Value::as_array).cloned()
}

/// 从各种信封中取出记录数组，取不到时返回空数组
pub fn extract_records(body: &Value) -> Vec<Value> {
    if let Some(records) = as_records(body.get("records")) {
        return records;
    }

    if let Some(result) = extract_result(body) {
        if let Value::Array(records) = result {
            return records;
        }
        if let Some(records) = as_records(result.get("data")) {
            return records;
        }
        if let Some(nested) = result.get("records") {
            if let Some(records) = as_records(Some(nested)).or_else(|| as_records(nested.get("records"))) {
                return records;
            }
        }
    }

    if let Some(result) = body.get("result") {
        if let Some(records) = as_records(result.get("records")).or_else(|| as_records(Some(result))) {
            return records;
        }
    }

    match body {
        Value::Array(records) => records.clone(),
        _ => Vec::new(),
    }
}
