//! 手机号规范化

use serde_json::Value;

/// 规范化手机号：去除首尾空白
///
/// 表格里的手机号可能以数字形式出现，调用方应先用 [`value_to_string`] 转换。
pub fn normalize_phone(raw: &str) -> String {
    raw.trim().to_string()
}

/// 把 JSON 标量转成字符串，非标量与 null 返回 None
pub fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
