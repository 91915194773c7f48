//! 字段别名解析
//!
//! 外部表格的列名会漂移（中文/英文混用），每个逻辑字段用一组有序别名描述，
//! 按顺序取第一个非空值。

use serde_json::Value;

use crate::phone::value_to_string;

/// 逻辑字段及其别名（按优先级排序）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldAliases {
    pub field: &'static str,
    pub aliases: &'static [&'static str],
}

impl FieldAliases {
    pub const fn new(field: &'static str, aliases: &'static [&'static str]) -> Self {
        Self { field, aliases }
    }

    /// 取第一个非空值
    pub fn lookup<'a>(&self, record: &'a Value) -> Option<&'a Value> {
        let fields = record_fields(record);
        self.aliases
            .iter()
            .filter_map(|alias| fields.get(*alias))
            .find(|value| is_present(value))
    }

    /// 取第一个非空值并转成去除首尾空白的字符串
    pub fn lookup_str(&self, record: &Value) -> Option<String> {
        self.lookup(record)
            .and_then(value_to_string)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    /// 取字符串，缺失时使用默认值
    pub fn lookup_or(&self, record: &Value, default: &str) -> String {
        self.lookup_str(record)
            .unwrap_or_else(|| default.to_string())
    }
}

/// 记录的字段对象：优先取 `fields`，否则记录本身
pub fn record_fields(record: &Value) -> &Value {
    match record.get("fields") {
        Some(fields) if fields.is_object() => fields,
        _ => record,
    }
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}
