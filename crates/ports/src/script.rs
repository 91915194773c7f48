//! 远程脚本 trait 定义

use async_trait::async_trait;
use portal_errors::AppResult;
use serde::Serialize;
use serde_json::{Map, Value};

/// 脚本调用
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScriptCall {
    pub argv: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sheet_name: Option<String>,
}

impl ScriptCall {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.argv.insert(key.into(), value.into());
        self
    }

    pub fn sheet(mut self, sheet_name: impl Into<String>) -> Self {
        self.sheet_name = Some(sheet_name.into());
        self
    }

    /// 请求体 `{"Context": {...}}`
    pub fn to_body(&self) -> Value {
        let mut context = Map::new();
        context.insert("argv".to_string(), Value::Object(self.argv.clone()));
        if let Some(sheet) = &self.sheet_name {
            context.insert("sheet_name".to_string(), Value::String(sheet.clone()));
        }
        let mut body = Map::new();
        body.insert("Context".to_string(), Value::Object(context));
        Value::Object(body)
    }
}

/// 远程脚本执行（WPS AirScript）
#[async_trait]
pub trait ScriptRunner: Send + Sync {
    /// 执行脚本并返回原始 JSON 响应
    async fn run(&self, script: &str, url: Option<&str>, call: ScriptCall) -> AppResult<Value>;
}
