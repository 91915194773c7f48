use std::collections::VecDeque;

use async_trait::async_trait;
use parking_lot::Mutex;
use portal_errors::{AppError, AppResult};
use portal_ports::{ScriptCall, ScriptRunner};
use serde_json::Value;

/// 记录调用并按顺序返回预设响应的脚本执行器
#[derive(Default)]
pub struct FakeRunner {
    responses: Mutex<VecDeque<AppResult<Value>>>,
    pub calls: Mutex<Vec<(String, Option<String>, ScriptCall)>>,
}

impl FakeRunner {
    pub fn replying(responses: Vec<Value>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().map(Ok).collect()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: AppError) -> Self {
        Self {
            responses: Mutex::new(VecDeque::from([Err(error)])),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn last_call(&self) -> (String, Option<String>, ScriptCall) {
        self.calls.lock().last().cloned().expect("no script call recorded")
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

#[async_trait]
impl ScriptRunner for FakeRunner {
    async fn run(&self, script: &str, url: Option<&str>, call: ScriptCall) -> AppResult<Value> {
        self.calls
            .lock()
            .push((script.to_string(), url.map(str::to_string), call));
        self.responses
            .lock()
            .pop_front()
            .unwrap_or(Ok(Value::Null))
    }
}
