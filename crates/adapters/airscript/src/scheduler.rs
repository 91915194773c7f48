//! 排班读写
//!
//! 排班脚本对状态要求严格：`errno`、`error` 或 `status != finished` 都视为失败。
//! 读取时过滤掉没有客户姓名/姓名的空记录，避免前端出现“未知客户”卡片。

use portal_common::FieldAliases;
use portal_errors::{AppError, AppResult};
use portal_ports::ScriptCall;
use serde_json::{Map, Value, json};

use crate::{BusinessScripts, envelope};

const DISPLAY_NAME: FieldAliases = FieldAliases::new("display_name", &["客户姓名", "姓名"]);

/// 记录是否带有可显示的姓名
pub fn has_display_name(record: &Value) -> bool {
    DISPLAY_NAME.lookup_str(record).is_some()
}

/// 过滤空记录
pub fn filter_ghost_records(records: Vec<Value>) -> Vec<Value> {
    records.into_iter().filter(has_display_name).collect()
}

/// 把 `data.result` 统一成 `{"data": [{"records": [...]}]}`
fn normalize_result(body: &Value) -> AppResult<Value> {
    let raw = body
        .get("data")
        .and_then(|data| data.get("result"))
        .cloned()
        .unwrap_or(Value::Null);

    let result = match raw.get("records") {
        Some(records) => {
            let inner = records.get("records").unwrap_or(records);
            json!({ "data": [{ "records": inner }] })
        }
        None => raw,
    };

    let result = match result {
        Value::String(text) => serde_json::from_str(&text).map_err(|e| {
            AppError::external_service(format!("Failed to parse AirScript result: {}", e))
        })?,
        other => other,
    };

    if result.is_null() {
        return Err(AppError::external_service("AirScript returned no data"));
    }
    Ok(result)
}

/// 过滤 `data[0].records` 或 `data` 中的空记录
fn filter_result(mut result: Value) -> Value {
    let Some(data) = result.get_mut("data").and_then(Value::as_array_mut) else {
        return result;
    };

    // 首项带 records 时只处理 records，非数组的 records 原样保留
    if let Some(records) = data.first_mut().and_then(|first| first.get_mut("records")) {
        if let Value::Array(items) = records {
            *items = filter_ghost_records(std::mem::take(items));
        }
    } else {
        let records = std::mem::take(data);
        *data = filter_ghost_records(records);
    }
    result
}

/// 结果本身带 `success` 时原样返回，否则包一层
fn wrap_result(result: Value) -> Value {
    if result.get("success").is_some() {
        return result;
    }
    let mut wrapped = Map::new();
    wrapped.insert("success".into(), Value::Bool(true));
    wrapped.insert("data".into(), result);
    wrapped.insert("message".into(), Value::String("请求成功".into()));
    Value::Object(wrapped)
}

impl BusinessScripts {
    /// 读取排班，`b` 由前端决定读取的视图
    pub async fn scheduler_read(&self, date: Option<&str>, b: i64) -> AppResult<Value> {
        let call = ScriptCall::new()
            .arg("method", "read")
            .arg("date", date.map_or(Value::Null, |d| Value::String(d.to_string())))
            .arg("b", b);
        let body = self
            .runner
            .run("scheduler", self.urls.scheduler.as_deref(), call)
            .await?;

        envelope::check_status(&body)?;
        let result = filter_result(normalize_result(&body)?);
        Ok(wrap_result(result))
    }

    /// 写入排班，请求体原样透传
    pub async fn scheduler_write(&self, data: Value) -> AppResult<Value> {
        let call = ScriptCall::new().arg("method", "write").arg("data", data);
        let body = self
            .runner
            .run("scheduler", self.urls.scheduler.as_deref(), call)
            .await?;

        envelope::check_status(&body)?;
        Ok(wrap_result(normalize_result(&body)?))
    }
}
