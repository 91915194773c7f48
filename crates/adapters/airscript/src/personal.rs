//! 当前用户的个人数据：手工数据、历史记录、工资

use portal_common::normalize_phone;
use portal_errors::AppResult;
use portal_ports::ScriptCall;
use serde_json::{Value, json};
use tracing::debug;

use crate::{BusinessScripts, envelope};

impl BusinessScripts {
    /// 美容师手工数据
    pub async fn manual_data(&self, phone: &str) -> AppResult<Vec<Value>> {
        let phone = normalize_phone(phone);
        debug!(phone = %phone, "Fetching manual data");

        let call = ScriptCall::new().arg("phone", phone);
        let body = self
            .runner
            .run("manual_data", self.urls.manual_data.as_deref(), call)
            .await?;
        Ok(envelope::extract_records(&body))
    }

    /// 区间内的历史记录，原样返回脚本结果
    pub async fn history(&self, start: &str, end: &str, phone: &str) -> AppResult<Value> {
        let call = ScriptCall::new()
            .arg("data", json!([start, end]))
            .arg("phone", normalize_phone(phone));
        let body = self
            .runner
            .run("history", self.urls.history.as_deref(), call)
            .await?;
        Ok(envelope::extract_result(&body).unwrap_or_else(|| json!([])))
    }

    /// 指定月份的工资
    pub async fn wages(&self, phone: &str, month: &str) -> AppResult<Vec<Value>> {
        let phone = normalize_phone(phone);
        debug!(phone = %phone, month, "Fetching wages");

        let call = ScriptCall::new()
            .arg("phone", phone)
            .arg("month", month.trim());
        let body = self
            .runner
            .run("wages", self.urls.wages.as_deref(), call)
            .await?;
        Ok(envelope::extract_records(&body))
    }
}
