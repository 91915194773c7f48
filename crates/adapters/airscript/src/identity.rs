//! 基于人员名单表的身份网关

use std::sync::Arc;

use async_trait::async_trait;
use portal_auth_core::DEFAULT_ROLE;
use portal_common::{FieldAliases, normalize_phone};
use portal_errors::AppResult;
use portal_ports::{IdentityGateway, IdentityRecord, ScriptCall, ScriptRunner};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::envelope;

const SCRIPT: &str = "users";
const ROSTER_SHEET: &str = "名单";

pub const PHONE_FIELD: FieldAliases = FieldAliases::new("phone", &["电话", "phonenum", "phone"]);
pub const NAME_FIELD: FieldAliases = FieldAliases::new("name", &["姓名", "name", "username"]);
pub const ROLE_FIELD: FieldAliases = FieldAliases::new("role", &["身份", "role", "职位"]);
pub const OPENID_FIELD: FieldAliases =
    FieldAliases::new("openid", &["openid", "微信openid", "OpenID"]);

/// AirScript 身份网关
pub struct AirScriptIdentityGateway {
    runner: Arc<dyn ScriptRunner>,
    url: Option<String>,
}

impl AirScriptIdentityGateway {
    pub fn new(runner: Arc<dyn ScriptRunner>, url: Option<String>) -> Self {
        Self { runner, url }
    }

    async fn fetch_roster(&self) -> AppResult<Vec<Value>> {
        let call = ScriptCall::new()
            .arg("action", "get_users")
            .sheet(ROSTER_SHEET);
        let body = self.runner.run(SCRIPT, self.url.as_deref(), call).await?;
        let records = envelope::extract_records(&body);
        debug!(count = records.len(), "Fetched roster");
        Ok(records)
    }
}

/// 把名单中的一行转换为人员记录
pub fn identity_from_record(record: &Value) -> Option<IdentityRecord> {
    let phone = PHONE_FIELD.lookup_str(record)?;
    Some(IdentityRecord {
        phone,
        name: NAME_FIELD.lookup_str(record),
        role: ROLE_FIELD.lookup_or(record, DEFAULT_ROLE),
        external_id: OPENID_FIELD.lookup_str(record),
    })
}

#[async_trait]
impl IdentityGateway for AirScriptIdentityGateway {
    async fn get_identity(&self, phone: &str) -> AppResult<Option<IdentityRecord>> {
        let target = normalize_phone(phone);
        if target.is_empty() {
            return Ok(None);
        }

        let identity = self
            .fetch_roster()
            .await?
            .iter()
            .filter_map(identity_from_record)
            .find(|identity| identity.phone == target);

        if identity.is_some() {
            info!(phone = %target, "Identity found in roster");
        }
        Ok(identity)
    }

    async fn resolve_identity_by_external_id(
        &self,
        external_id: &str,
    ) -> AppResult<Option<String>> {
        let target = external_id.trim();
        if target.is_empty() {
            return Ok(None);
        }

        Ok(self
            .fetch_roster()
            .await?
            .iter()
            .filter_map(identity_from_record)
            .find(|identity| identity.external_id.as_deref() == Some(target))
            .map(|identity| identity.phone))
    }

    async fn bind_external_id_to_phone(&self, external_id: &str, phone: &str) -> AppResult<bool> {
        let phone = normalize_phone(phone);
        let call = ScriptCall::new()
            .arg("action", "bind_openid")
            .arg("phone", phone.clone())
            .arg("openid", external_id.trim())
            .sheet(ROSTER_SHEET);
        let body = self.runner.run(SCRIPT, self.url.as_deref(), call).await?;

        if let Some(error) = envelope::error_message(&body) {
            warn!(phone = %phone, error = %error, "Openid binding rejected");
            return Ok(false);
        }

        let rejected = envelope::extract_result(&body)
            .and_then(|result| result.get("success").and_then(Value::as_bool))
            == Some(false);
        if rejected {
            warn!(phone = %phone, "Openid binding rejected by script");
            return Ok(false);
        }

        info!(phone = %phone, "Openid bound");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeRunner;
    use portal_errors::AppError;
    use serde_json::json;

    fn roster() -> Value {
        json!({
            "data": { "result": { "records": [
                { "fields": { "电话": "13800000000", "姓名": "张三", "身份": "股东", "openid": "oAAA" } },
                { "fields": { "phonenum": 13900000000u64, "name": "李四" } },
                { "phone": " 13700000000 ", "username": "王五", "职位": "店长" }
            ] } },
            "status": "finished"
        })
    }

    fn gateway(runner: FakeRunner) -> (AirScriptIdentityGateway, Arc<FakeRunner>) {
        let runner = Arc::new(runner);
        (
            AirScriptIdentityGateway::new(runner.clone(), Some("https://example.test/users".into())),
            runner,
        )
    }

    #[tokio::test]
    async fn test_get_identity_with_aliases() {
        let (gateway, runner) = gateway(FakeRunner::replying(vec![roster(), roster(), roster()]));

        let first = gateway.get_identity("13800000000").await.unwrap().unwrap();
        assert_eq!(first.name.as_deref(), Some("张三"));
        assert_eq!(first.role, "股东");
        assert_eq!(first.external_id.as_deref(), Some("oAAA"));

        let second = gateway.get_identity(" 13900000000").await.unwrap().unwrap();
        assert_eq!(second.name.as_deref(), Some("李四"));
        assert_eq!(second.role, DEFAULT_ROLE);

        let third = gateway.get_identity("13700000000").await.unwrap().unwrap();
        assert_eq!(third.role, "店长");

        let (script, url, call) = runner.last_call();
        assert_eq!(script, "users");
        assert_eq!(url.as_deref(), Some("https://example.test/users"));
        assert_eq!(call.sheet_name.as_deref(), Some("名单"));
        assert_eq!(call.argv.get("action"), Some(&json!("get_users")));
    }

    #[tokio::test]
    async fn test_unknown_phone_and_empty_roster() {
        let (gateway, _) = gateway(FakeRunner::replying(vec![
            roster(),
            json!({ "data": { "result": { "records": [] } } }),
        ]));

        assert!(!gateway.identity_exists("13600000000").await.unwrap());
        assert!(!gateway.identity_exists("13800000000").await.unwrap());
    }

    #[tokio::test]
    async fn test_blank_phone_skips_backend() {
        let (gateway, runner) = gateway(FakeRunner::replying(vec![roster()]));
        assert!(gateway.get_identity("  ").await.unwrap().is_none());
        assert_eq!(runner.call_count(), 0);
    }

    #[tokio::test]
    async fn test_backend_failure_is_an_error() {
        let (gateway, _) = gateway(FakeRunner::failing(AppError::external_unavailable(
            "timeout",
        )));
        let err = gateway.identity_exists("13800000000").await.unwrap_err();
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_resolve_by_openid() {
        let (gateway, _) = gateway(FakeRunner::replying(vec![roster(), roster()]));
        assert_eq!(
            gateway.resolve_identity_by_external_id("oAAA").await.unwrap().as_deref(),
            Some("13800000000")
        );
        assert_eq!(gateway.resolve_identity_by_external_id("oZZZ").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_bind_openid() {
        let (gateway, runner) = gateway(FakeRunner::replying(vec![
            json!({ "data": { "result": { "success": true } }, "status": "finished", "error": "" }),
            json!({ "data": { "result": { "success": false } }, "status": "finished" }),
            json!({ "errno": 10003, "msg": "no permission" }),
        ]));

        assert!(gateway.bind_external_id_to_phone("oBBB", "13900000000").await.unwrap());
        let (_, _, call) = runner.last_call();
        assert_eq!(call.argv.get("action"), Some(&json!("bind_openid")));
        assert_eq!(call.argv.get("phone"), Some(&json!("13900000000")));
        assert_eq!(call.argv.get("openid"), Some(&json!("oBBB")));

        assert!(!gateway.bind_external_id_to_phone("oBBB", "13900000000").await.unwrap());
        assert!(!gateway.bind_external_id_to_phone("oBBB", "13900000000").await.unwrap());
    }
}
