//! 通用表格接口 `/api/v1` ~ `/api/v4`

use portal_errors::{AppError, AppResult};
use portal_ports::ScriptCall;
use serde_json::{Value, json};

use crate::{BusinessScripts, envelope};

/// 免验证码查询绩效时前端传入的标记
pub const AUTO_LOGIN_CODE: &str = "AUTO_LOGIN";

/// 表格种类
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SheetQuery {
    /// v1 文档列表
    Articles,
    /// v2 培训记录
    Training,
    /// v3 病例，可按姓名搜索
    Clinic { name: Option<String> },
    /// v4 绩效
    Performance { phonenum: String, code: Option<String> },
}

impl SheetQuery {
    pub fn sheet_name(&self) -> &'static str {
        match self {
            SheetQuery::Articles => "文档列表",
            SheetQuery::Training => "培训记录单",
            SheetQuery::Clinic { .. } => "病例提交表",
            SheetQuery::Performance { .. } => "绩效",
        }
    }
}

/// `result.data` 存在时取之，否则取 `result`
fn unwrap_data(result: Option<Value>) -> Value {
    match result {
        Some(result) => match result.get("data") {
            Some(data) if !data.is_null() => data.clone(),
            _ => result,
        },
        None => Value::Null,
    }
}

/// 绩效接口的响应
pub fn performance_response(code: Option<&str>, result: Option<Value>) -> Value {
    match code {
        Some(AUTO_LOGIN_CODE) => json!({
            "success": true,
            "verify": 1,
            "data": unwrap_data(result),
            "message": "查询成功",
        }),
        Some(_) => {
            let verified = result.as_ref().is_some_and(|r| {
                r.get("verify").and_then(Value::as_i64) == Some(1)
                    || r.get("success").and_then(Value::as_bool) == Some(true)
            });
            json!({
                "success": verified,
                "data": unwrap_data(result),
                "message": if verified { "验证成功" } else { "验证码错误" },
                "verify": if verified { 1 } else { 0 },
            })
        }
        None => json!({
            "success": true,
            "data": result.unwrap_or(Value::Null),
            "message": "发送成功",
            "verify": 0,
        }),
    }
}

impl BusinessScripts {
    pub async fn query_sheet(&self, query: SheetQuery) -> AppResult<Value> {
        let (script, url, call) = match &query {
            SheetQuery::Articles => ("articles", self.urls.articles.as_deref(), ScriptCall::new()),
            SheetQuery::Training => ("training", self.urls.training.as_deref(), ScriptCall::new()),
            SheetQuery::Clinic { name: Some(name) } => (
                "clinic_search",
                self.urls.clinic_search.as_deref(),
                ScriptCall::new().arg("name", name.as_str()),
            ),
            SheetQuery::Clinic { name: None } => {
                ("clinic", self.urls.clinic.as_deref(), ScriptCall::new())
            }
            SheetQuery::Performance { phonenum, code } => {
                if phonenum.trim().is_empty() {
                    return Err(AppError::validation("缺少phonenum参数"));
                }
                let mut call = ScriptCall::new().arg("phonenum", phonenum.as_str());
                if let Some(code) = code.as_deref().filter(|c| !c.is_empty()) {
                    call = call.arg("code", code);
                }
                ("performance", self.urls.performance.as_deref(), call)
            }
        };

        let body = self
            .runner
            .run(script, url, call.sheet(query.sheet_name()))
            .await?;
        let result = envelope::extract_result(&body);

        Ok(match &query {
            SheetQuery::Performance { code, .. } => {
                performance_response(code.as_deref().filter(|c| !c.is_empty()), result)
            }
            _ => json!({
                "success": true,
                "data": unwrap_data(result),
                "message": "请求成功",
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeRunner;
    use portal_config::ScriptUrls;
    use std::sync::Arc;

    fn scripts(responses: Vec<Value>) -> (BusinessScripts, Arc<FakeRunner>) {
        let runner = Arc::new(FakeRunner::replying(responses));
        (BusinessScripts::new(runner.clone(), ScriptUrls::default()), runner)
    }

    #[tokio::test]
    async fn test_articles_unwraps_data() {
        let (scripts, runner) = scripts(vec![json!({ "data": { "result": { "data": [{ "标题": "制度" }] } } })]);

        let response = scripts.query_sheet(SheetQuery::Articles).await.unwrap();
        assert_eq!(
            response,
            json!({ "success": true, "data": [{ "标题": "制度" }], "message": "请求成功" })
        );

        let (script, _, call) = runner.last_call();
        assert_eq!(script, "articles");
        assert_eq!(call.sheet_name.as_deref(), Some("文档列表"));
        assert!(call.argv.is_empty());
    }

    #[tokio::test]
    async fn test_clinic_search_by_name() {
        let (scripts, runner) = scripts(vec![json!({ "data": { "result": [] } }), json!({})]);

        scripts
            .query_sheet(SheetQuery::Clinic { name: Some("张三".into()) })
            .await
            .unwrap();
        let (script, _, call) = runner.last_call();
        assert_eq!(script, "clinic_search");
        assert_eq!(call.argv.get("name"), Some(&json!("张三")));
        assert_eq!(call.sheet_name.as_deref(), Some("病例提交表"));

        let response = scripts
            .query_sheet(SheetQuery::Clinic { name: None })
            .await
            .unwrap();
        assert_eq!(response["data"], Value::Null);
        assert_eq!(runner.last_call().0, "clinic");
    }

    #[tokio::test]
    async fn test_performance_requires_phonenum() {
        let (scripts, runner) = scripts(vec![]);
        let err = scripts
            .query_sheet(SheetQuery::Performance { phonenum: " ".into(), code: None })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(runner.call_count(), 0);
    }

    #[tokio::test]
    async fn test_performance_auto_login() {
        let (scripts, runner) = scripts(vec![json!({
            "data": { "result": "{\"data\":[{\"月份\":\"2025/11\"}]}" }
        })]);

        let response = scripts
            .query_sheet(SheetQuery::Performance {
                phonenum: "13800000000".into(),
                code: Some(AUTO_LOGIN_CODE.into()),
            })
            .await
            .unwrap();
        assert_eq!(response["success"], true);
        assert_eq!(response["verify"], 1);
        assert_eq!(response["data"], json!([{ "月份": "2025/11" }]));

        let (_, _, call) = runner.last_call();
        assert_eq!(call.argv.get("code"), Some(&json!(AUTO_LOGIN_CODE)));
        assert_eq!(call.sheet_name.as_deref(), Some("绩效"));
    }

    #[test]
    fn test_performance_code_verification() {
        let ok = performance_response(Some("123456"), Some(json!({ "verify": 1, "data": [1] })));
        assert_eq!(ok["success"], true);
        assert_eq!(ok["verify"], 1);
        assert_eq!(ok["data"], json!([1]));

        let by_success = performance_response(Some("123456"), Some(json!({ "success": true })));
        assert_eq!(by_success["message"], "验证成功");

        let bad = performance_response(Some("000000"), Some(json!({ "verify": 0 })));
        assert_eq!(bad["success"], false);
        assert_eq!(bad["verify"], 0);
        assert_eq!(bad["message"], "验证码错误");

        let none = performance_response(Some("000000"), None);
        assert_eq!(none["success"], false);
    }

    #[test]
    fn test_performance_send() {
        let sent = performance_response(None, Some(json!("ok")));
        assert_eq!(
            sent,
            json!({ "success": true, "data": "ok", "message": "发送成功", "verify": 0 })
        );
    }
}
