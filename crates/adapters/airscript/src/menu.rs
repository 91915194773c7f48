//! 应用菜单

use portal_auth_core::DEFAULT_ROLE;
use portal_common::FieldAliases;
use portal_errors::AppResult;
use portal_ports::ScriptCall;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{BusinessScripts, envelope};

const MENU_SHEET: &str = "应用";

const MENU_NAME: FieldAliases = FieldAliases::new("name", &["名称", "name"]);
const MENU_URL: FieldAliases = FieldAliases::new("url", &["URL", "链接", "url"]);
const MENU_ICON: FieldAliases = FieldAliases::new("icon", &["ICONURL", "img"]);
const MENU_TYPE: FieldAliases = FieldAliases::new("type", &["类型"]);

/// 菜单项
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItem {
    pub name: String,
    pub url: String,
    pub icon: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl MenuItem {
    pub fn from_record(record: &Value) -> Self {
        Self {
            name: MENU_NAME.lookup_or(record, "未命名"),
            url: MENU_URL.lookup_or(record, "#"),
            icon: MENU_ICON.lookup_or(record, ""),
            kind: MENU_TYPE.lookup_or(record, "常用应用"),
        }
    }
}

impl BusinessScripts {
    /// 按身份获取可见的应用菜单
    pub async fn app_menu(&self, role: &str) -> AppResult<Vec<MenuItem>> {
        let role = if role.trim().is_empty() {
            DEFAULT_ROLE
        } else {
            role.trim()
        };
        let call = ScriptCall::new()
            .arg("action", "get_menu")
            .arg("val", role)
            .sheet(MENU_SHEET);

        let body = self
            .runner
            .run("menu", self.urls.menu.as_deref(), call)
            .await?;

        Ok(envelope::extract_records(&body)
            .iter()
            .map(MenuItem::from_record)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeRunner;
    use portal_config::ScriptUrls;
    use serde_json::json;
    use std::sync::Arc;

    #[test]
    fn test_menu_item_aliases_and_defaults() {
        let full = MenuItem::from_record(&json!({ "fields": {
            "名称": "排班", "链接": "/scheduler.html", "ICONURL": "/img/s.png", "类型": "业务"
        } }));
        assert_eq!(
            full,
            MenuItem {
                name: "排班".into(),
                url: "/scheduler.html".into(),
                icon: "/img/s.png".into(),
                kind: "业务".into(),
            }
        );

        let empty = MenuItem::from_record(&json!({ "fields": {} }));
        assert_eq!(empty.name, "未命名");
        assert_eq!(empty.url, "#");
        assert_eq!(empty.icon, "");
        assert_eq!(empty.kind, "常用应用");
    }

    #[test]
    fn test_menu_item_serializes_type_field() {
        let item = MenuItem::from_record(&json!({ "name": "工资", "url": "/wages.html" }));
        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["type"], "常用应用");
    }

    #[tokio::test]
    async fn test_app_menu_passes_role() {
        let runner = Arc::new(FakeRunner::replying(vec![json!({
            "data": { "result": { "data": [ { "fields": { "名称": "历史" } } ] } }
        })]));
        let scripts = BusinessScripts::new(runner.clone(), ScriptUrls::default());

        let menu = scripts.app_menu("股东").await.unwrap();
        assert_eq!(menu.len(), 1);
        assert_eq!(menu[0].name, "历史");

        let (script, _, call) = runner.last_call();
        assert_eq!(script, "menu");
        assert_eq!(call.sheet_name.as_deref(), Some("应用"));
        assert_eq!(call.argv.get("val"), Some(&json!("股东")));
    }

    #[tokio::test]
    async fn test_app_menu_defaults_role() {
        let runner = Arc::new(FakeRunner::replying(vec![json!({ "records": [] })]));
        let scripts = BusinessScripts::new(runner.clone(), ScriptUrls::default());

        assert!(scripts.app_menu("").await.unwrap().is_empty());
        let (_, _, call) = runner.last_call();
        assert_eq!(call.argv.get("val"), Some(&json!(DEFAULT_ROLE)));
    }
}
