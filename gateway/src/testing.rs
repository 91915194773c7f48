//! 路由测试夹具：各端口的手写假实现与请求工具

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, Bytes},
    http::{HeaderMap, Request, StatusCode, header},
};
use parking_lot::Mutex;
use portal_adapter_airscript::BusinessScripts;
use portal_adapter_memory::MemoryCodeStore;
use portal_auth_core::{SessionSubject, TokenService};
use portal_common::{ManualClock, SharedClock};
use portal_config::ScriptUrls;
use portal_errors::{AppError, AppResult};
use portal_ports::{
    ExternalIdentityProvider, IdentityGateway, IdentityRecord, ScriptCall, ScriptRunner,
    SmsSender,
};
use secrecy::Secret;
use serde_json::Value;
use tokio::sync::Notify;
use tower::ServiceExt;

use crate::openid_cache::OpenIdCache;
use crate::state::{AppState, SessionSettings};

pub const TEST_SECRET: &str = "test-secret";
pub const TEST_NOW: i64 = 1_700_000_000;

pub struct FakeIdentity {
    records: Vec<IdentityRecord>,
    bind_accepting: bool,
    pub bindings: Mutex<Vec<(String, String)>>,
}

impl FakeIdentity {
    /// 名单：13800000000 张三（股东，已绑定 oBound），13600000000 无姓名
    fn roster(bind_accepting: bool) -> Self {
        Self {
            records: vec![
                IdentityRecord {
                    phone: "13800000000".to_string(),
                    name: Some("张三".to_string()),
                    role: "股东".to_string(),
                    external_id: Some("oBound".to_string()),
                },
                IdentityRecord {
                    phone: "13600000000".to_string(),
                    name: None,
                    role: "员工".to_string(),
                    external_id: None,
                },
            ],
            bind_accepting,
            bindings: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl IdentityGateway for FakeIdentity {
    async fn get_identity(&self, phone: &str) -> AppResult<Option<IdentityRecord>> {
        Ok(self.records.iter().find(|r| r.phone == phone).cloned())
    }

    async fn resolve_identity_by_external_id(&self, external_id: &str) -> AppResult<Option<String>> {
        let bound = self
            .bindings
            .lock()
            .iter()
            .find(|(openid, _)| openid == external_id)
            .map(|(_, phone)| phone.clone());
        Ok(bound.or_else(|| {
            self.records
                .iter()
                .find(|r| r.external_id.as_deref() == Some(external_id))
                .map(|r| r.phone.clone())
        }))
    }

    async fn bind_external_id_to_phone(&self, external_id: &str, phone: &str) -> AppResult<bool> {
        if !self.bind_accepting {
            return Ok(false);
        }
        self.bindings
            .lock()
            .push((external_id.to_string(), phone.to_string()));
        Ok(true)
    }
}

/// 记录所有发出的验证码
pub struct FakeSms {
    accepting: bool,
    pub sent: Mutex<Vec<(String, String)>>,
    held: Mutex<VecDeque<(Arc<Notify>, bool)>>,
}

impl FakeSms {
    /// 下一次投递挂起，放行后返回 `outcome`
    pub fn hold_next(&self, outcome: bool) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.held.lock().push_back((gate.clone(), outcome));
        gate
    }
}

#[async_trait]
impl SmsSender for FakeSms {
    async fn send_code(&self, phone: &str, code: &str) -> AppResult<bool> {
        self.sent.lock().push((phone.to_string(), code.to_string()));
        let held = self.held.lock().pop_front();
        if let Some((gate, outcome)) = held {
            gate.notified().await;
            return Ok(outcome);
        }
        Ok(self.accepting)
    }
}

pub struct FakeWechat {
    app_id: Option<String>,
    openids: HashMap<&'static str, &'static str>,
}

#[async_trait]
impl ExternalIdentityProvider for FakeWechat {
    fn app_id(&self) -> Option<&str> {
        self.app_id.as_deref()
    }

    async fn exchange_code(&self, code: &str) -> AppResult<String> {
        self.openids
            .get(code)
            .map(|openid| openid.to_string())
            .ok_or_else(|| AppError::validation("微信授权失败: invalid code"))
    }
}

/// 按顺序返回预设响应的脚本执行器
#[derive(Default)]
pub struct StubRunner {
    responses: Mutex<VecDeque<AppResult<Value>>>,
    pub calls: Mutex<Vec<(String, ScriptCall)>>,
}

impl StubRunner {
    pub fn push(&self, response: Value) {
        self.responses.lock().push_back(Ok(response));
    }

    pub fn push_error(&self, error: AppError) {
        self.responses.lock().push_back(Err(error));
    }

    pub fn last_call(&self) -> Option<(String, ScriptCall)> {
        self.calls.lock().last().cloned()
    }
}

#[async_trait]
impl ScriptRunner for StubRunner {
    async fn run(&self, script: &str, _url: Option<&str>, call: ScriptCall) -> AppResult<Value> {
        self.calls.lock().push((script.to_string(), call));
        self.responses.lock().pop_front().unwrap_or(Ok(Value::Null))
    }
}

pub struct HarnessBuilder {
    sms_accepting: bool,
    bind_accepting: bool,
    secret: bool,
    wechat_app_id: bool,
}

impl HarnessBuilder {
    pub fn sms_accepting(mut self, accepting: bool) -> Self {
        self.sms_accepting = accepting;
        self
    }

    pub fn bind_accepting(mut self, accepting: bool) -> Self {
        self.bind_accepting = accepting;
        self
    }

    pub fn without_secret(mut self) -> Self {
        self.secret = false;
        self
    }

    pub fn without_wechat_app_id(mut self) -> Self {
        self.wechat_app_id = false;
        self
    }

    pub fn build(self) -> Harness {
        let clock = Arc::new(ManualClock::at_unix(TEST_NOW));
        let shared: SharedClock = clock.clone();

        let identity = Arc::new(FakeIdentity::roster(self.bind_accepting));
        let sms = Arc::new(FakeSms {
            accepting: self.sms_accepting,
            sent: Mutex::new(Vec::new()),
            held: Mutex::new(VecDeque::new()),
        });
        let runner = Arc::new(StubRunner::default());
        let wechat = FakeWechat {
            app_id: self.wechat_app_id.then(|| "wx-test".to_string()),
            openids: HashMap::from([("CODE-BOUND", "oBound"), ("CODE-NEW", "oNew")]),
        };

        let tokens = TokenService::new(shared.clone());
        let state = AppState {
            session: SessionSettings {
                cookie_name: "auth_token".to_string(),
                secure: false,
                max_age_secs: tokens.ttl_secs(),
            },
            tokens,
            secret: self.secret.then(|| Secret::new(TEST_SECRET.to_string())),
            codes: Arc::new(MemoryCodeStore::new(shared)),
            identity: identity.clone(),
            sms: sms.clone(),
            wechat: Arc::new(wechat),
            scripts: BusinessScripts::new(runner.clone(), ScriptUrls::default()),
            openids: Arc::new(OpenIdCache::new(Duration::from_secs(600), 1_000)),
            metrics: None,
        };

        Harness {
            state,
            clock,
            identity,
            sms,
            runner,
        }
    }
}

pub struct Harness {
    pub state: AppState,
    pub clock: Arc<ManualClock>,
    pub identity: Arc<FakeIdentity>,
    pub sms: Arc<FakeSms>,
    pub runner: Arc<StubRunner>,
}

impl Harness {
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> HarnessBuilder {
        HarnessBuilder {
            sms_accepting: true,
            bind_accepting: true,
            secret: true,
            wechat_app_id: true,
        }
    }

    pub fn router(&self) -> Router {
        crate::routing::app(self.state.clone(), "tests/static")
    }

    /// 最近一次发给该手机号的验证码
    pub fn sent_code(&self, phone: &str) -> Option<String> {
        self.sms
            .sent
            .lock()
            .iter()
            .rev()
            .find(|(p, _)| p == phone)
            .map(|(_, code)| code.clone())
    }

    pub fn session_cookie(&self, subject: SessionSubject) -> String {
        let token = self.state.issue_token(subject).unwrap();
        format!("auth_token={}", token)
    }
}

pub fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

pub fn post_json(uri: &str, body: Value, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub async fn send(router: Router, request: Request<Body>) -> (StatusCode, HeaderMap, Bytes) {
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, headers, body)
}

pub fn body_json(body: &Bytes) -> Value {
    serde_json::from_slice(body).unwrap()
}
