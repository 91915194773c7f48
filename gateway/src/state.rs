//! 应用状态

use std::sync::Arc;
use std::time::Duration;

use portal_adapter_airscript::BusinessScripts;
use portal_auth_core::{SessionClaims, SessionSubject, TokenError, TokenService};
use portal_bootstrap::{Infrastructure, MetricsRecorder};
use portal_errors::{AppError, AppResult};
use portal_ports::{CodeStore, ExternalIdentityProvider, IdentityGateway, SmsSender};
use secrecy::{ExposeSecret, Secret};

use crate::openid_cache::OpenIdCache;

/// 会话 Cookie 设置
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub cookie_name: String,
    pub secure: bool,
    /// 与令牌有效期一致（秒）
    pub max_age_secs: i64,
}

/// 路由共享状态
#[derive(Clone)]
pub struct AppState {
    pub tokens: TokenService,
    pub secret: Option<Secret<String>>,
    pub session: SessionSettings,
    pub codes: Arc<dyn CodeStore>,
    pub identity: Arc<dyn IdentityGateway>,
    pub sms: Arc<dyn SmsSender>,
    pub wechat: Arc<dyn ExternalIdentityProvider>,
    pub scripts: BusinessScripts,
    pub openids: Arc<OpenIdCache>,
    pub metrics: Option<MetricsRecorder>,
}

impl AppState {
    pub fn from_infrastructure(infra: Infrastructure, metrics: Option<MetricsRecorder>) -> Self {
        let config = infra.config.clone();
        let openids = OpenIdCache::new(
            Duration::from_secs(config.wechat.openid_cache_ttl_secs),
            config.wechat.openid_cache_capacity,
        );

        Self {
            session: SessionSettings {
                cookie_name: config.session.cookie_name.clone(),
                secure: config.session.secure,
                max_age_secs: infra.token_service.ttl_secs(),
            },
            tokens: infra.token_service,
            secret: config.jwt.secret.clone(),
            codes: infra.code_store,
            identity: infra.identity,
            sms: infra.sms,
            wechat: infra.wechat,
            scripts: infra.scripts,
            openids: Arc::new(openids),
            metrics,
        }
    }

    /// 签名密钥，未配置时返回配置错误
    pub fn signing_secret(&self) -> AppResult<&[u8]> {
        self.secret
            .as_ref()
            .map(|s| s.expose_secret().as_bytes())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AppError::configuration("jwt.secret is not configured"))
    }

    /// 签发会话令牌
    pub fn issue_token(&self, subject: SessionSubject) -> AppResult<String> {
        let secret = self.signing_secret()?;
        self.tokens.issue(subject, secret).map_err(|e| match e {
            TokenError::Signer(e) => AppError::configuration(e.to_string()),
            TokenError::Serialize(e) => AppError::internal(e.to_string()),
        })
    }

    /// 校验会话令牌
    pub fn verify_token(&self, token: &str) -> AppResult<Option<SessionClaims>> {
        let secret = self.signing_secret()?;
        Ok(self.tokens.verify(token, secret))
    }
}
