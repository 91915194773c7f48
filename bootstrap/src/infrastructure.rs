//! 基础设施资源管理
//!
//! 根据配置装配验证码存储、身份网关、短信、微信授权与业务脚本。
//! 外部地址缺失不会阻止启动，只在用到的接口上返回配置错误。

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::Duration;
use portal_adapter_airscript::{AirScriptClient, AirScriptIdentityGateway, BusinessScripts};
use portal_adapter_memory::MemoryCodeStore;
use portal_adapter_redis::{RedisCodeStore, create_connection_manager};
use portal_adapter_sms::HttpSmsSender;
use portal_adapter_wechat::WechatOAuthClient;
use portal_auth_core::TokenService;
use portal_common::{SharedClock, SystemClock};
use portal_config::{AppConfig, CodeStoreBackend, CodeStoreConfig};
use portal_errors::{AppError, AppResult};
use portal_ports::{CodeStore, ExternalIdentityProvider, IdentityGateway, ScriptRunner, SmsSender};
use secrecy::ExposeSecret;
use tracing::{info, warn};

use crate::retry::{RetryConfig, with_retry};

/// 基础设施资源容器
#[derive(Clone)]
pub struct Infrastructure {
    pub config: Arc<AppConfig>,
    pub clock: SharedClock,
    pub token_service: TokenService,
    pub code_store: Arc<dyn CodeStore>,
    pub identity: Arc<dyn IdentityGateway>,
    pub sms: Arc<dyn SmsSender>,
    pub wechat: Arc<dyn ExternalIdentityProvider>,
    pub scripts: BusinessScripts,
}

impl Infrastructure {
    /// 从配置创建基础设施资源
    pub async fn from_config(config: AppConfig) -> AppResult<Self> {
        let clock: SharedClock = Arc::new(SystemClock);

        if config.jwt.secret.is_none() {
            warn!("jwt.secret is not configured, login and session checks will fail");
        }
        let token_service = TokenService::new(clock.clone());

        let code_store = build_code_store(&config.code_store, clock.clone()).await?;

        let runner: Arc<dyn ScriptRunner> = Arc::new(AirScriptClient::new(&config.airscript)?);
        let identity: Arc<dyn IdentityGateway> = Arc::new(AirScriptIdentityGateway::new(
            runner.clone(),
            config.airscript.scripts.users.clone(),
        ));
        let scripts = BusinessScripts::new(runner, config.airscript.scripts.clone());

        let sms: Arc<dyn SmsSender> = Arc::new(HttpSmsSender::new(&config.sms)?);
        let wechat: Arc<dyn ExternalIdentityProvider> =
            Arc::new(WechatOAuthClient::new(&config.wechat)?);

        info!(
            code_store = ?config.code_store.backend,
            wechat_enabled = wechat.app_id().is_some(),
            "Infrastructure initialized"
        );

        Ok(Self {
            config: Arc::new(config),
            clock,
            token_service,
            code_store,
            identity,
            sms,
            wechat,
            scripts,
        })
    }
}

/// 按配置选择验证码存储后端
pub async fn build_code_store(
    config: &CodeStoreConfig,
    clock: SharedClock,
) -> AppResult<Arc<dyn CodeStore>> {
    let ttl = Duration::seconds(config.ttl_secs);

    match config.backend {
        CodeStoreBackend::Memory => {
            let store = Arc::new(MemoryCodeStore::new(clock).with_ttl(ttl));
            if config.sweep_interval_secs > 0 {
                store.spawn_sweeper(StdDuration::from_secs(config.sweep_interval_secs));
            }
            info!("Using in-memory verification code store");
            Ok(store as Arc<dyn CodeStore>)
        }
        CodeStoreBackend::Redis => {
            let url = config
                .redis_url
                .as_ref()
                .map(|url| url.expose_secret().clone())
                .ok_or_else(|| {
                    AppError::configuration("code_store.redis_url is required for the redis backend")
                })?;

            let conn = with_retry(&RetryConfig::default(), "Redis connection", || {
                let url = url.clone();
                async move { create_connection_manager(&url).await }
            })
            .await?;
            info!("Using Redis verification code store");
            Ok(Arc::new(RedisCodeStore::with_clock(conn, clock).with_ttl(ttl)) as Arc<dyn CodeStore>)
        }
    }
}
