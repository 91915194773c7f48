//! portal-adapter-wechat - 微信网页授权
//!
//! 静默授权（`snsapi_base`）拿到的 code 通过 `sns/oauth2/access_token` 换取 openid。

use std::time::Duration;

use async_trait::async_trait;
use portal_config::WechatConfig;
use portal_errors::{AppError, AppResult};
use portal_ports::ExternalIdentityProvider;
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use tracing::{debug, warn};

const DEFAULT_ENDPOINT: &str = "https://api.weixin.qq.com/sns/oauth2/access_token";

/// `access_token` 接口响应
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccessTokenResponse {
    #[serde(default)]
    pub openid: Option<String>,
    #[serde(default)]
    pub errcode: Option<i64>,
    #[serde(default)]
    pub errmsg: Option<String>,
}

impl AccessTokenResponse {
    /// 取出 openid；`errcode` 非 0 或缺少 openid 时返回错误
    ///
    /// code 由用户提交且只能使用一次，失败归为校验错误。
    pub fn into_openid(self) -> AppResult<String> {
        if let Some(errcode) = self.errcode.filter(|c| *c != 0) {
            return Err(AppError::validation(format!(
                "微信授权失败: {} ({})",
                self.errmsg.unwrap_or_default(),
                errcode
            )));
        }

        self.openid
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .ok_or_else(|| AppError::validation("微信授权失败: 未返回 openid"))
    }
}

/// 微信 OAuth 客户端
pub struct WechatOAuthClient {
    http: reqwest::Client,
    endpoint: String,
    app_id: Option<String>,
    app_secret: Option<Secret<String>>,
}

impl WechatOAuthClient {
    pub fn new(config: &WechatConfig) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            app_id: config.app_id.clone().filter(|id| !id.trim().is_empty()),
            app_secret: config.app_secret.clone(),
        })
    }

    /// 替换接口地址
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait]
impl ExternalIdentityProvider for WechatOAuthClient {
    fn app_id(&self) -> Option<&str> {
        self.app_id.as_deref()
    }

    async fn exchange_code(&self, code: &str) -> AppResult<String> {
        let code = code.trim();
        if code.is_empty() {
            return Err(AppError::validation("缺少微信授权 code"));
        }

        let (Some(app_id), Some(secret)) = (self.app_id.as_deref(), self.app_secret.as_ref())
        else {
            return Err(AppError::configuration("WeChat app id or secret is not configured"));
        };

        let response = self
            .http
            .get(&self.endpoint)
            .query(&[
                ("appid", app_id),
                ("secret", secret.expose_secret().as_str()),
                ("code", code),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() || e.is_connect() {
                    AppError::external_unavailable(format!("WeChat API unreachable: {}", e))
                } else {
                    AppError::external_service(format!("WeChat API request failed: {}", e))
                }
            })?;

        if !response.status().is_success() {
            return Err(AppError::external_service(format!(
                "WeChat API returned HTTP {}",
                response.status()
            )));
        }

        let body: AccessTokenResponse = response.json().await.map_err(|e| {
            AppError::external_service(format!("WeChat API returned an unreadable body: {}", e))
        })?;

        match body.into_openid() {
            Ok(openid) => {
                debug!("Exchanged WeChat code for openid");
                Ok(openid)
            }
            Err(e) => {
                warn!(error = %e, "WeChat code exchange failed");
                Err(e)
            }
        }
    }
}
