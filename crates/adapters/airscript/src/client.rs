//! AirScript HTTP 客户端

use std::time::Duration;

use async_trait::async_trait;
use portal_config::AirScriptConfig;
use portal_errors::{AppError, AppResult};
use portal_ports::{ScriptCall, ScriptRunner};
use portal_telemetry::record_airscript;
use secrecy::{ExposeSecret, Secret};
use serde_json::Value;
use tracing::{debug, warn};

const TOKEN_HEADER: &str = "AirScript-Token";

/// AirScript 客户端
#[derive(Clone)]
pub struct AirScriptClient {
    http: reqwest::Client,
    token: Option<Secret<String>>,
}

impl AirScriptClient {
    pub fn new(config: &AirScriptConfig) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::internal(format!("Failed to build HTTP client: {}", e)))?;

        if config.token.is_none() {
            warn!("AirScript token is not configured");
        }

        Ok(Self {
            http,
            token: config.token.clone(),
        })
    }
}

/// 超时与连接失败可重试，其余为外部服务错误
pub(crate) fn classify_transport_error(target: &str, e: reqwest::Error) -> AppError {
    if e.is_timeout() || e.is_connect() {
        AppError::external_unavailable(format!("{} unreachable: {}", target, e))
    } else {
        AppError::external_service(format!("{} request failed: {}", target, e))
    }
}

#[async_trait]
impl ScriptRunner for AirScriptClient {
    async fn run(&self, script: &str, url: Option<&str>, call: ScriptCall) -> AppResult<Value> {
        let url = url
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .ok_or_else(|| {
                AppError::configuration(format!("AirScript URL for '{}' is not configured", script))
            })?;

        let token = self
            .token
            .as_ref()
            .map(|t| t.expose_secret().as_str())
            .unwrap_or_default();

        debug!(script, "Calling AirScript");

        let response = match self
            .http
            .post(url)
            .header(TOKEN_HEADER, token)
            .json(&call.to_body())
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                record_airscript(script, "unavailable");
                return Err(classify_transport_error("AirScript", e));
            }
        };

        let status = response.status();
        if !status.is_success() {
            record_airscript(script, "error");
            return Err(AppError::external_service(format!(
                "AirScript '{}' returned HTTP {}",
                script, status
            )));
        }

        let body = response.json::<Value>().await.map_err(|e| {
            record_airscript(script, "error");
            classify_transport_error("AirScript", e)
        })?;

        record_airscript(script, "ok");
        Ok(body)
    }
}
