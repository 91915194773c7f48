//! portal-adapter-sms - 短信网关适配器
//!
//! 短信由独立的 Worker 发送：`POST {api_url}`，请求体
//! `{"phoneNumber", "code", "templateCode"}`。

use std::time::Duration;

use async_trait::async_trait;
use portal_config::SmsConfig;
use portal_errors::{AppError, AppResult};
use portal_ports::SmsSender;
use portal_telemetry::record_sms;
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SendRequest<'a> {
    phone_number: &'a str,
    code: &'a str,
    template_code: &'a str,
}

/// Worker 是否确认发送成功
///
/// `success == true`、`code == 200` 或 `code == "OK"` 任一成立即视为成功。
pub fn is_accepted(body: &Value) -> bool {
    body.get("success").and_then(Value::as_bool) == Some(true)
        || body.get("code").and_then(Value::as_i64) == Some(200)
        || body.get("code").and_then(Value::as_str) == Some("OK")
}

/// HTTP 短信发送
pub struct HttpSmsSender {
    http: reqwest::Client,
    api_url: Option<String>,
    template_code: String,
}

impl HttpSmsSender {
    pub fn new(config: &SmsConfig) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            api_url: config.api_url.clone().filter(|u| !u.trim().is_empty()),
            template_code: config.template_code.clone().unwrap_or_default(),
        })
    }
}

#[async_trait]
impl SmsSender for HttpSmsSender {
    async fn send_code(&self, phone: &str, code: &str) -> AppResult<bool> {
        let url = self
            .api_url
            .as_deref()
            .ok_or_else(|| AppError::configuration("SMS API URL is not configured"))?;

        let request = SendRequest {
            phone_number: phone,
            code,
            template_code: &self.template_code,
        };

        let response = self.http.post(url).json(&request).send().await.map_err(|e| {
            record_sms("unavailable");
            if e.is_timeout() || e.is_connect() {
                AppError::external_unavailable(format!("SMS worker unreachable: {}", e))
            } else {
                AppError::external_service(format!("SMS worker request failed: {}", e))
            }
        })?;

        let status = response.status();
        let body: Value = response.json().await.map_err(|e| {
            record_sms("error");
            AppError::external_service(format!(
                "SMS worker returned an unreadable body (HTTP {}): {}",
                status, e
            ))
        })?;

        if is_accepted(&body) {
            record_sms("sent");
            info!(phone = %phone, "Verification SMS sent");
            Ok(true)
        } else {
            record_sms("rejected");
            warn!(phone = %phone, status = %status, response = %body, "SMS worker rejected the request");
            Ok(false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_acceptance_rules() {
        assert!(is_accepted(&json!({ "success": true })));
        assert!(is_accepted(&json!({ "code": 200 })));
        assert!(is_accepted(&json!({ "code": "OK", "message": "OK" })));

        assert!(!is_accepted(&json!({ "success": false })));
        assert!(!is_accepted(&json!({ "success": "true" })));
        assert!(!is_accepted(&json!({ "code": "isv.BUSINESS_LIMIT_CONTROL" })));
        assert!(!is_accepted(&json!({ "code": 500 })));
        assert!(!is_accepted(&json!({})));
    }

    #[test]
    fn test_request_body_shape() {
        let body = serde_json::to_value(SendRequest {
            phone_number: "13800000000",
            code: "482913",
            template_code: "SMS_123",
        })
        .unwrap();
        assert_eq!(
            body,
            json!({ "phoneNumber": "13800000000", "code": "482913", "templateCode": "SMS_123" })
        );
    }

    #[tokio::test]
    async fn test_missing_url_is_configuration_error() {
        let sender = HttpSmsSender::new(&SmsConfig::default()).unwrap();
        let err = sender.send_code("13800000000", "123456").await.unwrap_err();
        assert!(matches!(err, AppError::Configuration(_)));
    }
}
