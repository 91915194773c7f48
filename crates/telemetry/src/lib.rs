//! telemetry - 可观测性库

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use thiserror::Error;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// 短信发送次数
pub const SMS_SENT_TOTAL: &str = "portal_sms_sent_total";
/// 登录次数
pub const LOGIN_TOTAL: &str = "portal_login_total";
/// AirScript 调用次数
pub const AIRSCRIPT_REQUESTS_TOTAL: &str = "portal_airscript_requests_total";

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("Failed to install Prometheus recorder: {0}")]
    Metrics(String),
}

/// 初始化 tracing
pub fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// 初始化 JSON 格式的 tracing（生产环境）
pub fn init_tracing_json(log_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().json())
        .init();
}

/// 初始化 Prometheus metrics
pub fn init_metrics() -> Result<PrometheusHandle, TelemetryError> {
    PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| TelemetryError::Metrics(e.to_string()))
}

/// 记录登录结果
pub fn record_login(method: &'static str, outcome: &'static str) {
    metrics::counter!(LOGIN_TOTAL, "method" => method, "outcome" => outcome).increment(1);
}

/// 记录短信发送结果
pub fn record_sms(outcome: &'static str) {
    metrics::counter!(SMS_SENT_TOTAL, "outcome" => outcome).increment(1);
}

/// 记录 AirScript 调用
pub fn record_airscript(script: &str, outcome: &'static str) {
    metrics::counter!(
        AIRSCRIPT_REQUESTS_TOTAL,
        "script" => script.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}
