//! Metrics 模块
//!
//! 提供 Prometheus metrics 导出

use metrics_exporter_prometheus::PrometheusHandle;
use portal_errors::{AppError, AppResult};
use portal_telemetry::init_metrics;

/// Metrics 记录器
#[derive(Clone)]
pub struct MetricsRecorder {
    handle: PrometheusHandle,
}

impl MetricsRecorder {
    /// 安装全局 Prometheus recorder，进程内只能调用一次
    pub fn install() -> AppResult<Self> {
        let handle = init_metrics().map_err(|e| AppError::internal(e.to_string()))?;
        Ok(Self { handle })
    }

    /// 获取 Prometheus 格式的 metrics
    pub fn render(&self) -> String {
        self.handle.render()
    }
}
