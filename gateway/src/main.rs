//! 员工门户网关
//!
//! 短信 / 微信登录、会话 Cookie，以及到 WPS AirScript 的业务代理。

mod auth;
mod body;
mod business;
mod middleware;
mod openid_cache;
mod routing;
mod state;
mod user;

#[cfg(test)]
mod testing;

use std::net::SocketAddr;

use portal_bootstrap::{Infrastructure, MetricsRecorder, RuntimeConfig, init_runtime, shutdown_signal};
use portal_config::AppConfig;
use tracing::{info, warn};

use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let runtime = RuntimeConfig::default();
    let config = AppConfig::load(&runtime.config_dir)?;
    init_runtime(&config);

    let metrics = match MetricsRecorder::install() {
        Ok(recorder) => Some(recorder),
        Err(e) => {
            warn!(error = %e, "Prometheus recorder not installed, /metrics disabled");
            None
        }
    };

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let static_dir = config.static_dir.clone();

    let infra = Infrastructure::from_config(config).await?;
    let app = routing::app(AppState::from_infrastructure(infra, metrics), &static_dir);

    info!(%addr, static_dir = %static_dir, "Starting staff portal gateway");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Gateway stopped");
    Ok(())
}
