//! Redis 连接管理

use portal_errors::{AppError, AppResult};
use redis::Client;
use redis::aio::ConnectionManager;

/// 创建 Redis 连接管理器
pub async fn create_connection_manager(url: &str) -> AppResult<ConnectionManager> {
    let client = Client::open(url)
        .map_err(|e| AppError::configuration(format!("Invalid Redis URL: {}", e)))?;

    ConnectionManager::new(client).await.map_err(|e| {
        AppError::external_unavailable(format!("Failed to create Redis connection manager: {}", e))
    })
}
