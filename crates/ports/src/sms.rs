//! 短信发送 trait 定义

use async_trait::async_trait;
use portal_errors::AppResult;

/// 短信发送
#[async_trait]
pub trait SmsSender: Send + Sync {
    /// 发送验证码；网关明确拒绝时返回 `Ok(false)`
    async fn send_code(&self, phone: &str, code: &str) -> AppResult<bool>;
}
