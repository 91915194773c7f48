//! 身份网关 trait 定义

use async_trait::async_trait;
use portal_errors::AppResult;
use serde::{Deserialize, Serialize};

/// 人员记录（只读，由外部系统维护）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityRecord {
    pub phone: String,
    pub name: Option<String>,
    pub role: String,
    /// 已绑定的微信 openid
    pub external_id: Option<String>,
}

/// 身份网关
///
/// 未找到返回 `None` / `false`，后端不可用返回错误。
#[async_trait]
pub trait IdentityGateway: Send + Sync {
    async fn identity_exists(&self, phone: &str) -> AppResult<bool> {
        Ok(self.get_identity(phone).await?.is_some())
    }

    async fn get_identity(&self, phone: &str) -> AppResult<Option<IdentityRecord>>;

    /// 按外部身份（openid）查找手机号
    async fn resolve_identity_by_external_id(&self, external_id: &str)
    -> AppResult<Option<String>>;

    /// 绑定外部身份到手机号
    async fn bind_external_id_to_phone(&self, external_id: &str, phone: &str) -> AppResult<bool>;
}

/// 外部身份提供方（微信网页授权）
#[async_trait]
pub trait ExternalIdentityProvider: Send + Sync {
    /// 应用标识，前端发起授权时使用
    fn app_id(&self) -> Option<&str>;

    /// 用授权码换取外部身份 id
    async fn exchange_code(&self, code: &str) -> AppResult<String>;
}
