//! 验证码存储 trait 定义

use async_trait::async_trait;
use portal_errors::AppResult;

/// 验证码存储
///
/// 同一手机号的 issue / verify 必须线性化。
#[async_trait]
pub trait CodeStore: Send + Sync {
    /// 生成并保存验证码，覆盖该手机号已有的验证码
    async fn issue(&self, phone: &str) -> AppResult<String>;

    /// 校验验证码
    ///
    /// 不存在返回 `false`；已过期删除后返回 `false`；不匹配返回 `false` 且保留；
    /// 匹配删除后返回 `true`。
    async fn verify(&self, phone: &str, code: &str) -> AppResult<bool>;

    /// 撤回验证码（短信发送失败时）
    ///
    /// 仅当当前保存的仍是 `code` 时删除，返回是否删除；
    /// 之后新发的验证码不受影响。
    async fn delete(&self, phone: &str, code: &str) -> AppResult<bool>;
}
