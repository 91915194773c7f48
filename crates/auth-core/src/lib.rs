//! auth-core - 认证核心库
//!
//! 会话令牌（HS256 签名、base64url JSON、7 天有效期）与短信验证码

pub mod base64url;
pub mod one_time_code;
pub mod signer;
pub mod token;

pub use one_time_code::*;
pub use token::*;

/// 员工
pub const ROLE_EMPLOYEE: &str = "员工";
/// 缺省身份
pub const DEFAULT_ROLE: &str = ROLE_EMPLOYEE;
