//! 会话令牌
//!
//! 格式：`base64url(header).base64url(payload).base64url(HMAC_SHA256(前两段, secret))`，
//! header 固定为 `{"alg":"HS256","typ":"JWT"}`，payload 为声明加 `iat`/`exp`（Unix 秒）。
//! 令牌不在服务端保存，也没有吊销与刷新。

use portal_common::{SharedClock, SystemClock};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use crate::signer::{self, SignerError};
use crate::{DEFAULT_ROLE, base64url};

/// 令牌有效期：7 天
pub const TOKEN_TTL_SECS: i64 = 7 * 86400;

const ALGORITHM: &str = "HS256";
const TOKEN_TYPE: &str = "JWT";

#[derive(Debug, Serialize, Deserialize)]
struct TokenHeader {
    alg: String,
    typ: String,
}

/// 令牌声明
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// 手机号（主体标识）
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default = "default_role")]
    pub role: String,
    /// 微信 openid
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openid: Option<String>,
    /// 其余自定义声明
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    pub iat: i64,
    pub exp: i64,
}

fn default_role() -> String {
    DEFAULT_ROLE.to_string()
}

/// 签发令牌的主体信息
#[derive(Debug, Clone, Default)]
pub struct SessionSubject {
    pub phone: String,
    pub name: Option<String>,
    pub role: Option<String>,
    pub openid: Option<String>,
    pub extra: Map<String, Value>,
}

impl SessionSubject {
    pub fn new(phone: impl Into<String>) -> Self {
        Self {
            phone: phone.into(),
            ..Default::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    pub fn with_openid(mut self, openid: impl Into<String>) -> Self {
        self.openid = Some(openid.into());
        self
    }

    pub fn with_claim(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}

/// 签发错误
#[derive(Debug, Error)]
pub enum TokenError {
    #[error(transparent)]
    Signer(#[from] SignerError),

    #[error("failed to serialize token: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Token 服务
#[derive(Clone)]
pub struct TokenService {
    clock: SharedClock,
}

impl Default for TokenService {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl TokenService {
    pub fn new(clock: SharedClock) -> Self {
        Self { clock }
    }

    /// 有效期（秒），固定为 7 天，与 Cookie 的 max-age 一致
    pub fn ttl_secs(&self) -> i64 {
        TOKEN_TTL_SECS
    }

    /// 签发令牌
    pub fn issue(&self, subject: SessionSubject, secret: &[u8]) -> Result<String, TokenError> {
        let iat = self.clock.unix_seconds();
        let claims = SessionClaims {
            phone: subject.phone,
            name: subject.name,
            role: subject.role.unwrap_or_else(default_role),
            openid: subject.openid,
            extra: subject.extra,
            iat,
            exp: iat + TOKEN_TTL_SECS,
        };

        encode_signed(&claims, secret)
    }

    /// 校验令牌
    ///
    /// 段数不为 3、签名不符、结构无法解析、已过期时一律返回 `None`，不区分原因。
    pub fn verify(&self, token: &str, secret: &[u8]) -> Option<SessionClaims> {
        let mut parts = token.split('.');
        let (Some(header), Some(payload), Some(signature), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            debug!("Token rejected: wrong segment count");
            return None;
        };

        let signature = base64url::decode(signature).ok()?;
        let signing_input = format!("{}.{}", header, payload);
        match signer::verify(&signature, signing_input.as_bytes(), secret) {
            Ok(true) => {}
            Ok(false) => {
                debug!("Token rejected: signature mismatch");
                return None;
            }
            Err(e) => {
                debug!(error = %e, "Token rejected: signer unavailable");
                return None;
            }
        }

        let header: TokenHeader = serde_json::from_str(&base64url::decode_to_string(header).ok()?).ok()?;
        if header.alg != ALGORITHM {
            debug!(alg = %header.alg, "Token rejected: unexpected algorithm");
            return None;
        }

        let claims: SessionClaims =
            match base64url::decode_to_string(payload).map(|json| serde_json::from_str(&json)) {
                Ok(Ok(claims)) => claims,
                _ => {
                    debug!("Token rejected: malformed payload");
                    return None;
                }
            };

        if claims.phone.trim().is_empty() {
            return None;
        }

        if claims.exp < self.clock.unix_seconds() {
            debug!(phone = %claims.phone, "Token rejected: expired");
            return None;
        }

        Some(claims)
    }
}

fn encode_signed(claims: &SessionClaims, secret: &[u8]) -> Result<String, TokenError> {
    let header = TokenHeader {
        alg: ALGORITHM.to_string(),
        typ: TOKEN_TYPE.to_string(),
    };

    let signing_input = format!(
        "{}.{}",
        base64url::encode(serde_json::to_vec(&header)?),
        base64url::encode(serde_json::to_vec(claims)?)
    );
    let signature = signer::sign(signing_input.as_bytes(), secret)?;

    Ok(format!("{}.{}", signing_input, base64url::encode(signature)))
}
