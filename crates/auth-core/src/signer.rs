//! HMAC-SHA256 签名

use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// 签名错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignerError {
    #[error("signing secret is not configured")]
    MissingSecret,

    #[error("signing secret rejected by HMAC")]
    InvalidKey,
}

fn mac_for(secret: &[u8]) -> Result<HmacSha256, SignerError> {
    if secret.is_empty() {
        return Err(SignerError::MissingSecret);
    }
    HmacSha256::new_from_slice(secret).map_err(|_| SignerError::InvalidKey)
}

/// 计算签名
pub fn sign(message: &[u8], secret: &[u8]) -> Result<Vec<u8>, SignerError> {
    let mut mac = mac_for(secret)?;
    mac.update(message);
    Ok(mac.finalize().into_bytes().to_vec())
}

/// 校验签名（常量时间比较）
pub fn verify(signature: &[u8], message: &[u8], secret: &[u8]) -> Result<bool, SignerError> {
    let mut mac = mac_for(secret)?;
    mac.update(message);
    Ok(mac.verify_slice(signature).is_ok())
}
