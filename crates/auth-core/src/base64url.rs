//! URL 安全的 base64 编解码（无填充）
//!
//! 解码同时接受带 `=` 填充和不带填充的输入。

use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use thiserror::Error;

const ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// 解码错误
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("invalid base64url input: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("decoded bytes are not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// 编码为 base64url（`+`→`-`，`/`→`_`，去掉尾部 `=`）
pub fn encode(bytes: impl AsRef<[u8]>) -> String {
    ENGINE.encode(bytes)
}

/// 解码 base64url
pub fn decode(input: &str) -> Result<Vec<u8>, DecodeError> {
    Ok(ENGINE.decode(input)?)
}

/// 解码并按 UTF-8 解释
pub fn decode_to_string(input: &str) -> Result<String, DecodeError> {
    Ok(String::from_utf8(decode(input)?)?)
}
