//! errors - 统一错误处理
//!
//! 外部协作方的失败在边界处转换为 `AppError`，HTTP 层只看到这里定义的类型。

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 未登录时对客户端统一返回的消息（不透露失败原因）
pub const UNAUTHENTICATED_MESSAGE: &str = "未登录";

/// 应用错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 缺少密钥 / URL 等配置，仅对当前操作致命
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// 无令牌、令牌无效或已过期
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// 验证码错误或过期，用户可自行纠正
    #[error("Verification failed: {0}")]
    Verification(String),

    /// 外部服务返回了错误
    #[error("External service error: {0}")]
    ExternalService(String),

    /// 外部服务不可达或超时，可重试
    #[error("External service unavailable: {0}")]
    ExternalUnavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn unauthenticated(msg: impl Into<String>) -> Self {
        Self::Unauthenticated(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn verification(msg: impl Into<String>) -> Self {
        Self::Verification(msg.into())
    }

    pub fn external_service(msg: impl Into<String>) -> Self {
        Self::ExternalService(msg.into())
    }

    pub fn external_unavailable(msg: impl Into<String>) -> Self {
        Self::ExternalUnavailable(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// 调用方是否可以重试
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ExternalUnavailable(_))
    }

    /// 转换为 HTTP 状态码
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Configuration(_) => 500,
            Self::Validation(_) => 400,
            Self::Unauthenticated(_) => 401,
            Self::Forbidden(_) => 403,
            Self::NotFound(_) => 404,
            Self::Verification(_) => 400,
            Self::ExternalService(_) => 502,
            Self::ExternalUnavailable(_) => 503,
            Self::Internal(_) => 500,
        }
    }

    /// 返回给客户端的消息
    ///
    /// 服务端类错误只返回通用文案，细节写日志。
    pub fn public_message(&self) -> String {
        match self {
            Self::Validation(msg)
            | Self::Forbidden(msg)
            | Self::NotFound(msg)
            | Self::Verification(msg) => msg.clone(),
            Self::Unauthenticated(_) => UNAUTHENTICATED_MESSAGE.to_string(),
            Self::ExternalService(_) => "外部服务异常，请稍后再试".to_string(),
            Self::ExternalUnavailable(_) => "外部服务暂时不可用，请稍后再试".to_string(),
            Self::Configuration(_) | Self::Internal(_) => "系统错误".to_string(),
        }
    }

    /// 转换为响应体
    pub fn to_error_body(&self) -> ErrorBody {
        ErrorBody {
            success: false,
            error: self.public_message(),
        }
    }
}

/// 错误响应体
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub success: bool,
    pub error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::debug!(error = %self, "Request rejected");
        }

        (status, Json(self.to_error_body())).into_response()
    }
}

/// Result 类型别名
pub type AppResult<T> = Result<T, AppError>;
