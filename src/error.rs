//! 统一错误模型
//! 定义所有错误类型和错误响应格式

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

/// 应用错误类型
#[derive(Debug, Error)]
pub enum AppError {
    #[error("No user found by username: {0}")]
    IdentityNotFound(String),

    #[error("No user found for email: {0}")]
    EmailNotFound(String),

    #[error("Username already exists by username: {0}")]
    UsernameExists(String),

    #[error("Email already exists by email: {0}")]
    EmailExists(String),

    #[error("Username / password incorrect")]
    AuthenticationFailed,

    #[error("Your account has been locked")]
    AccountLocked,

    #[error("Your account has been disabled")]
    AccountDisabled,

    #[error("Unknown role: {0}")]
    UnknownRole(String),

    #[error("Token cannot be verified")]
    TokenInvalid,

    #[error("Token has expired")]
    TokenExpired,

    #[error("You need to log in to access this page")]
    Unauthorized,

    #[error("You do not have enough permission")]
    Forbidden,

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// 获取 HTTP 状态码
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::IdentityNotFound(_)
            | AppError::EmailNotFound(_)
            | AppError::UsernameExists(_)
            | AppError::EmailExists(_)
            | AppError::AuthenticationFailed
            | AppError::UnknownRole(_)
            | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::AccountLocked
            | AppError::AccountDisabled
            | AppError::TokenExpired
            | AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::TokenInvalid | AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::Database(_) | AppError::Config(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// 获取用户友好的错误消息（不包含敏感信息）
    pub fn user_message(&self) -> String {
        match self {
            AppError::Database(_) => "Database error occurred".to_string(),
            AppError::Config(_) => "Configuration error".to_string(),
            AppError::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }

    /// 获取错误码
    pub fn code(&self) -> u16 {
        self.status_code().as_u16()
    }
}

/// 错误响应 DTO
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: u16,
    pub reason: String,
    pub message: String,
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let request_id = uuid::Uuid::new_v4().to_string();

        let error_response = ErrorResponse {
            error: ErrorDetail {
                code: self.code(),
                reason: status
                    .canonical_reason()
                    .unwrap_or_default()
                    .to_uppercase(),
                message: self.user_message(),
                request_id,
                timestamp: Utc::now(),
            },
        };

        // 服务端错误记 error，客户端错误记 info
        if status.is_server_error() {
            tracing::error!(
                code = self.code(),
                message = %self,
                request_id = %error_response.error.request_id,
                "Application error"
            );
        } else {
            tracing::info!(
                code = self.code(),
                message = %self,
                request_id = %error_response.error.request_id,
                "Request rejected"
            );
        }

        (status, Json(error_response)).into_response()
    }
}

/// 从 config::ConfigError 转换
impl From<config::ConfigError> for AppError {
    fn from(e: config::ConfigError) -> Self {
        AppError::Config(e.to_string())
    }
}

/// 请求参数校验失败
impl From<validator::ValidationErrors> for AppError {
    fn from(e: validator::ValidationErrors) -> Self {
        AppError::BadRequest(e.to_string())
    }
}
