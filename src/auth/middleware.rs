//! JWT 认证中间件

use crate::{auth::jwt::JwtService, error::AppError};
use axum::{
    extract::{FromRequestParts, Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// 认证上下文（附加到请求扩展）
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub username: String,
    pub authorities: Vec<String>,
}

impl AuthContext {
    pub fn has_authority(&self, authority: &str) -> bool {
        self.authorities.iter().any(|a| a == authority)
    }

    /// 缺少权限时返回 Forbidden
    pub fn require_authority(&self, authority: &str) -> Result<(), AppError> {
        if self.has_authority(authority) {
            Ok(())
        } else {
            tracing::info!(username = %self.username, authority, "Missing authority");
            Err(AppError::Forbidden)
        }
    }
}

// 实现 FromRequestParts 以便在 handler 中直接提取 AuthContext
impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .ok_or(AppError::Unauthorized)
    }
}

/// 提取令牌：优先使用令牌专用头，其次 Authorization: Bearer
pub fn extract_token(headers: &HeaderMap, token_header: &str) -> Result<String, AppError> {
    if let Some(token) = headers
        .get(token_header)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        return Ok(token.to_string());
    }

    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .ok_or(AppError::Unauthorized)
}

/// JWT 认证中间件 - 必须认证
pub async fn jwt_auth_middleware(
    State(jwt_service): State<Arc<JwtService>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_token(req.headers(), jwt_service.header_name())?;

    // 验证令牌（不访问用户存储）
    let principal = jwt_service.validate(&token)?;

    let auth_context = AuthContext {
        username: principal.subject,
        authorities: principal.authorities,
    };

    req.extensions_mut().insert(auth_context);

    Ok(next.run(req).await)
}
