//! 用户管理的 HTTP 处理器

use crate::{
    auth::middleware::AuthContext,
    error::AppError,
    middleware::AppState,
    models::{
        auth::LoginRequest,
        role::{USER_CREATE, USER_DELETE, USER_READ, USER_UPDATE},
        user::*,
    },
    services::UserProfile,
};
use axum::{
    extract::{Path, State},
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

const EMAIL_SENT: &str = "Password reset successful. New password sent to email: ";
const USER_DELETED_SUCCESSFULLY: &str = "User deleted successfully";

/// 通用消息响应
#[derive(Serialize)]
pub struct MessageResponse {
    pub code: u16,
    pub reason: String,
    pub message: String,
}

fn message(status: StatusCode, message: String) -> impl IntoResponse {
    (
        status,
        Json(MessageResponse {
            code: status.as_u16(),
            reason: status.canonical_reason().unwrap_or_default().to_uppercase(),
            message,
        }),
    )
}

/// 登录：令牌放在响应头中返回
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    let response = state.auth_service.login(req).await?;

    let name = HeaderName::try_from(response.token.header_name.as_str())
        .map_err(|e| AppError::Internal(format!("Invalid token header name: {}", e)))?;
    let value = HeaderValue::try_from(response.token.token.as_str())
        .map_err(|e| AppError::Internal(format!("Invalid token header value: {}", e)))?;

    let mut headers = HeaderMap::new();
    headers.insert(name, value);

    Ok((headers, Json(response.user)))
}

/// 自助注册
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    let created = state
        .user_service
        .register(&req.first_name, &req.last_name, &req.username, &req.email)
        .await?;

    // 生成的密码已交给 PasswordNotifier，响应中不返回
    Ok(Json(UserResponse::from(created.identity)))
}

/// 管理端创建用户
pub async fn add_user(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    Json(req): Json<AddUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_context.require_authority(USER_CREATE)?;
    req.validate()?;

    let created = state
        .user_service
        .add_new_user(UserProfile {
            first_name: req.first_name,
            last_name: req.last_name,
            username: req.username,
            email: req.email,
            role: req.role,
            is_not_locked: req.is_non_locked,
            is_active: req.is_active,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(created.identity))))
}

/// 更新用户
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    Json(req): Json<UpdateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_context.require_authority(USER_UPDATE)?;
    req.validate()?;

    let updated = state
        .user_service
        .update_user(
            &req.current_username,
            UserProfile {
                first_name: req.first_name,
                last_name: req.last_name,
                username: req.username,
                email: req.email,
                role: req.role,
                is_not_locked: req.is_non_locked,
                is_active: req.is_active,
            },
        )
        .await?;

    Ok(Json(UserResponse::from(updated)))
}

/// 按用户名查找
pub async fn find_user(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    Path(username): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    auth_context.require_authority(USER_READ)?;

    let user = state
        .user_service
        .find_user_by_username(&username)
        .await?
        .ok_or(AppError::IdentityNotFound(username))?;

    Ok(Json(UserResponse::from(user)))
}

/// 列出用户
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
) -> Result<impl IntoResponse, AppError> {
    auth_context.require_authority(USER_READ)?;

    let users: Vec<UserResponse> = state
        .user_service
        .get_all_users()
        .await?
        .into_iter()
        .map(UserResponse::from)
        .collect();

    Ok(Json(users))
}

/// 重置密码
pub async fn reset_password(
    State(state): State<Arc<AppState>>,
    Path(email): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    state.user_service.reset_password(&email).await?;

    Ok(message(StatusCode::OK, format!("{EMAIL_SENT}{email}")))
}

/// 删除用户（需要 user:delete 权限）
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    auth_context.require_authority(USER_DELETE)?;

    state.user_service.delete_user(id).await?;

    Ok(message(StatusCode::OK, USER_DELETED_SUCCESSFULLY.to_string()))
}
