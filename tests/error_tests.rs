//! 错误响应测试
//!
//! 检查错误类型转换为 HTTP 响应后的状态码与响应体

use axum::{http::StatusCode, response::IntoResponse};
use http_body_util::BodyExt;
use store_auth::error::AppError;

async fn render(err: AppError) -> (StatusCode, serde_json::Value) {
    let response = err.into_response();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_conflict_renders_bad_request() {
    let (status, json) = render(AppError::EmailExists("jdoe@x.com".to_string())).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], 400);
    assert_eq!(json["error"]["reason"], "BAD REQUEST");
    assert_eq!(
        json["error"]["message"],
        "Email already exists by email: jdoe@x.com"
    );
    assert!(json["error"]["request_id"].is_string());
    assert!(json["error"]["timestamp"].is_string());
}

#[tokio::test]
async fn test_locked_account_renders_unauthorized() {
    let (status, json) = render(AppError::AccountLocked).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["error"]["message"], "Your account has been locked");
}

#[tokio::test]
async fn test_invalid_token_renders_forbidden() {
    let (status, _) = render(AppError::TokenInvalid).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = render(AppError::TokenExpired).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_internal_details_hidden() {
    let (status, json) = render(AppError::Internal("pool exhausted at 10.0.0.3".to_string())).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"]["message"], "Internal server error");
}

#[tokio::test]
async fn test_database_error_hidden() {
    let (status, json) = render(AppError::Database(sqlx::Error::RowNotFound)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"]["message"], "Database error occurred");
}
