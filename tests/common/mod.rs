//! 测试公共模块
//! 提供测试配置、内存存储上的应用状态和登录辅助函数

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{Request, Response},
};
use http_body_util::BodyExt;
use secrecy::{ExposeSecret, Secret};
use std::sync::Arc;
use store_auth::{
    config::{
        AppConfig, DatabaseConfig, LoggingConfig, LoginAttemptConfig, SecurityConfig,
        ServerConfig,
    },
    middleware::AppState,
    repository::InMemoryUserStore,
    services::UserProfile,
};

pub const TEST_SECRET: &str = "test-secret-key-for-testing-only-min-32-chars";

/// 创建测试配置（不连接数据库）
pub fn create_test_config() -> AppConfig {
    AppConfig {
        server: ServerConfig {
            addr: "127.0.0.1:0".to_string(), // 使用随机端口
            graceful_shutdown_timeout_secs: 5,
            cors_allowed_origins: vec!["http://localhost:4200".to_string()],
        },
        database: DatabaseConfig {
            url: None,
            max_connections: 5,
            min_connections: 1,
            acquire_timeout_secs: 5,
            idle_timeout_secs: 300,
            max_lifetime_secs: 1800,
        },
        logging: LoggingConfig {
            level: "debug".to_string(),
            format: "pretty".to_string(),
        },
        security: SecurityConfig {
            jwt_secret: Secret::new(TEST_SECRET.to_string()),
            token_expiration_secs: 300, // 5分钟用于测试
            token_issuer: "ethan-store".to_string(),
            token_header: "Jwt-Token".to_string(),
        },
        login_attempts: LoginAttemptConfig::default(),
    }
}

/// 创建基于内存存储的测试应用状态
pub fn create_test_app_state() -> Arc<AppState> {
    let store = Arc::new(InMemoryUserStore::new());
    Arc::new(AppState::new(create_test_config(), store).expect("Failed to build app state"))
}

/// 以管理端方式创建用户，返回其生成的密码
pub async fn create_test_user(state: &AppState, username: &str, role: &str) -> String {
    let created = state
        .user_service
        .add_new_user(UserProfile {
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            username: username.to_string(),
            email: format!("{username}@example.com"),
            role: role.to_string(),
            is_not_locked: true,
            is_active: true,
        })
        .await
        .expect("Failed to create test user");

    created.password.expose_secret().clone()
}

/// 构造 JSON 请求
pub fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// 读取响应体为 JSON
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
