//! HTTP 中间件
//! 应用状态与请求追踪

use axum::{
    extract::Request,
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

/// 应用状态
///
/// 服务使用 Arc 包装，Clone 只是指针拷贝。
/// 登录失败计数缓存由 AuthService 持有，这里保留一份引用便于观测。
#[derive(Clone)]
pub struct AppState {
    pub config: crate::config::AppConfig,
    pub auth_service: Arc<crate::services::AuthService>,
    pub user_service: Arc<crate::services::UserService>,
    pub jwt_service: Arc<crate::auth::jwt::JwtService>,
    pub login_attempts: Arc<crate::services::LoginAttemptService>,
}

impl AppState {
    /// 按配置组装所有服务，用户存储由调用方决定
    pub fn new(
        config: crate::config::AppConfig,
        store: Arc<dyn crate::repository::UserStore>,
    ) -> Result<Self, crate::error::AppError> {
        let jwt_service = Arc::new(crate::auth::jwt::JwtService::from_config(&config)?);
        let login_attempts = Arc::new(crate::services::LoginAttemptService::from_config(
            &config.login_attempts,
        ));
        let hasher = crate::auth::password::PasswordHasher::new();

        let auth_service = Arc::new(crate::services::AuthService::new(
            store.clone(),
            login_attempts.clone(),
            jwt_service.clone(),
            hasher.clone(),
        ));
        let user_service = Arc::new(crate::services::UserService::new(store, hasher));

        Ok(Self {
            config,
            auth_service,
            user_service,
            jwt_service,
            login_attempts,
        })
    }
}

/// 请求追踪中间件
/// 为每个请求生成 trace_id 和 request_id，并记录指标
pub async fn request_tracking_middleware(req: Request, next: Next) -> Response {
    let trace_id = extract_or_generate_trace_id(req.headers());
    let request_id = Uuid::new_v4().to_string();

    let method = req.method().to_string();
    let uri = req.uri().path().to_string();

    let span = tracing::info_span!(
        "http_request",
        trace_id = %trace_id,
        request_id = %request_id,
        method = %method,
        uri = %uri,
    );

    async move {
        let start = Instant::now();

        let mut response = next.run(req).await;

        let elapsed = start.elapsed();
        let status = response.status().as_u16();

        // 记录指标 - 使用静态字符串
        let method_name = match method.as_str() {
            "GET" => "GET",
            "POST" => "POST",
            "PUT" => "PUT",
            "DELETE" => "DELETE",
            "PATCH" => "PATCH",
            "OPTIONS" => "OPTIONS",
            _ => "UNKNOWN",
        };
        let status_class = match status {
            200..=299 => "2xx",
            300..=399 => "3xx",
            400..=499 => "4xx",
            _ => "5xx",
        };

        metrics::counter!("http_requests_total", "method" => method_name, "status" => status_class)
            .increment(1);
        metrics::histogram!("http_request_duration_seconds").record(elapsed.as_secs_f64());

        tracing::info!(
            method = %method,
            uri = %uri,
            status = status,
            elapsed_ms = elapsed.as_millis() as u64,
            "Request completed"
        );

        // 在响应头中添加 trace_id
        if let Ok(value) = trace_id.parse::<HeaderValue>() {
            response.headers_mut().insert("x-trace-id", value);
        }
        if let Ok(value) = request_id.parse::<HeaderValue>() {
            response.headers_mut().insert("x-request-id", value);
        }

        response
    }
    .instrument(span)
    .await
}

/// 从请求头中提取或生成 trace_id
fn extract_or_generate_trace_id(headers: &HeaderMap) -> String {
    headers
        .get("x-trace-id")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}
