//! 路由注册
//! 创建所有 API 路由并应用中间件

use axum::{
    http::{header, HeaderName, HeaderValue, Method},
    middleware,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};

use crate::{auth::jwt_auth_middleware, handlers, middleware::AppState};

const MAX_BODY_BYTES: usize = 64 * 1024;

/// 创建应用路由
pub fn create_router(state: Arc<AppState>) -> Router {
    // 公开端点
    let public_routes = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/user/login", post(handlers::user::login))
        .route("/user/register", post(handlers::user::register))
        .route(
            "/user/reset-password/{email}",
            get(handlers::user::reset_password),
        );

    // 需要认证的路由
    let authenticated_routes = Router::new()
        .route("/user/add", post(handlers::user::add_user))
        .route("/user/update", post(handlers::user::update_user))
        .route("/user/find/{username}", get(handlers::user::find_user))
        .route("/user/list", get(handlers::user::list_users))
        .route("/user/delete/{id}", delete(handlers::user::delete_user))
        .layer(middleware::from_fn_with_state(
            state.jwt_service.clone(),
            jwt_auth_middleware,
        ));

    Router::new()
        .merge(public_routes)
        .merge(authenticated_routes)
        .layer(cors_layer(&state))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(middleware::from_fn(
            crate::middleware::request_tracking_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// 跨域配置：暴露令牌头，前端才能读取
fn cors_layer(state: &AppState) -> CorsLayer {
    let origins: Vec<HeaderValue> = state
        .config
        .server
        .cors_allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    let token_header = HeaderName::try_from(state.jwt_service.header_name())
        .unwrap_or_else(|_| HeaderName::from_static("jwt-token"));

    CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::ORIGIN,
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::AUTHORIZATION,
            token_header.clone(),
        ])
        .expose_headers([header::CONTENT_TYPE, header::AUTHORIZATION, token_header])
}
