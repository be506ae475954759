//! 日志初始化
//!
//! 默认只放大本服务与 HTTP 层的日志，sqlx 的逐条查询日志压到 warn。
//! RUST_LOG 存在时完全以它为准。

use crate::config::LoggingConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const SERVICE_NAME: &str = "store-auth";

fn default_directives(level: &str) -> String {
    format!("warn,store_auth={level},tower_http={level},sqlx=warn")
}

/// 初始化日志订阅器
pub fn init_telemetry(logging: &LoggingConfig) {
    let level = logging.level.to_lowercase();
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(&level)));

    let log_layer = match logging.format.to_lowercase().as_str() {
        // 生产环境：事件字段平铺，附带当前请求 span（request_id 等）
        "json" => tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .with_current_span(true)
            .with_span_list(false)
            .with_target(false)
            .boxed(),
        _ => tracing_subscriber::fmt::layer()
            .pretty()
            .with_target(true)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(log_layer)
        .init();

    tracing::info!(
        service = SERVICE_NAME,
        version = env!("CARGO_PKG_VERSION"),
        level = %level,
        format = %logging.format,
        "Logging initialized"
    );
}
