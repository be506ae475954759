//! 用户认证服务主入口

use std::sync::Arc;
use store_auth::{
    config::AppConfig,
    db,
    handlers::health,
    middleware::AppState,
    repository::{InMemoryUserStore, PgUserStore, UserStore},
    routes, telemetry,
};
use tokio::net::TcpListener;
use tokio::signal;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ===== CLI 参数处理 =====
    let args: Vec<String> = std::env::args().collect();

    if args.len() > 1 {
        match args[1].as_str() {
            "--version" => {
                println!("store-auth {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--help" => {
                print_help();
                return Ok(());
            }
            _ => {
                eprintln!("未知参数: {}", args[1]);
                print_help();
                std::process::exit(1);
            }
        }
    }

    // 加载 .env 文件（开发环境）
    // 生产环境应该直接设置环境变量，不依赖 .env 文件
    if let Ok(name) = std::env::var("STORE_ENV") {
        dotenv::from_filename(format!(".env.{}", name)).ok();
    } else {
        dotenv::from_filename(".env.local").ok();
        dotenv::dotenv().ok();
    }

    health::set_start_time();

    // 1. 加载配置
    let config = AppConfig::from_env().map_err(|e| {
        eprintln!("Configuration error: {}", e);
        anyhow::anyhow!("Failed to load configuration: {}", e)
    })?;

    // 2. 初始化日志
    telemetry::init_telemetry(&config.logging);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Store auth service starting...");

    // 3. 用户存储：配置了数据库则使用 PostgreSQL
    let store: Arc<dyn UserStore> = if config.database.url.is_some() {
        let db_pool = db::create_pool(&config.database).await?;
        db::run_migrations(&db_pool).await?;
        tracing::info!("Database initialized");
        Arc::new(PgUserStore::new(db_pool))
    } else {
        tracing::warn!("database.url not set, users are kept in memory only");
        Arc::new(InMemoryUserStore::new())
    };

    // 4. 构建应用状态
    let app_state = Arc::new(AppState::new(config.clone(), store)?);

    // 5. 构建路由
    let app = routes::create_router(app_state);

    // 6. 启动服务器
    let addr = &config.server.addr;
    let listener = TcpListener::bind(addr).await?;

    tracing::info!(addr = %addr, "Server listening");

    // 7. 优雅关闭
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(config.server.graceful_shutdown_timeout_secs))
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// 优雅关闭信号处理
async fn shutdown_signal(timeout_secs: u64) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Ctrl+C received, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Terminate signal received, starting graceful shutdown");
        },
    }

    // 给正在处理的请求留出时间
    let deadline = tokio::time::Duration::from_secs(timeout_secs);
    tokio::spawn(async move {
        tokio::time::sleep(deadline).await;
        tracing::warn!("Graceful shutdown timeout reached, forcing exit");
        std::process::exit(0);
    });
}

/// 打印帮助信息
fn print_help() {
    println!("store-auth {}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("用法: store-auth [选项]");
    println!();
    println!("选项:");
    println!("  --version     打印版本信息并退出");
    println!("  --help        打印此帮助信息并退出");
    println!();
    println!("环境变量:");
    println!("  所有配置通过 STORE_ 前缀的环境变量完成");
    println!("  STORE_SECURITY__JWT_SECRET    令牌签名密钥（必填，至少 32 字符）");
    println!("  STORE_DATABASE__URL           PostgreSQL 连接串（不设置则使用内存存储）");
}
