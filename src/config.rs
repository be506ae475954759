//! 配置系统
//! 从环境变量加载所有配置，使用 Secret 包装敏感信息

use config::{Config, ConfigError, Environment};
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// 监听地址，例如 "0.0.0.0:8081"
    pub addr: String,
    /// 优雅关闭超时时间（秒）
    pub graceful_shutdown_timeout_secs: u64,
    /// 允许跨域访问的来源
    pub cors_allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// 数据库连接 URL（未配置时使用内存存储）
    pub url: Option<Secret<String>>,
    /// 最大连接数
    pub max_connections: u32,
    /// 最小连接数
    pub min_connections: u32,
    /// 获取连接超时时间（秒）
    pub acquire_timeout_secs: u64,
    /// 空闲连接超时时间（秒）
    pub idle_timeout_secs: u64,
    /// 连接最大生命周期（秒）
    pub max_lifetime_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// 日志级别: trace, debug, info, warn, error
    pub level: String,
    /// 日志格式: json, pretty
    pub format: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    /// JWT 密钥（使用 Secret 包装，防止日志泄露）
    pub jwt_secret: Secret<String>,
    /// 令牌过期时间（秒）
    pub token_expiration_secs: u64,
    /// 令牌签发者
    pub token_issuer: String,
    /// 登录成功后携带令牌的响应头
    pub token_header: String,
}

/// 登录失败计数策略
#[derive(Debug, Clone, Deserialize)]
pub struct LoginAttemptConfig {
    /// 触发锁定的失败次数
    pub max_attempts: u32,
    /// 计数窗口（秒），从最后一次写入开始计算
    pub window_secs: u64,
    /// 最多跟踪的用户数
    pub capacity: u64,
}

impl LoginAttemptConfig {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

impl Default for LoginAttemptConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            window_secs: 15 * 60,
            capacity: 100,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub security: SecurityConfig,
    pub login_attempts: LoginAttemptConfig,
}

impl AppConfig {
    /// 从环境变量加载配置
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut settings = Config::builder();

        // 添加默认配置
        settings = settings
            .set_default("server.addr", "0.0.0.0:8081")?
            .set_default("server.graceful_shutdown_timeout_secs", 30)?
            .set_default(
                "server.cors_allowed_origins",
                vec!["http://localhost:4200", "http://localhost:8081"],
            )?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("database.acquire_timeout_secs", 30)?
            .set_default("database.idle_timeout_secs", 600)?
            .set_default("database.max_lifetime_secs", 1800)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "json")?
            .set_default("security.token_expiration_secs", 432_000)?
            .set_default("security.token_issuer", "ethan-store")?
            .set_default("security.token_header", "Jwt-Token")?
            .set_default("login_attempts.max_attempts", 5)?
            .set_default("login_attempts.window_secs", 900)?
            .set_default("login_attempts.capacity", 100)?;

        // 从环境变量加载配置（前缀为 STORE_）
        settings = settings.add_source(
            Environment::with_prefix("STORE")
                .prefix_separator("_")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("server.cors_allowed_origins")
                .try_parsing(true),
        );

        let config: AppConfig = settings.build()?.try_deserialize()?;

        // 验证配置
        config.validate()?;

        Ok(config)
    }

    /// 验证配置合法性
    pub fn validate(&self) -> Result<(), ConfigError> {
        // 验证端口范围
        if let Some(port_str) = self.server.addr.split(':').next_back() {
            if let Ok(port) = port_str.parse::<u16>() {
                if port != 0 && port < 1024 {
                    return Err(ConfigError::Message("Server port should be >= 1024".to_string()));
                }
            }
        }

        // 验证日志级别
        match self.logging.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(ConfigError::Message(format!(
                    "Invalid log level: {}. Must be one of: trace, debug, info, warn, error",
                    self.logging.level
                )))
            }
        }

        // 验证日志格式
        match self.logging.format.to_lowercase().as_str() {
            "json" | "pretty" => {}
            _ => {
                return Err(ConfigError::Message(format!(
                    "Invalid log format: {}. Must be one of: json, pretty",
                    self.logging.format
                )))
            }
        }

        // 验证数据库连接池配置
        if self.database.max_connections < self.database.min_connections {
            return Err(ConfigError::Message(
                "max_connections must be >= min_connections".to_string(),
            ));
        }

        // 验证 JWT 密钥长度（至少 32 字符）
        if self.security.jwt_secret.expose_secret().len() < 32 {
            return Err(ConfigError::Message(
                "JWT secret must be at least 32 characters long".to_string(),
            ));
        }

        // 验证令牌过期时间
        if self.security.token_expiration_secs < 60
            || self.security.token_expiration_secs > 2_592_000
        {
            return Err(ConfigError::Message(
                "token_expiration_secs must be between 60 and 2592000 (1 minute to 30 days)"
                    .to_string(),
            ));
        }

        if self.security.token_header.trim().is_empty() {
            return Err(ConfigError::Message("token_header must not be empty".to_string()));
        }

        // 验证登录失败锁定配置
        if self.login_attempts.max_attempts < 1 || self.login_attempts.max_attempts > 20 {
            return Err(ConfigError::Message(
                "max_attempts must be between 1 and 20".to_string(),
            ));
        }

        if self.login_attempts.window_secs == 0 {
            return Err(ConfigError::Message("window_secs must be > 0".to_string()));
        }

        if self.login_attempts.capacity == 0 {
            return Err(ConfigError::Message("capacity must be > 0".to_string()));
        }

        Ok(())
    }
}
