//! 新密码投递
//!
//! 邮件发送由外部服务负责，这里只定义交付接口。默认实现只记录收件人。

use crate::{error::AppError, models::Identity};
use async_trait::async_trait;
use secrecy::Secret;

/// Delivers a freshly generated password to its owner
#[async_trait]
pub trait PasswordNotifier: Send + Sync + 'static {
    async fn send_new_password(
        &self,
        identity: &Identity,
        password: &Secret<String>,
    ) -> Result<(), AppError>;
}

/// 没有配置邮件服务时使用：记录收件人，从不输出密码
#[derive(Debug, Default, Clone, Copy)]
pub struct LogPasswordNotifier;

#[async_trait]
impl PasswordNotifier for LogPasswordNotifier {
    async fn send_new_password(
        &self,
        identity: &Identity,
        _password: &Secret<String>,
    ) -> Result<(), AppError> {
        tracing::info!(
            username = %identity.username,
            email = %identity.email,
            "New password issued, no mail sender configured"
        );
        Ok(())
    }
}
