//! 认证服务：凭据校验、账户锁定与令牌签发

use crate::{
    auth::{jwt::JwtService, password::PasswordHasher},
    error::AppError,
    models::{Identity, LoginRequest, LoginResponse, UserResponse},
    repository::UserStore,
    services::login_attempt::LoginAttemptService,
};
use chrono::Utc;
use std::sync::Arc;

pub struct AuthService {
    store: Arc<dyn UserStore>,
    login_attempts: Arc<LoginAttemptService>,
    jwt_service: Arc<JwtService>,
    hasher: PasswordHasher,
}

impl AuthService {
    pub fn new(
        store: Arc<dyn UserStore>,
        login_attempts: Arc<LoginAttemptService>,
        jwt_service: Arc<JwtService>,
        hasher: PasswordHasher,
    ) -> Self {
        Self {
            store,
            login_attempts,
            jwt_service,
            hasher,
        }
    }

    /// 用户登录：校验凭据后签发令牌
    pub async fn login(&self, req: LoginRequest) -> Result<LoginResponse, AppError> {
        let identity = self.verify_and_load(&req.username, &req.password).await?;
        let token = self.jwt_service.issue(&identity)?;

        Ok(LoginResponse {
            user: UserResponse::from(identity),
            token,
        })
    }

    /// 校验用户名和密码，返回更新过登录时间的用户
    pub async fn verify_and_load(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Identity, AppError> {
        let identity = self
            .store
            .find_by_username(username)
            .await?
            .ok_or_else(|| {
                tracing::warn!(%username, "User not found by username");
                AppError::IdentityNotFound(username.to_string())
            })?;

        let identity = self.evaluate_lock(identity).await?;

        // 检查账户状态
        if !identity.is_not_locked {
            metrics::counter!("auth.login.rejected", "reason" => "locked").increment(1);
            return Err(AppError::AccountLocked);
        }
        if !identity.is_active {
            metrics::counter!("auth.login.rejected", "reason" => "disabled").increment(1);
            return Err(AppError::AccountDisabled);
        }

        // 验证密码
        if let Err(e) = self.hasher.verify(password, &identity.password_hash) {
            if matches!(e, AppError::AuthenticationFailed) {
                self.login_attempts.record_attempt(&identity.username);
                metrics::counter!("auth.login.rejected", "reason" => "bad_credentials")
                    .increment(1);
                tracing::info!(
                    username = %identity.username,
                    attempts = self.login_attempts.attempts(&identity.username),
                    "Login failed"
                );
            }
            return Err(e);
        }

        // 登录成功：清除失败计数并滚动登录时间
        // 只写登录时间两列；校验期间被管理端锁定或停用则拒绝登录
        self.login_attempts.clear(&identity.username);
        let identity = match self.store.record_login(identity.id, Utc::now()).await? {
            Some(identity) => identity,
            None => return Err(self.refusal_after_change(identity).await?),
        };

        metrics::counter!("auth.login.success").increment(1);
        tracing::info!(username = %identity.username, "Returning found user by username");

        Ok(identity)
    }

    /// 锁定状态机。
    ///
    /// 未锁定：失败次数达到上限则锁定并持久化。
    /// 已锁定：每次检查都清空失败计数，但不会自动解锁；解锁只能走管理端更新。
    async fn evaluate_lock(&self, identity: Identity) -> Result<Identity, AppError> {
        if !identity.is_not_locked {
            self.login_attempts.clear(&identity.username);
            return Ok(identity);
        }

        if !self.login_attempts.has_exceeded_limit(&identity.username) {
            return Ok(identity);
        }

        tracing::warn!(
            username = %identity.username,
            max_attempts = self.login_attempts.max_attempts(),
            "Too many failed logins, locking account"
        );
        metrics::counter!("auth.account.locked").increment(1);

        self.store
            .set_not_locked(identity.id, false)
            .await?
            .ok_or_else(|| AppError::IdentityNotFound(identity.username))
    }

    /// 登录时间写入被拒绝时，按存储中的当前状态给出原因
    async fn refusal_after_change(&self, identity: Identity) -> Result<AppError, AppError> {
        let current = self.store.find_by_id(identity.id).await?;
        let refusal = match current {
            None => AppError::IdentityNotFound(identity.username),
            Some(current) if !current.is_not_locked => AppError::AccountLocked,
            Some(_) => AppError::AccountDisabled,
        };

        tracing::warn!(error = %refusal, "Account changed during login, refusing");
        Ok(refusal)
    }
}
