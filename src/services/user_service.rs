//! 用户管理服务：注册、管理端增改删、重置密码

use crate::{
    auth::password::{generate_password, generate_user_id, PasswordHasher},
    error::AppError,
    models::{Identity, IdentityChanges, NewIdentity, Role},
    repository::UserStore,
    services::{
        identity_validator::IdentityValidator,
        notifier::{LogPasswordNotifier, PasswordNotifier},
    },
};
use chrono::Utc;
use secrecy::{ExposeSecret, Secret};
use std::sync::Arc;
use uuid::Uuid;

const DEFAULT_USER_IMAGE_PATH: &str = "/user/image/profile/";

/// Newly created or reset account together with its generated password.
/// The password has already gone to the notifier and is never logged.
pub struct ProvisionedIdentity {
    pub identity: Identity,
    pub password: Secret<String>,
}

/// Administrative create / update input
#[derive(Debug, Clone)]
pub struct UserProfile {
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub email: String,
    pub role: String,
    pub is_not_locked: bool,
    pub is_active: bool,
}

pub struct UserService {
    store: Arc<dyn UserStore>,
    validator: IdentityValidator,
    hasher: PasswordHasher,
    notifier: Arc<dyn PasswordNotifier>,
}

fn default_profile_image_url(first_name: &str, last_name: &str) -> String {
    format!("{DEFAULT_USER_IMAGE_PATH}{first_name}+{last_name}")
}

impl UserService {
    pub fn new(store: Arc<dyn UserStore>, hasher: PasswordHasher) -> Self {
        Self {
            validator: IdentityValidator::new(store.clone()),
            store,
            hasher,
            notifier: Arc::new(LogPasswordNotifier),
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn PasswordNotifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// 自助注册：默认角色，启用且未锁定
    pub async fn register(
        &self,
        first_name: &str,
        last_name: &str,
        username: &str,
        email: &str,
    ) -> Result<ProvisionedIdentity, AppError> {
        self.create(UserProfile {
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            username: username.to_string(),
            email: email.to_string(),
            role: Role::DEFAULT.name().to_string(),
            is_not_locked: true,
            is_active: true,
        })
        .await
    }

    /// 管理端创建用户：显式指定角色与状态
    pub async fn add_new_user(&self, profile: UserProfile) -> Result<ProvisionedIdentity, AppError> {
        self.create(profile).await
    }

    async fn create(&self, profile: UserProfile) -> Result<ProvisionedIdentity, AppError> {
        let role: Role = profile.role.parse()?;
        self.validator
            .validate(None, Some(&profile.username), Some(&profile.email))
            .await?;

        let password = generate_password();
        let identity = Identity::create(
            NewIdentity {
                user_id: generate_user_id(),
                password_hash: self.hasher.hash(password.expose_secret())?,
                profile_image_url: default_profile_image_url(
                    &profile.first_name,
                    &profile.last_name,
                ),
                first_name: profile.first_name,
                last_name: profile.last_name,
                username: profile.username,
                email: profile.email,
                role,
                is_active: profile.is_active,
                is_not_locked: profile.is_not_locked,
            },
            Utc::now(),
        );

        let identity = self.store.save(&identity).await?;
        tracing::info!(
            username = %identity.username,
            user_id = %identity.user_id,
            role = %identity.role,
            "New user created"
        );
        self.notifier.send_new_password(&identity, &password).await?;

        Ok(ProvisionedIdentity { identity, password })
    }

    /// 更新用户资料
    pub async fn update_user(
        &self,
        current_username: &str,
        profile: UserProfile,
    ) -> Result<Identity, AppError> {
        let role: Role = profile.role.parse()?;
        let current = self
            .validator
            .validate(
                Some(current_username),
                Some(&profile.username),
                Some(&profile.email),
            )
            .await?
            .ok_or_else(|| AppError::IdentityNotFound(current_username.to_string()))?;

        let updated = current.with_changes(IdentityChanges {
            first_name: Some(profile.first_name),
            last_name: Some(profile.last_name),
            username: Some(profile.username),
            email: Some(profile.email),
            role: Some(role),
            is_active: Some(profile.is_active),
            is_not_locked: Some(profile.is_not_locked),
        });

        let updated = self.store.save(&updated).await?;
        tracing::info!(
            previous_username = %current_username,
            username = %updated.username,
            "User updated"
        );

        Ok(updated)
    }

    /// 删除用户
    pub async fn delete_user(&self, id: Uuid) -> Result<(), AppError> {
        if self.store.delete_by_id(id).await? {
            tracing::info!(%id, "User deleted");
        } else {
            tracing::debug!(%id, "Delete requested for unknown user");
        }
        Ok(())
    }

    /// 重置密码：只修改密码哈希
    pub async fn reset_password(&self, email: &str) -> Result<ProvisionedIdentity, AppError> {
        let identity = self
            .store
            .find_by_email(email)
            .await?
            .ok_or_else(|| AppError::EmailNotFound(email.to_string()))?;

        let password = generate_password();
        let password_hash = self.hasher.hash(password.expose_secret())?;
        let identity = self
            .store
            .set_password_hash(identity.id, &password_hash)
            .await?
            .ok_or_else(|| AppError::EmailNotFound(email.to_string()))?;

        tracing::info!(username = %identity.username, "Password reset");
        self.notifier.send_new_password(&identity, &password).await?;

        Ok(ProvisionedIdentity { identity, password })
    }

    pub async fn find_user_by_username(&self, username: &str) -> Result<Option<Identity>, AppError> {
        self.store.find_by_username(username).await
    }

    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<Identity>, AppError> {
        self.store.find_by_email(email).await
    }

    pub async fn get_all_users(&self) -> Result<Vec<Identity>, AppError> {
        self.store.find_all().await
    }
}
