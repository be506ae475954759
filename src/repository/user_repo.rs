//! User repository (数据库访问层)

use crate::{
    error::AppError,
    models::{Identity, Role},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

const USERNAME_CONSTRAINT: &str = "users_username_key";
const EMAIL_CONSTRAINT: &str = "users_email_key";

/// Persistence collaborator for identities.
///
/// `save` is insert-or-update keyed by `Identity::id` and must reject a
/// username or email already owned by another identity. That constraint is the
/// backstop for concurrent registrations racing past the read-time checks.
#[async_trait]
pub trait UserStore: Send + Sync + 'static {
    async fn find_by_username(&self, username: &str) -> Result<Option<Identity>, AppError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>, AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Identity>, AppError>;

    async fn save(&self, identity: &Identity) -> Result<Identity, AppError>;

    /// Roll the login timestamps on the stored row, touching no other column.
    /// Only applies while the identity is still active and not locked; returns
    /// `None` when it is missing or no longer eligible.
    async fn record_login(
        &self,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<Identity>, AppError>;

    /// Set only the lock flag. `None` when the identity is missing.
    async fn set_not_locked(
        &self,
        id: Uuid,
        is_not_locked: bool,
    ) -> Result<Option<Identity>, AppError>;

    /// Set only the password hash. `None` when the identity is missing.
    async fn set_password_hash(
        &self,
        id: Uuid,
        password_hash: &str,
    ) -> Result<Option<Identity>, AppError>;

    /// Returns whether an identity was removed
    async fn delete_by_id(&self, id: Uuid) -> Result<bool, AppError>;

    async fn find_all(&self) -> Result<Vec<Identity>, AppError>;
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    user_id: String,
    first_name: String,
    last_name: String,
    username: String,
    password_hash: String,
    email: String,
    profile_image_url: String,
    last_login_date: Option<DateTime<Utc>>,
    last_login_date_display: Option<DateTime<Utc>>,
    join_date: DateTime<Utc>,
    role: String,
    authorities: Vec<String>,
    is_active: bool,
    is_not_locked: bool,
}

impl TryFrom<UserRow> for Identity {
    type Error = AppError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role: Role = row.role.parse()?;
        Ok(Identity {
            id: row.id,
            user_id: row.user_id,
            first_name: row.first_name,
            last_name: row.last_name,
            username: row.username,
            password_hash: row.password_hash,
            email: row.email,
            profile_image_url: row.profile_image_url,
            last_login_date: row.last_login_date,
            last_login_date_display: row.last_login_date_display,
            join_date: row.join_date,
            role,
            authorities: row.authorities,
            is_active: row.is_active,
            is_not_locked: row.is_not_locked,
        })
    }
}

/// PostgreSQL-backed store
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    async fn find_one(&self, sql: &str, value: &str) -> Result<Option<Identity>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(sql)
            .bind(value)
            .fetch_optional(&self.db)
            .await?;

        row.map(Identity::try_from).transpose()
    }
}

/// 唯一约束冲突映射为对应的业务错误
fn map_unique_violation(err: sqlx::Error, identity: &Identity) -> AppError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            match db_err.constraint() {
                Some(USERNAME_CONSTRAINT) => {
                    return AppError::UsernameExists(identity.username.clone())
                }
                Some(EMAIL_CONSTRAINT) => return AppError::EmailExists(identity.email.clone()),
                _ => {}
            }
        }
    }
    AppError::Database(err)
}

#[async_trait]
impl UserStore for PgUserStore {
    /// 根据用户名查找用户
    async fn find_by_username(&self, username: &str) -> Result<Option<Identity>, AppError> {
        if username.trim().is_empty() {
            return Ok(None);
        }
        self.find_one("SELECT * FROM users WHERE username = $1", username)
            .await
    }

    /// 根据邮箱查找用户
    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>, AppError> {
        if email.trim().is_empty() {
            return Ok(None);
        }
        self.find_one("SELECT * FROM users WHERE email = $1", email)
            .await
    }

    /// 根据 ID 查找用户
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Identity>, AppError> {
        let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;

        row.map(Identity::try_from).transpose()
    }

    /// 插入或更新用户
    async fn save(&self, identity: &Identity) -> Result<Identity, AppError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (
                id, user_id, first_name, last_name, username, password_hash, email,
                profile_image_url, last_login_date, last_login_date_display, join_date,
                role, authorities, is_active, is_not_locked
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            ON CONFLICT (id) DO UPDATE SET
                first_name = EXCLUDED.first_name,
                last_name = EXCLUDED.last_name,
                username = EXCLUDED.username,
                password_hash = EXCLUDED.password_hash,
                email = EXCLUDED.email,
                profile_image_url = EXCLUDED.profile_image_url,
                last_login_date = EXCLUDED.last_login_date,
                last_login_date_display = EXCLUDED.last_login_date_display,
                role = EXCLUDED.role,
                authorities = EXCLUDED.authorities,
                is_active = EXCLUDED.is_active,
                is_not_locked = EXCLUDED.is_not_locked,
                updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(identity.id)
        .bind(&identity.user_id)
        .bind(&identity.first_name)
        .bind(&identity.last_name)
        .bind(&identity.username)
        .bind(&identity.password_hash)
        .bind(&identity.email)
        .bind(&identity.profile_image_url)
        .bind(identity.last_login_date)
        .bind(identity.last_login_date_display)
        .bind(identity.join_date)
        .bind(identity.role.name())
        .bind(&identity.authorities)
        .bind(identity.is_active)
        .bind(identity.is_not_locked)
        .fetch_one(&self.db)
        .await
        .map_err(|e| map_unique_violation(e, identity))?;

        Identity::try_from(row)
    }

    /// 记录登录：显示时间取旧的登录时间（SET 右侧读取的是更新前的值）
    async fn record_login(
        &self,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<Identity>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            UPDATE users SET
                last_login_date_display = last_login_date,
                last_login_date = $2,
                updated_at = NOW()
            WHERE id = $1 AND is_active AND is_not_locked
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(now)
        .fetch_optional(&self.db)
        .await?;

        row.map(Identity::try_from).transpose()
    }

    /// 只更新锁定状态
    async fn set_not_locked(
        &self,
        id: Uuid,
        is_not_locked: bool,
    ) -> Result<Option<Identity>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(
            "UPDATE users SET is_not_locked = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(is_not_locked)
        .fetch_optional(&self.db)
        .await?;

        row.map(Identity::try_from).transpose()
    }

    /// 只更新密码哈希
    async fn set_password_hash(
        &self,
        id: Uuid,
        password_hash: &str,
    ) -> Result<Option<Identity>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(
            "UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(password_hash)
        .fetch_optional(&self.db)
        .await?;

        row.map(Identity::try_from).transpose()
    }

    /// 删除用户
    async fn delete_by_id(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// 列出所有用户
    async fn find_all(&self) -> Result<Vec<Identity>, AppError> {
        let rows = sqlx::query_as::<_, UserRow>("SELECT * FROM users ORDER BY join_date ASC")
            .fetch_all(&self.db)
            .await?;

        rows.into_iter().map(Identity::try_from).collect()
    }
}
