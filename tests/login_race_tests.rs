//! 登录与管理端修改交错时的写入测试
//!
//! 存储包装在登录读取用户之后立刻应用一次管理端修改，
//! 登录随后的写入不能把这次修改覆盖掉。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use store_auth::{
    auth::{jwt::JwtService, password::PasswordHasher},
    error::AppError,
    models::{Identity, IdentityChanges, LoginRequest, NewIdentity, Role},
    repository::{InMemoryUserStore, UserStore},
    services::{AuthService, LoginAttemptService},
};
use uuid::Uuid;

mod common;
use common::TEST_SECRET;

const PASSWORD: &str = "CorrectHorse1";

/// 在 find_by_username 返回快照后应用待定的管理端修改
#[derive(Default)]
struct InterleavingStore {
    inner: InMemoryUserStore,
    pending: Mutex<Option<IdentityChanges>>,
}

impl InterleavingStore {
    fn change_after_next_read(&self, changes: IdentityChanges) {
        *self.pending.lock().unwrap() = Some(changes);
    }
}

#[async_trait]
impl UserStore for InterleavingStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<Identity>, AppError> {
        let snapshot = self.inner.find_by_username(username).await?;
        let pending = self.pending.lock().unwrap().take();
        if let (Some(found), Some(changes)) = (&snapshot, pending) {
            self.inner.save(&found.with_changes(changes)).await?;
        }
        Ok(snapshot)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>, AppError> {
        self.inner.find_by_email(email).await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Identity>, AppError> {
        self.inner.find_by_id(id).await
    }

    async fn save(&self, identity: &Identity) -> Result<Identity, AppError> {
        self.inner.save(identity).await
    }

    async fn record_login(
        &self,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<Identity>, AppError> {
        self.inner.record_login(id, now).await
    }

    async fn set_not_locked(
        &self,
        id: Uuid,
        is_not_locked: bool,
    ) -> Result<Option<Identity>, AppError> {
        self.inner.set_not_locked(id, is_not_locked).await
    }

    async fn set_password_hash(
        &self,
        id: Uuid,
        password_hash: &str,
    ) -> Result<Option<Identity>, AppError> {
        self.inner.set_password_hash(id, password_hash).await
    }

    async fn delete_by_id(&self, id: Uuid) -> Result<bool, AppError> {
        self.inner.delete_by_id(id).await
    }

    async fn find_all(&self) -> Result<Vec<Identity>, AppError> {
        self.inner.find_all().await
    }
}

struct Fixture {
    store: Arc<InterleavingStore>,
    jwt: Arc<JwtService>,
    service: AuthService,
}

async fn fixture() -> Fixture {
    let store = Arc::new(InterleavingStore::default());
    let hasher = PasswordHasher::new();

    let identity = Identity::create(
        NewIdentity {
            user_id: "0000000001".to_string(),
            first_name: "Jane".to_string(),
            last_name: "Doe".to_string(),
            username: "jdoe".to_string(),
            email: "jdoe@x.com".to_string(),
            password_hash: hasher.hash(PASSWORD).unwrap(),
            profile_image_url: String::new(),
            role: Role::User,
            is_active: true,
            is_not_locked: true,
        },
        Utc::now(),
    );
    store.save(&identity).await.unwrap();

    let jwt = Arc::new(JwtService::new(TEST_SECRET, "ethan-store", "Jwt-Token", 300).unwrap());
    let attempts = Arc::new(LoginAttemptService::new(5, Duration::from_secs(900), 100));
    let service = AuthService::new(store.clone(), attempts, jwt.clone(), hasher);

    Fixture {
        store,
        jwt,
        service,
    }
}

async fn stored(f: &Fixture, username: &str) -> Identity {
    f.store.find_by_username(username).await.unwrap().unwrap()
}

#[tokio::test]
async fn test_admin_lock_during_login_is_kept() {
    let f = fixture().await;
    f.store.change_after_next_read(IdentityChanges {
        is_not_locked: Some(false),
        is_active: Some(false),
        ..Default::default()
    });

    let err = f
        .service
        .verify_and_load("jdoe", PASSWORD)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::AccountLocked));

    let stored = stored(&f, "jdoe").await;
    assert!(!stored.is_not_locked);
    assert!(!stored.is_active);
    assert!(stored.last_login_date.is_none());
}

#[tokio::test]
async fn test_admin_disable_during_login_is_kept() {
    let f = fixture().await;
    f.store.change_after_next_read(IdentityChanges {
        is_active: Some(false),
        ..Default::default()
    });

    let err = f
        .service
        .verify_and_load("jdoe", PASSWORD)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::AccountDisabled));
    assert!(!stored(&f, "jdoe").await.is_active);
}

#[tokio::test]
async fn test_admin_role_change_during_login_is_kept() {
    let f = fixture().await;
    f.store.change_after_next_read(IdentityChanges {
        first_name: Some("Janet".to_string()),
        role: Some(Role::Admin),
        ..Default::default()
    });

    let response = f
        .service
        .login(LoginRequest {
            username: "jdoe".to_string(),
            password: PASSWORD.to_string(),
        })
        .await
        .unwrap();

    assert_eq!(response.user.first_name, "Janet");
    assert_eq!(response.user.role, Role::Admin);
    let principal = f.jwt.validate(&response.token.token).unwrap();
    assert!(principal.authorities.contains(&"user:create".to_string()));

    let stored = stored(&f, "jdoe").await;
    assert_eq!(stored.first_name, "Janet");
    assert_eq!(stored.role, Role::Admin);
    assert!(stored.last_login_date.is_some());
}

#[tokio::test]
async fn test_lockout_keeps_concurrent_profile_change() {
    let f = fixture().await;
    for _ in 0..5 {
        let _ = f.service.verify_and_load("jdoe", "wrong-password").await;
    }

    f.store.change_after_next_read(IdentityChanges {
        first_name: Some("Janet".to_string()),
        ..Default::default()
    });
    let err = f
        .service
        .verify_and_load("jdoe", PASSWORD)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::AccountLocked));

    let stored = stored(&f, "jdoe").await;
    assert!(!stored.is_not_locked);
    assert_eq!(stored.first_name, "Janet");
}
