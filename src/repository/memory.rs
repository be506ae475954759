//! In-process user store
//!
//! Used when no database URL is configured and by the test suite. The
//! uniqueness check and the write happen under one write lock.

use super::user_repo::UserStore;
use crate::{error::AppError, models::Identity};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
pub struct InMemoryUserStore {
    users: RwLock<HashMap<Uuid, Identity>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<Identity>, AppError> {
        if username.trim().is_empty() {
            return Ok(None);
        }
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.username == username).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>, AppError> {
        if email.trim().is_empty() {
            return Ok(None);
        }
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Identity>, AppError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn save(&self, identity: &Identity) -> Result<Identity, AppError> {
        let mut users = self.users.write().await;

        for other in users.values().filter(|u| u.id != identity.id) {
            if other.username == identity.username {
                return Err(AppError::UsernameExists(identity.username.clone()));
            }
            if other.email == identity.email {
                return Err(AppError::EmailExists(identity.email.clone()));
            }
        }

        users.insert(identity.id, identity.clone());
        Ok(identity.clone())
    }

    async fn record_login(
        &self,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<Identity>, AppError> {
        let mut users = self.users.write().await;
        let Some(stored) = users
            .get_mut(&id)
            .filter(|u| u.is_active && u.is_not_locked)
        else {
            return Ok(None);
        };

        *stored = stored.with_login_recorded(now);
        Ok(Some(stored.clone()))
    }

    async fn set_not_locked(
        &self,
        id: Uuid,
        is_not_locked: bool,
    ) -> Result<Option<Identity>, AppError> {
        let mut users = self.users.write().await;
        Ok(users.get_mut(&id).map(|stored| {
            stored.is_not_locked = is_not_locked;
            stored.clone()
        }))
    }

    async fn set_password_hash(
        &self,
        id: Uuid,
        password_hash: &str,
    ) -> Result<Option<Identity>, AppError> {
        let mut users = self.users.write().await;
        Ok(users.get_mut(&id).map(|stored| {
            stored.password_hash = password_hash.to_string();
            stored.clone()
        }))
    }

    async fn delete_by_id(&self, id: Uuid) -> Result<bool, AppError> {
        Ok(self.users.write().await.remove(&id).is_some())
    }

    async fn find_all(&self) -> Result<Vec<Identity>, AppError> {
        let users = self.users.read().await;
        let mut all: Vec<Identity> = users.values().cloned().collect();
        all.sort_by_key(|u| u.join_date);
        Ok(all)
    }
}
