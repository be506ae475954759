//! Username / email uniqueness checks for create and update
//!
//! This is a read-time check only. Two concurrent registrations can both pass
//! it; the store's own uniqueness constraint on `save` decides the winner.

use crate::{error::AppError, models::Identity, repository::UserStore};
use std::sync::Arc;

pub struct IdentityValidator {
    store: Arc<dyn UserStore>,
}

fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

impl IdentityValidator {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self { store }
    }

    /// Validate a candidate username/email.
    ///
    /// With no `current_username` this is a creation check and returns `None`.
    /// Otherwise the identity being updated is located and returned; a
    /// candidate value it already owns is not a conflict.
    pub async fn validate(
        &self,
        current_username: Option<&str>,
        candidate_username: Option<&str>,
        candidate_email: Option<&str>,
    ) -> Result<Option<Identity>, AppError> {
        let candidate_username = present(candidate_username);
        let candidate_email = present(candidate_email);

        let by_username = match candidate_username {
            Some(username) => self.store.find_by_username(username).await?,
            None => None,
        };
        let by_email = match candidate_email {
            Some(email) => self.store.find_by_email(email).await?,
            None => None,
        };

        let Some(current_username) = present(current_username) else {
            if let Some(existing) = by_username {
                return Err(AppError::UsernameExists(existing.username));
            }
            if let Some(existing) = by_email {
                return Err(AppError::EmailExists(existing.email));
            }
            return Ok(None);
        };

        let current = self
            .store
            .find_by_username(current_username)
            .await?
            .ok_or_else(|| AppError::IdentityNotFound(current_username.to_string()))?;

        if let Some(existing) = by_username.filter(|u| !u.is_same(&current)) {
            return Err(AppError::UsernameExists(existing.username));
        }
        if let Some(existing) = by_email.filter(|u| !u.is_same(&current)) {
            return Err(AppError::EmailExists(existing.email));
        }

        Ok(Some(current))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewIdentity, Role};
    use crate::repository::InMemoryUserStore;
    use chrono::Utc;

    async fn seeded() -> (Arc<dyn UserStore>, Identity, Identity) {
        let store: Arc<dyn UserStore> = Arc::new(InMemoryUserStore::new());
        let make = |username: &str, email: &str| {
            Identity::create(
                NewIdentity {
                    user_id: "0000000001".to_string(),
                    first_name: "Test".to_string(),
                    last_name: "User".to_string(),
                    username: username.to_string(),
                    email: email.to_string(),
                    password_hash: "hash".to_string(),
                    profile_image_url: String::new(),
                    role: Role::User,
                    is_active: true,
                    is_not_locked: true,
                },
                Utc::now(),
            )
        };
        let a = store.save(&make("alice", "alice@x.com")).await.unwrap();
        let b = store.save(&make("bob", "bob@x.com")).await.unwrap();
        (store, a, b)
    }

    #[tokio::test]
    async fn test_create_with_fresh_values() {
        let (store, _, _) = seeded().await;
        let validator = IdentityValidator::new(store);

        let result = validator
            .validate(None, Some("carol"), Some("carol@x.com"))
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_create_with_taken_username() {
        let (store, _, _) = seeded().await;
        let validator = IdentityValidator::new(store);

        let err = validator
            .validate(Some(""), Some("alice"), Some("new@x.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::UsernameExists(ref u) if u == "alice"));
    }

    #[tokio::test]
    async fn test_create_with_taken_email() {
        let (store, _, _) = seeded().await;
        let validator = IdentityValidator::new(store);

        let err = validator
            .validate(None, Some("carol"), Some("bob@x.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::EmailExists(ref e) if e == "bob@x.com"));
    }

    #[tokio::test]
    async fn test_update_missing_current_user() {
        let (store, _, _) = seeded().await;
        let validator = IdentityValidator::new(store);

        let err = validator
            .validate(Some("ghost"), Some("ghost2"), Some("ghost@x.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::IdentityNotFound(ref u) if u == "ghost"));
    }

    #[tokio::test]
    async fn test_update_with_unchanged_values_is_not_a_conflict() {
        let (store, alice, _) = seeded().await;
        let validator = IdentityValidator::new(store);

        let current = validator
            .validate(Some("alice"), Some("alice"), Some("alice@x.com"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(current.id, alice.id);
    }

    #[tokio::test]
    async fn test_update_to_other_users_email() {
        let (store, _, _) = seeded().await;
        let validator = IdentityValidator::new(store);

        let err = validator
            .validate(Some("alice"), Some("alice"), Some("bob@x.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::EmailExists(_)));
    }

    #[tokio::test]
    async fn test_update_to_other_users_username() {
        let (store, _, _) = seeded().await;
        let validator = IdentityValidator::new(store);

        let err = validator
            .validate(Some("alice"), Some("bob"), Some("alice@x.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::UsernameExists(_)));
    }

    #[tokio::test]
    async fn test_absent_candidates_only_locate_current() {
        let (store, alice, _) = seeded().await;
        let validator = IdentityValidator::new(store);

        let current = validator
            .validate(Some("alice"), None, None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(current.id, alice.id);

        assert!(validator.validate(None, None, None).await.unwrap().is_none());
    }
}
