//! User domain models

use super::role::Role;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Registered user account
///
/// Transitions never mutate in place: every change derives a new value
/// through one of the `with_*` methods so each step is visible at the call site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    /// Storage id
    pub id: Uuid,
    /// External-facing user id (10 digits)
    pub user_id: String,
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub password_hash: String,
    pub email: String,
    pub profile_image_url: String,

    // Login bookkeeping
    pub last_login_date: Option<DateTime<Utc>>,
    pub last_login_date_display: Option<DateTime<Utc>>,
    pub join_date: DateTime<Utc>,

    // Authorization
    pub role: Role,
    pub authorities: Vec<String>,

    // Account state
    pub is_active: bool,
    pub is_not_locked: bool,
}

/// Everything needed to create an identity; the storage id is assigned here.
#[derive(Debug, Clone)]
pub struct NewIdentity {
    pub user_id: String,
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub profile_image_url: String,
    pub role: Role,
    pub is_active: bool,
    pub is_not_locked: bool,
}

/// Named overrides for a profile update. `None` keeps the current value.
#[derive(Debug, Clone, Default)]
pub struct IdentityChanges {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
    pub is_not_locked: Option<bool>,
}

impl Identity {
    pub fn create(new: NewIdentity, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            first_name: new.first_name,
            last_name: new.last_name,
            username: new.username,
            password_hash: new.password_hash,
            email: new.email,
            profile_image_url: new.profile_image_url,
            last_login_date: None,
            last_login_date_display: None,
            join_date: now,
            role: new.role,
            authorities: new.role.authorities().to_vec(),
            is_active: new.is_active,
            is_not_locked: new.is_not_locked,
        }
    }

    /// Apply a profile update. A role change re-resolves the authority set.
    pub fn with_changes(&self, changes: IdentityChanges) -> Self {
        let role = changes.role.unwrap_or(self.role);
        let authorities = match changes.role {
            Some(role) => role.authorities().to_vec(),
            None => self.authorities.clone(),
        };

        Self {
            first_name: changes.first_name.unwrap_or_else(|| self.first_name.clone()),
            last_name: changes.last_name.unwrap_or_else(|| self.last_name.clone()),
            username: changes.username.unwrap_or_else(|| self.username.clone()),
            email: changes.email.unwrap_or_else(|| self.email.clone()),
            role,
            authorities,
            is_active: changes.is_active.unwrap_or(self.is_active),
            is_not_locked: changes.is_not_locked.unwrap_or(self.is_not_locked),
            ..self.clone()
        }
    }

    /// Roll the login timestamps: the previous login becomes the displayed one.
    pub fn with_login_recorded(&self, now: DateTime<Utc>) -> Self {
        Self {
            last_login_date_display: self.last_login_date,
            last_login_date: Some(now),
            ..self.clone()
        }
    }

    pub fn with_password_hash(&self, password_hash: String) -> Self {
        Self {
            password_hash,
            ..self.clone()
        }
    }

    /// Same stored identity, compared by storage id
    pub fn is_same(&self, other: &Identity) -> bool {
        self.id == other.id
    }
}

/// User view returned to clients (no password hash)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub user_id: String,
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub email: String,
    pub profile_image_url: String,
    pub last_login_date: Option<DateTime<Utc>>,
    pub last_login_date_display: Option<DateTime<Utc>>,
    pub join_date: DateTime<Utc>,
    pub role: Role,
    pub authorities: Vec<String>,
    pub is_active: bool,
    pub is_not_locked: bool,
}

impl From<Identity> for UserResponse {
    fn from(identity: Identity) -> Self {
        Self {
            id: identity.id,
            user_id: identity.user_id,
            first_name: identity.first_name,
            last_name: identity.last_name,
            username: identity.username,
            email: identity.email,
            profile_image_url: identity.profile_image_url,
            last_login_date: identity.last_login_date,
            last_login_date_display: identity.last_login_date_display,
            join_date: identity.join_date,
            role: identity.role,
            authorities: identity.authorities,
            is_active: identity.is_active,
            is_not_locked: identity.is_not_locked,
        }
    }
}

/// Self-registration request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 64))]
    pub first_name: String,
    #[validate(length(min = 1, max = 64))]
    pub last_name: String,
    #[validate(length(min = 3, max = 64))]
    pub username: String,
    #[validate(email)]
    pub email: String,
}

/// Administrative create request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddUserRequest {
    #[validate(length(min = 1, max = 64))]
    pub first_name: String,
    #[validate(length(min = 1, max = 64))]
    pub last_name: String,
    #[validate(length(min = 3, max = 64))]
    pub username: String,
    #[validate(email)]
    pub email: String,
    pub role: String,
    pub is_active: bool,
    pub is_non_locked: bool,
}

/// Profile update request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    #[validate(length(min = 1))]
    pub current_username: String,
    #[validate(length(min = 1, max = 64))]
    pub first_name: String,
    #[validate(length(min = 1, max = 64))]
    pub last_name: String,
    #[validate(length(min = 3, max = 64))]
    pub username: String,
    #[validate(email)]
    pub email: String,
    pub role: String,
    pub is_active: bool,
    pub is_non_locked: bool,
}
