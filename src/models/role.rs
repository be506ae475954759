//! Role and authority domain models

use crate::error::AppError;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

pub const USER_READ: &str = "user:read";
pub const USER_CREATE: &str = "user:create";
pub const USER_UPDATE: &str = "user:update";
pub const USER_DELETE: &str = "user:delete";

const USER_AUTHORITIES: &[&str] = &[USER_READ];
const HR_AUTHORITIES: &[&str] = &[USER_READ, USER_UPDATE];
const MANAGER_AUTHORITIES: &[&str] = &[USER_READ, USER_UPDATE];
const ADMIN_AUTHORITIES: &[&str] = &[USER_READ, USER_CREATE, USER_UPDATE];
const SUPER_ADMIN_AUTHORITIES: &[&str] = &[USER_READ, USER_CREATE, USER_UPDATE, USER_DELETE];

/// Closed set of roles a user can hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "ROLE_USER")]
    User,
    #[serde(rename = "ROLE_HR")]
    Hr,
    #[serde(rename = "ROLE_MANAGER")]
    Manager,
    #[serde(rename = "ROLE_ADMIN")]
    Admin,
    #[serde(rename = "ROLE_SUPER_ADMIN")]
    SuperAdmin,
}

/// Authority sets resolved once per process; never mutated afterwards.
static AUTHORITY_TABLE: Lazy<HashMap<Role, Vec<String>>> = Lazy::new(|| {
    Role::ALL
        .iter()
        .map(|role| {
            let authorities = role.granted().iter().map(|a| a.to_string()).collect();
            (*role, authorities)
        })
        .collect()
});

impl Role {
    pub const ALL: [Role; 5] = [
        Role::User,
        Role::Hr,
        Role::Manager,
        Role::Admin,
        Role::SuperAdmin,
    ];

    /// Role assigned by self-registration
    pub const DEFAULT: Role = Role::User;

    pub fn name(&self) -> &'static str {
        match self {
            Role::User => "ROLE_USER",
            Role::Hr => "ROLE_HR",
            Role::Manager => "ROLE_MANAGER",
            Role::Admin => "ROLE_ADMIN",
            Role::SuperAdmin => "ROLE_SUPER_ADMIN",
        }
    }

    fn granted(&self) -> &'static [&'static str] {
        match self {
            Role::User => USER_AUTHORITIES,
            Role::Hr => HR_AUTHORITIES,
            Role::Manager => MANAGER_AUTHORITIES,
            Role::Admin => ADMIN_AUTHORITIES,
            Role::SuperAdmin => SUPER_ADMIN_AUTHORITIES,
        }
    }

    /// Authorities granted by this role
    pub fn authorities(&self) -> &'static [String] {
        AUTHORITY_TABLE
            .get(self)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Role {
    type Err = AppError;

    /// Case-insensitive match against the full role name (`role_admin` == `ROLE_ADMIN`)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_uppercase();
        Role::ALL
            .into_iter()
            .find(|role| role.name() == upper)
            .ok_or_else(|| AppError::UnknownRole(s.to_string()))
    }
}

/// Resolve a role name to the authorities it grants
pub fn authorities_for(role_name: &str) -> Result<Vec<String>, AppError> {
    let role: Role = role_name.parse()?;
    Ok(role.authorities().to_vec())
}
