//! Authentication-related models

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Login request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1))]
    pub username: String,
    #[validate(length(min = 1))]
    pub password: String,
}

/// Signed token plus the header it travels in
#[derive(Debug, Clone, Serialize)]
pub struct IssuedToken {
    pub header_name: String,
    pub token: String,
}

/// Identity and authorities recovered from a valid token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPrincipal {
    pub subject: String,
    pub authorities: Vec<String>,
}

/// Successful login: user view plus the token to hand back
#[derive(Debug)]
pub struct LoginResponse {
    pub user: super::user::UserResponse,
    pub token: IssuedToken,
}
