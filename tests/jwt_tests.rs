//! 令牌签发与校验测试

use chrono::Utc;
use store_auth::{
    auth::jwt::JwtService,
    error::AppError,
    models::{Identity, NewIdentity, Role},
};

mod common;
use common::TEST_SECRET;

fn identity(role: Role) -> Identity {
    Identity::create(
        NewIdentity {
            user_id: "0123456789".to_string(),
            first_name: "Jane".to_string(),
            last_name: "Doe".to_string(),
            username: "jdoe".to_string(),
            email: "jdoe@x.com".to_string(),
            password_hash: "hash".to_string(),
            profile_image_url: String::new(),
            role,
            is_active: true,
            is_not_locked: true,
        },
        Utc::now(),
    )
}

#[test]
fn test_from_config_uses_configured_header() {
    let service = JwtService::from_config(&common::create_test_config()).unwrap();
    let issued = service.issue(&identity(Role::User)).unwrap();

    assert_eq!(issued.header_name, "Jwt-Token");
    assert_eq!(service.header_name(), "Jwt-Token");
}

#[test]
fn test_super_admin_token_carries_all_authorities() {
    let service = JwtService::new(TEST_SECRET, "ethan-store", "Jwt-Token", 300).unwrap();
    let issued = service.issue(&identity(Role::SuperAdmin)).unwrap();

    let principal = service.validate(&issued.token).unwrap();
    assert_eq!(principal.subject, "jdoe");
    assert_eq!(
        principal.authorities,
        vec!["user:read", "user:create", "user:update", "user:delete"]
    );
}

#[test]
fn test_token_from_other_issuer_rejected() {
    let ours = JwtService::new(TEST_SECRET, "ethan-store", "Jwt-Token", 300).unwrap();
    let theirs = JwtService::new(TEST_SECRET, "someone-else", "Jwt-Token", 300).unwrap();

    let issued = theirs.issue(&identity(Role::User)).unwrap();
    assert!(matches!(ours.validate(&issued.token), Err(AppError::TokenInvalid)));
}

#[test]
fn test_empty_token_rejected() {
    let service = JwtService::new(TEST_SECRET, "ethan-store", "Jwt-Token", 300).unwrap();
    assert!(matches!(service.validate(""), Err(AppError::TokenInvalid)));
}
