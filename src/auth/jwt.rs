//! JWT token generation and validation
//!
//! Tokens are stateless: authorities are captured at issue time and carried in
//! the claims. A role change therefore only reaches clients once their current
//! token expires and a new one is issued.

use crate::{
    config::AppConfig,
    error::AppError,
    models::{Identity, IssuedToken, TokenPrincipal},
};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};

/// JWT claims
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (username)
    pub sub: String,

    /// Authorities granted at issue time
    pub authorities: Vec<String>,

    /// Issuer
    pub iss: String,

    /// Issued at
    pub iat: i64,

    /// Expiration
    pub exp: i64,
}

/// JWT service
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    header_name: String,
    expiration_secs: u64,
}

impl JwtService {
    /// Create JWT service from config
    pub fn from_config(config: &AppConfig) -> Result<Self, AppError> {
        let security = &config.security;
        Self::new(
            security.jwt_secret.expose_secret(),
            &security.token_issuer,
            &security.token_header,
            security.token_expiration_secs,
        )
    }

    pub fn new(
        secret: &str,
        issuer: &str,
        header_name: &str,
        expiration_secs: u64,
    ) -> Result<Self, AppError> {
        // Ensure secret is at least 32 bytes for HS512
        if secret.len() < 32 {
            return Err(AppError::Config("JWT secret too short (min 32 chars)".to_string()));
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            issuer: issuer.to_string(),
            header_name: header_name.to_string(),
            expiration_secs,
        })
    }

    /// Header the token is returned in and expected back in
    pub fn header_name(&self) -> &str {
        &self.header_name
    }

    /// Issue a token for an authenticated identity
    pub fn issue(&self, identity: &Identity) -> Result<IssuedToken, AppError> {
        self.issue_at(identity, Utc::now())
    }

    pub(crate) fn issue_at(
        &self,
        identity: &Identity,
        issued_at: DateTime<Utc>,
    ) -> Result<IssuedToken, AppError> {
        let expiration = issued_at + Duration::seconds(self.expiration_secs as i64);

        let claims = Claims {
            sub: identity.username.clone(),
            authorities: identity.authorities.clone(),
            iss: self.issuer.clone(),
            iat: issued_at.timestamp(),
            exp: expiration.timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS512), &claims, &self.encoding_key)
            .map_err(|e| {
                tracing::error!("Failed to encode token: {:?}", e);
                AppError::Internal(format!("Failed to encode token: {}", e))
            })?;

        tracing::debug!(username = %identity.username, exp = claims.exp, "Token issued");

        Ok(IssuedToken {
            header_name: self.header_name.clone(),
            token,
        })
    }

    /// Validate and decode token. Never consults the user store.
    pub fn validate(&self, token: &str) -> Result<TokenPrincipal, AppError> {
        let mut validation = Validation::new(Algorithm::HS512);
        validation.leeway = 0;
        validation.set_issuer(&[&self.issuer]);
        validation.set_required_spec_claims(&["exp", "sub", "iss"]);

        let claims = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => {
                    tracing::debug!("Token expired");
                    AppError::TokenExpired
                }
                _ => {
                    tracing::debug!("Token validation failed: {:?}", e);
                    AppError::TokenInvalid
                }
            })?
            .claims;

        if claims.sub.trim().is_empty() {
            tracing::debug!("Token has empty subject");
            return Err(AppError::TokenInvalid);
        }

        Ok(TokenPrincipal {
            subject: claims.sub,
            authorities: claims.authorities,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewIdentity, Role};

    const SECRET: &str = "test_secret_key_32_characters_long!";

    fn service() -> JwtService {
        JwtService::new(SECRET, "ethan-store", "Jwt-Token", 900).unwrap()
    }

    fn identity(role: Role) -> Identity {
        Identity::create(
            NewIdentity {
                user_id: "0000000001".to_string(),
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
    fn test_issue_and_validate() {
        let service = service();
        let issued = service.issue(&identity(Role::Hr)).unwrap();
        assert_eq!(issued.header_name, "Jwt-Token");
        assert_eq!(issued.token.split('.').count(), 3);

        let principal = service.validate(&issued.token).unwrap();
        assert_eq!(principal.subject, "jdoe");
        assert_eq!(
            principal.authorities,
            vec!["user:read".to_string(), "user:update".to_string()]
        );
    }

    #[test]
    fn test_expired_token_rejected() {
        let service = service();
        let issued_at = Utc::now() - Duration::seconds(901);
        let issued = service.issue_at(&identity(Role::User), issued_at).unwrap();

        let err = service.validate(&issued.token).unwrap_err();
        assert!(matches!(err, AppError::TokenExpired));
    }

    #[test]
    fn test_tampered_token_rejected() {
        let service = service();
        let issued = service.issue(&identity(Role::User)).unwrap();

        // 修改载荷中间的一个字符
        let mut bytes = issued.token.into_bytes();
        let first_dot = bytes.iter().position(|b| *b == b'.').unwrap();
        let idx = first_dot + 5;
        bytes[idx] = if bytes[idx] == b'A' { b'B' } else { b'A' };
        let tampered = String::from_utf8(bytes).unwrap();

        let err = service.validate(&tampered).unwrap_err();
        assert!(matches!(err, AppError::TokenInvalid));
    }

    #[test]
    fn test_foreign_secret_rejected() {
        let other = JwtService::new("another_secret_key_32_characters_long", "ethan-store", "Jwt-Token", 900)
            .unwrap();
        let issued = other.issue(&identity(Role::User)).unwrap();

        assert!(matches!(service().validate(&issued.token), Err(AppError::TokenInvalid)));
    }

    #[test]
    fn test_foreign_issuer_rejected() {
        let other = JwtService::new(SECRET, "someone-else", "Jwt-Token", 900).unwrap();
        let issued = other.issue(&identity(Role::User)).unwrap();

        assert!(matches!(service().validate(&issued.token), Err(AppError::TokenInvalid)));
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(matches!(service().validate("invalid_token"), Err(AppError::TokenInvalid)));
        assert!(matches!(service().validate(""), Err(AppError::TokenInvalid)));
    }

    #[test]
    fn test_short_secret_rejected() {
        assert!(JwtService::new("short", "ethan-store", "Jwt-Token", 900).is_err());
    }

    #[test]
    fn test_authorities_frozen_at_issue_time() {
        let service = service();
        let mut identity = identity(Role::User);
        let issued = service.issue(&identity).unwrap();

        // 签发后角色变化不影响已签发令牌
        identity = identity.with_changes(crate::models::IdentityChanges {
            role: Some(Role::SuperAdmin),
            ..Default::default()
        });
        assert!(identity.authorities.contains(&"user:delete".to_string()));

        let principal = service.validate(&issued.token).unwrap();
        assert_eq!(principal.authorities, vec!["user:read".to_string()]);
    }
}
