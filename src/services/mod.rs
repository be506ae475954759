//! Business logic services layer

pub mod auth_service;
pub mod identity_validator;
pub mod login_attempt;
pub mod notifier;
pub mod user_service;

pub use auth_service::AuthService;
pub use identity_validator::IdentityValidator;
pub use login_attempt::LoginAttemptService;
pub use notifier::{LogPasswordNotifier, PasswordNotifier};
pub use user_service::{ProvisionedIdentity, UserProfile, UserService};
