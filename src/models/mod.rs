//! 数据模型模块
//! 用户身份、角色权限与认证请求

pub mod auth;
pub mod role;
pub mod user;

pub use auth::{IssuedToken, LoginRequest, LoginResponse, TokenPrincipal};
pub use role::{authorities_for, Role};
pub use user::{Identity, IdentityChanges, NewIdentity, UserResponse};
