//! 商店用户认证与账户保护服务
//! 令牌签发校验、登录失败锁定、角色权限与用户唯一性校验

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod repository;
pub mod routes;
pub mod services;
pub mod telemetry;
