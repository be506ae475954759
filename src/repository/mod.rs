//! Database repository layer

pub mod memory;
pub mod user_repo;

pub use memory::InMemoryUserStore;
pub use user_repo::{PgUserStore, UserStore};
