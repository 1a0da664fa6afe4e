//! SQLite persistence for Studium.

pub mod chat;
pub mod pool;

pub use chat::SqliteSessionRepository;
pub use pool::DatabasePool;
