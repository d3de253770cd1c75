pub mod cache_store;
pub mod connection;
pub mod migrations;

pub use cache_store::SqliteCacheStore;
pub use connection::{connect, connect_with_settings, DbPool};
