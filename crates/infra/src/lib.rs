//! Infrastructure layer: durable storage, identity service client, config.

pub mod config;
pub mod identity;
pub mod sqlite;

pub use config::{AppConfig, ConfigError};
pub use identity::{HttpIdentityProvider, StaticIdentityProvider};
pub use sqlite::{SqliteStore, SqliteStoreError};
