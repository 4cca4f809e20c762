/// Durable key-value storage for user state
///
/// The watchlist and preferences are persisted as whole JSON documents under
/// fixed string keys. Backends are interchangeable behind [`KeyValueStorage`]
/// and selected through configuration.
use serde_json::Value;
use std::{fmt::Display, sync::Arc};

use crate::{
    config::{Config, StorageBackend},
    error::AppResult,
};

pub mod file;
pub mod memory;
pub mod redis;

pub use self::file::FileStorage;
pub use self::memory::MemoryStorage;
pub use self::redis::RedisStorage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
    Watchlist,
    Theme,
}

impl Display for StorageKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageKey::Watchlist => write!(f, "watchlist"),
            StorageKey::Theme => write!(f, "darkMode"),
        }
    }
}

/// Asynchronous key-value persistence layer
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait KeyValueStorage: Send + Sync {
    /// Reads the document stored under `key`, `None` if nothing was ever written
    async fn get_item(&self, key: StorageKey) -> AppResult<Option<Value>>;

    /// Replaces the document stored under `key`
    async fn set_item(&self, key: StorageKey, value: Value) -> AppResult<()>;

    /// Deletes the document stored under `key`; absent keys are not an error
    async fn remove_item(&self, key: StorageKey) -> AppResult<()>;

    /// Backend name for logging
    fn name(&self) -> &'static str;
}

/// Builds the storage backend selected by configuration
pub fn create_storage(config: &Config) -> anyhow::Result<Arc<dyn KeyValueStorage>> {
    let storage: Arc<dyn KeyValueStorage> = match config.storage_backend {
        StorageBackend::File => Arc::new(FileStorage::new(config.data_dir.clone())),
        StorageBackend::Memory => Arc::new(MemoryStorage::new()),
        StorageBackend::Redis => Arc::new(RedisStorage::open(&config.redis_url)?),
    };

    tracing::info!(backend = storage.name(), "Storage backend ready");

    Ok(storage)
}
