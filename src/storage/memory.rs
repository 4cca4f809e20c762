use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::{KeyValueStorage, StorageKey};
use crate::error::AppResult;

/// Process-local storage; contents vanish with the process
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: RwLock<HashMap<StorageKey, Value>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl KeyValueStorage for MemoryStorage {
    async fn get_item(&self, key: StorageKey) -> AppResult<Option<Value>> {
        Ok(self.items.read().await.get(&key).cloned())
    }

    async fn set_item(&self, key: StorageKey, value: Value) -> AppResult<()> {
        self.items.write().await.insert(key, value);
        Ok(())
    }

    async fn remove_item(&self, key: StorageKey) -> AppResult<()> {
        self.items.write().await.remove(&key);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
