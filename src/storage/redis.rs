use redis::{AsyncCommands, Client};
use serde_json::Value;

use super::{KeyValueStorage, StorageKey};
use crate::error::AppResult;

/// Stores each key as a JSON string in Redis, without expiry
#[derive(Clone)]
pub struct RedisStorage {
    redis_client: Client,
    namespace: String,
}

impl RedisStorage {
    /// Creates a Redis-backed store; the connection is established lazily per call
    pub fn open(redis_url: &str) -> anyhow::Result<Self> {
        let redis_client = Client::open(redis_url)?;
        Ok(Self {
            redis_client,
            namespace: "movie-explorer".to_string(),
        })
    }

    fn redis_key(&self, key: StorageKey) -> String {
        format!("{}:{}", self.namespace, key)
    }
}

#[async_trait::async_trait]
impl KeyValueStorage for RedisStorage {
    async fn get_item(&self, key: StorageKey) -> AppResult<Option<Value>> {
        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
        let stored: Option<String> = conn.get(self.redis_key(key)).await?;

        match stored {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn set_item(&self, key: StorageKey, value: Value) -> AppResult<()> {
        let json = serde_json::to_string(&value)?;
        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
        let _: () = conn.set(self.redis_key(key), json).await?;
        Ok(())
    }

    async fn remove_item(&self, key: StorageKey) -> AppResult<()> {
        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
        let _: () = conn.del(self.redis_key(key)).await?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redis_key_is_namespaced() {
        let storage = RedisStorage::open("redis://localhost:6379").unwrap();
        assert_eq!(
            storage.redis_key(StorageKey::Watchlist),
            "movie-explorer:watchlist"
        );
        assert_eq!(storage.redis_key(StorageKey::Theme), "movie-explorer:darkMode");
    }

    #[test]
    fn test_invalid_url_rejected() {
        assert!(RedisStorage::open("not a url").is_err());
    }
}
