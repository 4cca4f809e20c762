use serde_json::Value;
use std::{io::ErrorKind, path::PathBuf};

use super::{KeyValueStorage, StorageKey};
use crate::error::AppResult;

/// Stores each key as `<data_dir>/<key>.json`
#[derive(Debug, Clone)]
pub struct FileStorage {
    data_dir: PathBuf,
}

impl FileStorage {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    fn path_for(&self, key: StorageKey) -> PathBuf {
        self.data_dir.join(format!("{}.json", key))
    }
}

#[async_trait::async_trait]
impl KeyValueStorage for FileStorage {
    async fn get_item(&self, key: StorageKey) -> AppResult<Option<Value>> {
        let contents = match tokio::fs::read_to_string(self.path_for(key)).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        Ok(Some(serde_json::from_str(&contents)?))
    }

    async fn set_item(&self, key: StorageKey, value: Value) -> AppResult<()> {
        tokio::fs::create_dir_all(&self.data_dir).await?;

        // Write to a sibling file first so a crash never leaves a torn document
        let path = self.path_for(key);
        let tmp_path = path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, serde_json::to_vec(&value)?).await?;
        tokio::fs::rename(&tmp_path, &path).await?;

        tracing::debug!(key = %key, path = %path.display(), "Stored document");

        Ok(())
    }

    async fn remove_item(&self, key: StorageKey) -> AppResult<()> {
        match tokio::fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn name(&self) -> &'static str {
        "file"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_get_missing_key() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());

        let value = storage.get_item(StorageKey::Watchlist).await.unwrap();
        assert_eq!(value, None);
    }

    #[tokio::test]
    async fn test_set_then_get() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("nested"));

        let document = json!([{"imdbID": "tt1", "Title": "One"}]);
        storage
            .set_item(StorageKey::Watchlist, document.clone())
            .await
            .unwrap();

        let value = storage.get_item(StorageKey::Watchlist).await.unwrap();
        assert_eq!(value, Some(document));
        assert!(dir.path().join("nested").join("watchlist.json").exists());
    }

    #[tokio::test]
    async fn test_overwrite_replaces_document() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());

        storage.set_item(StorageKey::Theme, json!(false)).await.unwrap();
        storage.set_item(StorageKey::Theme, json!(true)).await.unwrap();

        let value = storage.get_item(StorageKey::Theme).await.unwrap();
        assert_eq!(value, Some(json!(true)));
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());

        storage.set_item(StorageKey::Theme, json!(true)).await.unwrap();
        storage.remove_item(StorageKey::Theme).await.unwrap();
        storage.remove_item(StorageKey::Theme).await.unwrap();

        assert_eq!(storage.get_item(StorageKey::Theme).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_corrupt_document_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("watchlist.json"), "{not json").unwrap();
        let storage = FileStorage::new(dir.path());

        assert!(storage.get_item(StorageKey::Watchlist).await.is_err());
    }
}
