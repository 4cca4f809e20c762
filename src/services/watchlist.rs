use std::sync::Arc;

use tokio::{
    sync::{mpsc, watch, RwLock},
    task::JoinHandle,
};

use crate::{
    models::Movie,
    storage::{KeyValueStorage, StorageKey},
};

/// In-memory list plus a revision counter bumped on every mutation
#[derive(Debug, Default)]
struct WatchlistState {
    items: Vec<Movie>,
    revision: u64,
}

/// The user's saved titles, mirrored to durable storage
///
/// Mutations apply to memory immediately and never wait on storage. Each one
/// bumps a revision and wakes a background writer, which persists the full
/// snapshot current at write time. Queued wake-ups are coalesced, so only the
/// latest state reaches storage (last writer wins).
///
/// Storage failures are logged and otherwise ignored: the list keeps working
/// in memory for the rest of the process.
#[derive(Clone)]
pub struct WatchlistStore {
    state: Arc<RwLock<WatchlistState>>,
    save_tx: mpsc::UnboundedSender<u64>,
    persisted_rx: watch::Receiver<u64>,
    hydrated_rx: watch::Receiver<bool>,
}

/// Handle for gracefully shutting down the watchlist writer
pub struct WatchlistWriterHandle {
    shutdown_tx: mpsc::Sender<()>,
    task: JoinHandle<()>,
}

impl WatchlistWriterHandle {
    /// Persists any outstanding changes and stops the writer task
    pub async fn shutdown(self) {
        if self.shutdown_tx.send(()).await.is_err() {
            tracing::debug!("Watchlist writer already stopped");
        }
        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "Watchlist writer task failed");
        }
        tracing::info!("Watchlist writer stopped");
    }
}

impl WatchlistStore {
    /// Creates an empty store and starts loading the persisted list in the background
    ///
    /// The store is usable immediately; it stays empty until the load resolves.
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> (Self, WatchlistWriterHandle) {
        let state = Arc::new(RwLock::new(WatchlistState::default()));
        let (save_tx, save_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        let (persisted_tx, persisted_rx) = watch::channel(0);
        let (hydrated_tx, hydrated_rx) = watch::channel(false);

        let writer_state = state.clone();
        let task = tokio::spawn(async move {
            Self::writer_task(
                storage,
                writer_state,
                save_rx,
                shutdown_rx,
                persisted_tx,
                hydrated_tx,
            )
            .await;
        });

        let store = Self {
            state,
            save_tx,
            persisted_rx,
            hydrated_rx,
        };

        (store, WatchlistWriterHandle { shutdown_tx, task })
    }

    /// Background task: hydrate once, then persist snapshots on demand
    async fn writer_task(
        storage: Arc<dyn KeyValueStorage>,
        state: Arc<RwLock<WatchlistState>>,
        mut save_rx: mpsc::UnboundedReceiver<u64>,
        mut shutdown_rx: mpsc::Receiver<()>,
        persisted_tx: watch::Sender<u64>,
        hydrated_tx: watch::Sender<bool>,
    ) {
        if Self::hydrate(storage.as_ref(), &state).await {
            Self::persist(storage.as_ref(), &state, &persisted_tx).await;
        }
        hydrated_tx.send_replace(true);

        loop {
            tokio::select! {
                Some(revision) = save_rx.recv() => {
                    let mut latest = revision;
                    while let Ok(next) = save_rx.try_recv() {
                        latest = latest.max(next);
                    }
                    if latest > *persisted_tx.borrow() {
                        Self::persist(storage.as_ref(), &state, &persisted_tx).await;
                    }
                }
                Some(()) = shutdown_rx.recv() => {
                    while save_rx.try_recv().is_ok() {}
                    let revision = state.read().await.revision;
                    let pending = revision > *persisted_tx.borrow();
                    tracing::info!(pending, "Watchlist writer shutting down");
                    if pending {
                        Self::persist(storage.as_ref(), &state, &persisted_tx).await;
                    }
                    break;
                }
                else => break,
            }
        }
    }

    /// Loads the persisted list into memory
    ///
    /// Returns true when the merged result differs from what is stored and
    /// needs saving, which happens when the list was mutated before the load
    /// resolved.
    async fn hydrate(storage: &dyn KeyValueStorage, state: &RwLock<WatchlistState>) -> bool {
        let loaded = match storage.get_item(StorageKey::Watchlist).await {
            Ok(Some(value)) => match serde_json::from_value::<Vec<Movie>>(value) {
                Ok(items) => items,
                Err(e) => {
                    tracing::warn!(error = %e, "Persisted watchlist is malformed; starting empty");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    backend = storage.name(),
                    "Failed to load watchlist; starting empty"
                );
                Vec::new()
            }
        };

        let mut merged: Vec<Movie> = Vec::with_capacity(loaded.len());
        for movie in loaded {
            if !merged.contains(&movie) {
                merged.push(movie);
            }
        }

        let mut state = state.write().await;
        let needs_save = state.revision > 0;
        for movie in std::mem::take(&mut state.items) {
            if !merged.contains(&movie) {
                merged.push(movie);
            }
        }
        state.items = merged;
        if needs_save {
            state.revision += 1;
        }

        tracing::info!(items = state.items.len(), "Watchlist hydrated");

        needs_save
    }

    /// Writes the current snapshot and publishes its revision
    async fn persist(
        storage: &dyn KeyValueStorage,
        state: &RwLock<WatchlistState>,
        persisted_tx: &watch::Sender<u64>,
    ) {
        let (items, revision) = {
            let state = state.read().await;
            (state.items.clone(), state.revision)
        };

        let result = match serde_json::to_value(&items) {
            Ok(value) => storage.set_item(StorageKey::Watchlist, value).await,
            Err(e) => Err(e.into()),
        };

        match result {
            Ok(()) => tracing::debug!(revision, items = items.len(), "Watchlist persisted"),
            Err(e) => tracing::warn!(
                error = %e,
                revision,
                backend = storage.name(),
                "Failed to persist watchlist; keeping changes in memory"
            ),
        }

        // A failed write still counts as settled so flush() never hangs
        persisted_tx.send_if_modified(|persisted| {
            if revision > *persisted {
                *persisted = revision;
                true
            } else {
                false
            }
        });
    }

    fn schedule_save(&self, state: &mut WatchlistState) {
        state.revision += 1;
        if self.save_tx.send(state.revision).is_err() {
            tracing::debug!("Watchlist writer stopped; change kept in memory only");
        }
    }

    /// Appends `movie` unless a title with the same id is already saved
    ///
    /// Returns whether the list changed. A duplicate is a no-op and schedules
    /// no write.
    pub async fn add(&self, movie: Movie) -> bool {
        let mut state = self.state.write().await;
        if state.items.contains(&movie) {
            return false;
        }

        tracing::info!(imdb_id = %movie.imdb_id, title = %movie.title, "Added to watchlist");
        state.items.push(movie);
        self.schedule_save(&mut state);
        true
    }

    /// Removes the title with `imdb_id`; returns whether it was present
    pub async fn remove(&self, imdb_id: &str) -> bool {
        let mut state = self.state.write().await;
        let before = state.items.len();
        state.items.retain(|movie| movie.imdb_id != imdb_id);
        let removed = state.items.len() != before;

        if removed {
            tracing::info!(imdb_id = %imdb_id, "Removed from watchlist");
        }
        self.schedule_save(&mut state);
        removed
    }

    /// Empties the list
    pub async fn clear(&self) {
        let mut state = self.state.write().await;
        tracing::info!(items = state.items.len(), "Watchlist cleared");
        state.items.clear();
        self.schedule_save(&mut state);
    }

    pub async fn contains(&self, imdb_id: &str) -> bool {
        self.state
            .read()
            .await
            .items
            .iter()
            .any(|movie| movie.imdb_id == imdb_id)
    }

    pub async fn get(&self, imdb_id: &str) -> Option<Movie> {
        self.state
            .read()
            .await
            .items
            .iter()
            .find(|movie| movie.imdb_id == imdb_id)
            .cloned()
    }

    /// Current list in insertion order
    pub async fn snapshot(&self) -> Vec<Movie> {
        self.state.read().await.items.clone()
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.items.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.read().await.items.is_empty()
    }

    /// Waits until the persisted list has been loaded (or the load failed)
    pub async fn hydrated(&self) {
        let mut rx = self.hydrated_rx.clone();
        let _ = rx.wait_for(|hydrated| *hydrated).await;
    }

    /// Waits until the latest mutation has been written (or the write failed)
    ///
    /// Request handlers never call this; it exists for shutdown paths and tests.
    pub async fn flush(&self) {
        let target = self.state.read().await.revision;
        let mut rx = self.persisted_rx.clone();
        let _ = rx.wait_for(|persisted| *persisted >= target).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::AppError,
        storage::{MemoryStorage, MockKeyValueStorage},
    };
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;

    fn movie(id: &str) -> Movie {
        Movie::new(id, format!("Title {}", id), "2000")
    }

    fn ids(items: &[Movie]) -> Vec<&str> {
        items.iter().map(|m| m.imdb_id.as_str()).collect()
    }

    async fn ready_store(storage: Arc<dyn KeyValueStorage>) -> WatchlistStore {
        let (store, _handle) = WatchlistStore::new(storage);
        store.hydrated().await;
        store
    }

    /// Storage whose first read blocks until the test opens the gate
    struct GatedStorage {
        gate: Notify,
        inner: MemoryStorage,
    }

    #[async_trait::async_trait]
    impl KeyValueStorage for GatedStorage {
        async fn get_item(&self, key: StorageKey) -> crate::error::AppResult<Option<Value>> {
            self.gate.notified().await;
            self.inner.get_item(key).await
        }

        async fn set_item(&self, key: StorageKey, value: Value) -> crate::error::AppResult<()> {
            self.inner.set_item(key, value).await
        }

        async fn remove_item(&self, key: StorageKey) -> crate::error::AppResult<()> {
            self.inner.remove_item(key).await
        }

        fn name(&self) -> &'static str {
            "gated"
        }
    }

    #[tokio::test]
    async fn test_add_is_idempotent() {
        let store = ready_store(Arc::new(MemoryStorage::new())).await;

        assert!(store.add(movie("tt1")).await);
        assert!(!store.add(movie("tt1")).await);

        let items = store.snapshot().await;
        assert_eq!(ids(&items), vec!["tt1"]);
        assert_eq!(items[0].title, "Title tt1");
    }

    #[tokio::test]
    async fn test_duplicate_keeps_first_entry() {
        let store = ready_store(Arc::new(MemoryStorage::new())).await;

        store.add(movie("tt1")).await;
        store.add(Movie::new("tt1", "Other title", "1990")).await;

        assert_eq!(store.snapshot().await[0].title, "Title tt1");
    }

    #[tokio::test]
    async fn test_remove_absent_is_noop() {
        let store = ready_store(Arc::new(MemoryStorage::new())).await;
        store.add(movie("tt1")).await;

        assert!(!store.remove("tt404").await);
        assert_eq!(ids(&store.snapshot().await), vec!["tt1"]);
    }

    #[tokio::test]
    async fn test_add_then_remove_round_trip() {
        let store = ready_store(Arc::new(MemoryStorage::new())).await;
        store.add(movie("tt1")).await;
        let before = store.snapshot().await;

        store.add(movie("tt2")).await;
        assert!(store.remove("tt2").await);

        assert_eq!(ids(&store.snapshot().await), ids(&before));
    }

    #[tokio::test]
    async fn test_remove_preserves_order() {
        let store = ready_store(Arc::new(MemoryStorage::new())).await;
        store.add(movie("tt1")).await;
        store.add(movie("tt2")).await;
        store.remove("tt1").await;
        store.add(movie("tt3")).await;

        assert_eq!(ids(&store.snapshot().await), vec!["tt2", "tt3"]);
        assert!(store.contains("tt2").await);
        assert!(!store.contains("tt1").await);
    }

    #[tokio::test]
    async fn test_clear_any_size() {
        let store = ready_store(Arc::new(MemoryStorage::new())).await;

        store.clear().await;
        assert!(store.is_empty().await);

        for id in ["tt1", "tt2", "tt3"] {
            store.add(movie(id)).await;
        }
        assert_eq!(store.len().await, 3);

        store.clear().await;
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_survives_reload() {
        let storage: Arc<dyn KeyValueStorage> = Arc::new(MemoryStorage::new());
        let store = ready_store(storage.clone()).await;

        store.add(movie("tt1")).await;
        store.add(movie("tt2")).await;
        store.add(movie("tt3")).await;
        store.remove("tt2").await;
        store.add(movie("tt1")).await;
        store.flush().await;
        let expected = store.snapshot().await;

        let reloaded = ready_store(storage).await;
        assert_eq!(ids(&reloaded.snapshot().await), ids(&expected));
    }

    #[tokio::test]
    async fn test_persisted_snapshot_matches_memory() {
        let storage = Arc::new(MemoryStorage::new());
        let store = ready_store(storage.clone()).await;

        store.add(movie("tt1")).await;
        store.add(movie("tt2")).await;
        store.flush().await;

        let stored = storage.get_item(StorageKey::Watchlist).await.unwrap();
        let stored: Vec<Movie> = serde_json::from_value(stored.unwrap()).unwrap();
        assert_eq!(ids(&stored), vec!["tt1", "tt2"]);
    }

    #[tokio::test]
    async fn test_empty_until_load_resolves() {
        let inner = MemoryStorage::new();
        inner
            .set_item(StorageKey::Watchlist, json!([movie("tt1"), movie("tt2")]))
            .await
            .unwrap();
        let storage = Arc::new(GatedStorage {
            gate: Notify::new(),
            inner,
        });

        let (store, _handle) = WatchlistStore::new(storage.clone());
        assert!(store.is_empty().await);

        store.add(movie("tt9")).await;
        store.add(movie("tt2")).await;
        storage.gate.notify_one();
        store.hydrated().await;
        store.flush().await;

        assert_eq!(ids(&store.snapshot().await), vec!["tt1", "tt2", "tt9"]);

        let stored = storage.inner.get_item(StorageKey::Watchlist).await.unwrap();
        let stored: Vec<Movie> = serde_json::from_value(stored.unwrap()).unwrap();
        assert_eq!(ids(&stored), vec!["tt1", "tt2", "tt9"]);
    }

    #[tokio::test]
    async fn test_load_failure_starts_empty() {
        let mut storage = MockKeyValueStorage::new();
        storage
            .expect_get_item()
            .returning(|_| Err(AppError::Internal("disk unavailable".to_string())));
        storage.expect_set_item().returning(|_, _| Ok(()));
        storage.expect_name().return_const("mock");

        let store = ready_store(Arc::new(storage)).await;

        assert!(store.is_empty().await);
        assert!(store.add(movie("tt1")).await);
    }

    #[tokio::test]
    async fn test_malformed_data_starts_empty() {
        let storage = Arc::new(MemoryStorage::new());
        storage
            .set_item(StorageKey::Watchlist, json!({"not": "a list"}))
            .await
            .unwrap();

        let store = ready_store(storage).await;
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_persisted_duplicates_collapsed() {
        let storage = Arc::new(MemoryStorage::new());
        storage
            .set_item(
                StorageKey::Watchlist,
                json!([movie("tt1"), movie("tt2"), movie("tt1")]),
            )
            .await
            .unwrap();

        let store = ready_store(storage).await;
        assert_eq!(ids(&store.snapshot().await), vec!["tt1", "tt2"]);
    }

    #[tokio::test]
    async fn test_write_failure_stays_in_memory() {
        let mut storage = MockKeyValueStorage::new();
        storage.expect_get_item().returning(|_| Ok(None));
        storage
            .expect_set_item()
            .returning(|_, _| Err(AppError::Internal("quota exceeded".to_string())));
        storage.expect_name().return_const("mock");

        let store = ready_store(Arc::new(storage)).await;

        store.add(movie("tt1")).await;
        store.add(movie("tt2")).await;
        store.flush().await;

        assert_eq!(ids(&store.snapshot().await), vec!["tt1", "tt2"]);
    }

    #[tokio::test]
    async fn test_duplicate_add_schedules_no_write() {
        let writes = Arc::new(AtomicUsize::new(0));
        let counter = writes.clone();
        let mut storage = MockKeyValueStorage::new();
        storage.expect_get_item().returning(|_| Ok(None));
        storage.expect_set_item().returning(move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        storage.expect_name().return_const("mock");

        let store = ready_store(Arc::new(storage)).await;

        store.add(movie("tt1")).await;
        store.flush().await;
        store.add(movie("tt1")).await;
        store.flush().await;

        assert_eq!(writes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_shutdown_flushes_pending_writes() {
        let storage = Arc::new(MemoryStorage::new());
        let (store, handle) = WatchlistStore::new(storage.clone());
        store.hydrated().await;

        store.add(movie("tt1")).await;
        store.add(movie("tt2")).await;
        handle.shutdown().await;

        let stored = storage.get_item(StorageKey::Watchlist).await.unwrap();
        let stored: Vec<Movie> = serde_json::from_value(stored.unwrap()).unwrap();
        assert_eq!(ids(&stored), vec!["tt1", "tt2"]);

        // Still usable in memory after the writer is gone
        assert!(store.add(movie("tt3")).await);
        store.flush().await;
    }

    #[tokio::test]
    async fn test_shutdown_after_writer_stopped() {
        let (store, handle) = WatchlistStore::new(Arc::new(MemoryStorage::new()));
        store.hydrated().await;

        handle.task.abort();
        tokio::task::yield_now().await;
        handle.shutdown().await;

        assert!(store.add(movie("tt1")).await);
        assert!(store.contains("tt1").await);
    }
}
