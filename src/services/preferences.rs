use std::sync::{Arc, Mutex, PoisonError};

use serde_json::Value;
use tokio::{sync::RwLock, task::JoinHandle};

use crate::{
    models::Theme,
    storage::{KeyValueStorage, StorageKey},
};

/// User interface preferences, persisted as the front-end's `darkMode` flag
///
/// Writes are fire-and-forget like the watchlist's. Each spawned save writes
/// whatever theme is current when it runs, serialized behind `write_lock`, so
/// the last save to finish always holds the latest value.
#[derive(Clone)]
pub struct PreferencesStore {
    theme: Arc<RwLock<Theme>>,
    storage: Arc<dyn KeyValueStorage>,
    write_lock: Arc<tokio::sync::Mutex<()>>,
    last_save: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl PreferencesStore {
    /// Loads the stored theme, falling back to [`Theme::Light`]
    pub async fn load(storage: Arc<dyn KeyValueStorage>) -> Self {
        let theme = match storage.get_item(StorageKey::Theme).await {
            Ok(Some(Value::Bool(dark))) => Theme::from_dark_mode(dark),
            Ok(Some(other)) => {
                tracing::warn!(value = %other, "Ignoring malformed theme preference");
                Theme::default()
            }
            Ok(None) => Theme::default(),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load theme preference");
                Theme::default()
            }
        };

        tracing::debug!(?theme, "Theme preference loaded");

        Self {
            theme: Arc::new(RwLock::new(theme)),
            storage,
            write_lock: Arc::new(tokio::sync::Mutex::new(())),
            last_save: Arc::new(Mutex::new(None)),
        }
    }

    pub async fn theme(&self) -> Theme {
        *self.theme.read().await
    }

    pub async fn set_theme(&self, theme: Theme) -> Theme {
        *self.theme.write().await = theme;
        self.schedule_save();
        theme
    }

    /// Flips between light and dark and returns the new theme
    pub async fn toggle_theme(&self) -> Theme {
        let theme = {
            let mut current = self.theme.write().await;
            *current = current.toggled();
            *current
        };
        self.schedule_save();
        theme
    }

    fn schedule_save(&self) {
        let store = self.clone();
        let handle = tokio::spawn(async move {
            let _guard = store.write_lock.lock().await;
            let theme = *store.theme.read().await;
            if let Err(e) = store
                .storage
                .set_item(StorageKey::Theme, Value::Bool(theme.is_dark()))
                .await
            {
                tracing::warn!(error = %e, "Failed to persist theme preference");
            }
        });

        let mut last_save = self.last_save.lock().unwrap_or_else(PoisonError::into_inner);
        *last_save = Some(handle);
    }

    /// Waits for the most recently scheduled save to finish
    pub async fn flush(&self) {
        let handle = self
            .last_save
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "Theme save task failed");
            }
        }
    }
}
