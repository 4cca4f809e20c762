use std::sync::Arc;

use crate::services::{
    preferences::PreferencesStore, providers::MovieProvider, search_session::SessionRegistry,
    watchlist::WatchlistStore,
};

/// Shared application state
///
/// Built once at startup and handed to every handler; there is no other way
/// to reach the stores.
#[derive(Clone)]
pub struct AppState {
    pub provider: Arc<dyn MovieProvider>,
    pub watchlist: WatchlistStore,
    pub preferences: PreferencesStore,
    pub sessions: SessionRegistry,
}

impl AppState {
    pub fn new(
        provider: Arc<dyn MovieProvider>,
        watchlist: WatchlistStore,
        preferences: PreferencesStore,
        sessions: SessionRegistry,
    ) -> Self {
        Self {
            provider,
            watchlist,
            preferences,
            sessions,
        }
    }
}
