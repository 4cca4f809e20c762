use std::{collections::HashMap, sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::{
    sync::{watch, RwLock},
    task::JoinHandle,
    time::Instant,
};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{Movie, MovieDetails},
    services::{debounce::Debouncer, providers::MovieProvider},
};

/// Where the latest settled query stands
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SearchStatus {
    /// No query, or a blank one
    #[default]
    Idle,
    Loading,
    Ready,
    Failed { message: String },
}

#[derive(Debug)]
struct SessionState {
    query: String,
    debounced_query: String,
    status: SearchStatus,
    results: Vec<Movie>,
    latest_search: u64,
    latest_details: u64,
    selected: Option<MovieDetails>,
    loading_details: bool,
    last_completed_at: Option<DateTime<Utc>>,
    last_seen: Instant,
}

impl SessionState {
    fn new() -> Self {
        Self {
            query: String::new(),
            debounced_query: String::new(),
            status: SearchStatus::Idle,
            results: Vec::new(),
            latest_search: 0,
            latest_details: 0,
            selected: None,
            loading_details: false,
            last_completed_at: None,
            last_seen: Instant::now(),
        }
    }
}

/// Read-only view of a session handed to the UI
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub id: Uuid,
    pub query: String,
    pub debounced_query: String,
    pub status: SearchStatus,
    pub results: Vec<Movie>,
    pub selected: Option<MovieDetails>,
    pub loading_details: bool,
    pub last_completed_at: Option<DateTime<Utc>>,
}

/// One user's search box: debounced query, results and the open details view
///
/// Every settled query is tagged with a sequence number when its search starts.
/// A response is applied only if no newer query settled in the meantime, so a
/// slow stale response can never overwrite fresher results. Details lookups
/// are guarded the same way.
pub struct SearchSession {
    id: Uuid,
    debouncer: Debouncer<String>,
    state: Arc<RwLock<SessionState>>,
    provider: Arc<dyn MovieProvider>,
    listener: JoinHandle<()>,
}

impl SearchSession {
    pub fn new(provider: Arc<dyn MovieProvider>, delay: Duration) -> Self {
        let debouncer = Debouncer::new(String::new(), delay);
        let state = Arc::new(RwLock::new(SessionState::new()));

        let listener = tokio::spawn(Self::listen(
            debouncer.subscribe(),
            state.clone(),
            provider.clone(),
        ));

        Self {
            id: Uuid::new_v4(),
            debouncer,
            state,
            provider,
            listener,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Starts a search for every query that settles
    async fn listen(
        mut settled_rx: watch::Receiver<String>,
        state: Arc<RwLock<SessionState>>,
        provider: Arc<dyn MovieProvider>,
    ) {
        while settled_rx.changed().await.is_ok() {
            let query = settled_rx.borrow_and_update().clone();

            let seq = {
                let mut state = state.write().await;
                state.latest_search += 1;
                state.debounced_query = query.clone();

                if query.trim().is_empty() {
                    state.results.clear();
                    state.status = SearchStatus::Idle;
                    continue;
                }

                state.status = SearchStatus::Loading;
                state.latest_search
            };

            tokio::spawn(Self::run_search(provider.clone(), state.clone(), query, seq));
        }

        tracing::debug!("Search session listener stopped");
    }

    async fn run_search(
        provider: Arc<dyn MovieProvider>,
        state: Arc<RwLock<SessionState>>,
        query: String,
        seq: u64,
    ) {
        let outcome = provider.search_movies(&query).await;

        let mut state = state.write().await;
        if seq != state.latest_search {
            tracing::debug!(query = %query, seq, latest = state.latest_search, "Discarding stale search response");
            return;
        }

        match outcome {
            Ok(movies) => {
                state.results = movies;
                state.status = SearchStatus::Ready;
            }
            Err(e) => {
                tracing::warn!(query = %query, error = %e, provider = provider.name(), "Search failed");
                state.results.clear();
                state.status = SearchStatus::Failed {
                    message: e.to_string(),
                };
            }
        }
        state.last_completed_at = Some(Utc::now());
    }

    /// Records a keystroke; the search runs once the query has been quiet long enough
    pub async fn set_query(&self, query: String) {
        self.state.write().await.query = query.clone();
        self.debouncer.set(query);
    }

    /// Opens the details view for `imdb_id`
    ///
    /// When the lookup fails but the title is known (from the current results
    /// or `fallback`), a placeholder record is shown instead of an error.
    pub async fn open_details(&self, imdb_id: &str, fallback: Option<Movie>) -> AppResult<MovieDetails> {
        let (seq, known) = {
            let mut state = self.state.write().await;
            state.latest_details += 1;
            state.loading_details = true;
            let known = state
                .results
                .iter()
                .find(|movie| movie.imdb_id == imdb_id)
                .cloned()
                .or(fallback);
            (state.latest_details, known)
        };

        let outcome = match self.provider.fetch_details(imdb_id).await {
            Ok(details) => Ok(details),
            Err(AppError::InvalidInput(msg)) => Err(AppError::InvalidInput(msg)),
            Err(e) => match known {
                Some(movie) => {
                    tracing::warn!(imdb_id = %imdb_id, error = %e, "Showing placeholder details");
                    Ok(MovieDetails::unavailable(movie))
                }
                None => Err(e),
            },
        };

        let mut state = self.state.write().await;
        if seq != state.latest_details {
            tracing::debug!(imdb_id = %imdb_id, seq, "Discarding stale details response");
            return outcome;
        }

        state.loading_details = false;
        if let Ok(details) = &outcome {
            state.selected = Some(details.clone());
        }
        outcome
    }

    /// Closes the details view; an in-flight lookup will not reopen it
    pub async fn close_details(&self) {
        let mut state = self.state.write().await;
        state.latest_details += 1;
        state.selected = None;
        state.loading_details = false;
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        let state = self.state.read().await;
        SessionSnapshot {
            id: self.id,
            query: state.query.clone(),
            debounced_query: state.debounced_query.clone(),
            status: state.status.clone(),
            results: state.results.clone(),
            selected: state.selected.clone(),
            loading_details: state.loading_details,
            last_completed_at: state.last_completed_at,
        }
    }

    /// Marks the session as used by a client just now
    pub async fn touch(&self) {
        self.state.write().await.last_seen = Instant::now();
    }

    /// How long since a client last used this session
    pub async fn idle_for(&self) -> Duration {
        self.state.read().await.last_seen.elapsed()
    }

    /// Cancels the pending debounce and stops reacting to queries
    pub fn close(&self) {
        self.debouncer.cancel();
        self.listener.abort();
    }
}

impl Drop for SearchSession {
    fn drop(&mut self) {
        self.listener.abort();
    }
}

/// Live search sessions keyed by id
///
/// Clients rarely say goodbye, so sessions nobody has looked up for
/// `idle_timeout` are closed by [`SessionRegistry::evict_idle`], which
/// [`SessionRegistry::spawn_idle_sweeper`] runs periodically.
#[derive(Clone)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<Uuid, Arc<SearchSession>>>>,
    provider: Arc<dyn MovieProvider>,
    delay: Duration,
    idle_timeout: Duration,
}

impl SessionRegistry {
    pub fn new(provider: Arc<dyn MovieProvider>, delay: Duration, idle_timeout: Duration) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            provider,
            delay,
            idle_timeout,
        }
    }

    pub async fn create(&self) -> Arc<SearchSession> {
        let session = Arc::new(SearchSession::new(self.provider.clone(), self.delay));
        self.sessions
            .write()
            .await
            .insert(session.id(), session.clone());

        tracing::info!(session_id = %session.id(), "Search session created");
        session
    }

    /// Looks a session up and marks it as in use
    pub async fn get(&self, id: Uuid) -> AppResult<Arc<SearchSession>> {
        let session = self
            .sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Search session {}", id)))?;

        session.touch().await;
        Ok(session)
    }

    /// Tears a session down; returns whether it existed
    pub async fn remove(&self, id: Uuid) -> bool {
        match self.sessions.write().await.remove(&id) {
            Some(session) => {
                session.close();
                tracing::info!(session_id = %id, "Search session closed");
                true
            }
            None => false,
        }
    }

    /// Closes every session idle for at least `idle_timeout`; returns how many
    pub async fn evict_idle(&self) -> usize {
        let candidates: Vec<(Uuid, Arc<SearchSession>)> = self
            .sessions
            .read()
            .await
            .iter()
            .map(|(id, session)| (*id, session.clone()))
            .collect();

        let mut idle = Vec::new();
        for (id, session) in candidates {
            if session.idle_for().await >= self.idle_timeout {
                idle.push(id);
            }
        }

        let mut evicted = 0;
        let mut sessions = self.sessions.write().await;
        for id in idle {
            if let Some(session) = sessions.remove(&id) {
                session.close();
                evicted += 1;
                tracing::info!(session_id = %id, "Idle search session evicted");
            }
        }
        evicted
    }

    /// Runs [`SessionRegistry::evict_idle`] in the background every half timeout
    pub fn spawn_idle_sweeper(&self) -> JoinHandle<()> {
        let registry = self.clone();
        let period = (self.idle_timeout / 2).max(Duration::from_secs(1));

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let evicted = registry.evict_idle().await;
                if evicted > 0 {
                    tracing::debug!(evicted, "Idle session sweep finished");
                }
            }
        })
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}
