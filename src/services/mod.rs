pub mod debounce;
pub mod preferences;
pub mod providers;
pub mod search_session;
pub mod watchlist;

pub use debounce::Debouncer;
pub use preferences::PreferencesStore;
pub use providers::{MovieProvider, OmdbProvider};
pub use search_session::{SearchSession, SearchStatus, SessionRegistry, SessionSnapshot};
pub use watchlist::{WatchlistStore, WatchlistWriterHandle};
