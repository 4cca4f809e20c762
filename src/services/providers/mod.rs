/// Movie metadata provider abstraction
///
/// The watchlist and search session only depend on this trait; the remote
/// service behind it is treated as a black box returning JSON.
use crate::{
    error::AppResult,
    models::{Movie, MovieDetails},
};

pub mod omdb;

pub use omdb::OmdbProvider;

/// Trait for movie metadata providers
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait MovieProvider: Send + Sync {
    /// Search for titles by name
    ///
    /// A blank query yields an empty list without touching the network. A
    /// "not found" answer from the service is also an empty list; transport
    /// and HTTP failures are errors.
    async fn search_movies(&self, query: &str) -> AppResult<Vec<Movie>>;

    /// Fetch extended metadata for a single title
    ///
    /// Fails with `InvalidInput` for a blank id, before any request is made.
    async fn fetch_details(&self, imdb_id: &str) -> AppResult<MovieDetails>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}
