/// OMDb API provider
///
/// Both operations hit the same endpoint and differ only in query parameters:
/// 1. Search: `?apikey=..&s=<query>&page=1` → `{"Search": [...], "Response": "True"}`
/// 2. Details: `?apikey=..&i=<imdb id>&plot=full` → title fields at the top level
///
/// Every response carries a `Response` flag; `"False"` comes with an `Error`
/// message such as `"Movie not found!"`.
use crate::{
    error::{AppError, AppResult},
    models::{Movie, MovieDetails, OmdbSearchResponse, OmdbStatus},
    services::providers::MovieProvider,
};
use reqwest::Client as HttpClient;
use serde_json::Value;

const DETAILS_FALLBACK_ERROR: &str = "Failed to fetch movie details";

#[derive(Clone)]
pub struct OmdbProvider {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    result_limit: usize,
}

impl OmdbProvider {
    pub fn new(api_key: String, api_url: String, result_limit: usize) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key,
            api_url,
            result_limit,
        }
    }

    /// Issues a GET against the API and returns the decoded JSON body
    async fn get_json(&self, params: &[(&str, &str)]) -> AppResult<Value> {
        let response = self
            .http_client
            .get(&self.api_url)
            .query(&[("apikey", self.api_key.as_str())])
            .query(params)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "OMDb API returned status {}: {}",
                status, body
            )));
        }

        Ok(response.json().await?)
    }

    /// Converts a search body into at most `result_limit` movies
    fn parse_search(&self, query: &str, body: Value) -> AppResult<Vec<Movie>> {
        let response: OmdbSearchResponse = serde_json::from_value(body).map_err(|e| {
            AppError::ExternalApi(format!("Failed to parse OMDb search response: {}", e))
        })?;

        if !response.status.is_success() {
            tracing::debug!(
                query = %query,
                error = response.status.error.as_deref().unwrap_or("unknown"),
                provider = "omdb",
                "Search returned no results"
            );
            return Ok(Vec::new());
        }

        let mut movies = response.search.unwrap_or_default();
        movies.truncate(self.result_limit);
        Ok(movies)
    }

    fn parse_details(body: Value) -> AppResult<MovieDetails> {
        let status: OmdbStatus = serde_json::from_value(body.clone()).map_err(|e| {
            AppError::ExternalApi(format!("Failed to parse OMDb details response: {}", e))
        })?;

        if !status.is_success() {
            return Err(AppError::ExternalApi(
                status
                    .error
                    .unwrap_or_else(|| DETAILS_FALLBACK_ERROR.to_string()),
            ));
        }

        serde_json::from_value(body).map_err(|e| {
            AppError::ExternalApi(format!("Failed to parse OMDb details response: {}", e))
        })
    }
}

#[async_trait::async_trait]
impl MovieProvider for OmdbProvider {
    async fn search_movies(&self, query: &str) -> AppResult<Vec<Movie>> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }

        let body = self.get_json(&[("s", query), ("page", "1")]).await?;
        let movies = self.parse_search(query, body)?;

        tracing::info!(
            query = %query,
            results = movies.len(),
            provider = "omdb",
            "Movie search completed"
        );

        Ok(movies)
    }

    async fn fetch_details(&self, imdb_id: &str) -> AppResult<MovieDetails> {
        if imdb_id.trim().is_empty() {
            return Err(AppError::InvalidInput("IMDb ID is required".to_string()));
        }

        let body = self.get_json(&[("i", imdb_id), ("plot", "full")]).await?;
        let details = Self::parse_details(body).map_err(|e| {
            tracing::warn!(imdb_id = %imdb_id, error = %e, provider = "omdb", "Details fetch failed");
            e
        })?;

        tracing::info!(
            imdb_id = %imdb_id,
            title = %details.movie.title,
            provider = "omdb",
            "Movie details fetched"
        );

        Ok(details)
    }

    fn name(&self) -> &'static str {
        "omdb"
    }
}
