use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::Deserialize;

use crate::{
    error::AppResult,
    middleware::request_id::RequestId,
    models::{Movie, MovieDetails},
    routes::AppState,
};

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    q: String,
}

/// Handler for one-shot (non-debounced) movie search
pub async fn search(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Query(params): Query<SearchQuery>,
) -> AppResult<Json<Vec<Movie>>> {
    tracing::info!(
        request_id = %request_id,
        query = %params.q,
        "Processing search request"
    );

    let movies = state.provider.search_movies(&params.q).await?;
    Ok(Json(movies))
}

/// Handler for movie details; lookup failures propagate to the caller
pub async fn details(
    State(state): State<AppState>,
    Path(imdb_id): Path<String>,
) -> AppResult<Json<MovieDetails>> {
    let details = state.provider.fetch_details(&imdb_id).await?;
    Ok(Json(details))
}
