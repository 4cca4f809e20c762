use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;

use crate::{
    error::{AppError, AppResult},
    models::Movie,
    routes::AppState,
};

#[derive(Debug, Serialize)]
pub struct MembershipResponse {
    #[serde(rename = "imdbID")]
    pub imdb_id: String,
    pub in_watchlist: bool,
}

pub async fn list(State(state): State<AppState>) -> Json<Vec<Movie>> {
    Json(state.watchlist.snapshot().await)
}

/// Adds a title; 201 when it was new, 200 when it was already saved
pub async fn add(
    State(state): State<AppState>,
    Json(movie): Json<Movie>,
) -> AppResult<(StatusCode, Json<Vec<Movie>>)> {
    if movie.imdb_id.trim().is_empty() {
        return Err(AppError::InvalidInput("imdbID is required".to_string()));
    }

    let status = if state.watchlist.add(movie).await {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };

    Ok((status, Json(state.watchlist.snapshot().await)))
}

/// Removes a title; removing an absent title is not an error
pub async fn remove(State(state): State<AppState>, Path(imdb_id): Path<String>) -> Json<Vec<Movie>> {
    state.watchlist.remove(&imdb_id).await;
    Json(state.watchlist.snapshot().await)
}

pub async fn clear(State(state): State<AppState>) -> Json<Vec<Movie>> {
    state.watchlist.clear().await;
    Json(state.watchlist.snapshot().await)
}

/// Membership check the UI uses to disable redundant "add" buttons
pub async fn contains(
    State(state): State<AppState>,
    Path(imdb_id): Path<String>,
) -> Json<MembershipResponse> {
    let in_watchlist = state.watchlist.contains(&imdb_id).await;
    Json(MembershipResponse {
        imdb_id,
        in_watchlist,
    })
}
