use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    middleware::request_id::RequestId,
    models::MovieDetails,
    routes::AppState,
    services::search_session::SessionSnapshot,
};

#[derive(Debug, Deserialize)]
pub struct SetQueryRequest {
    pub query: String,
}

/// Opens a new search session
pub async fn create(State(state): State<AppState>) -> (StatusCode, Json<SessionSnapshot>) {
    let session = state.sessions.create().await;
    (StatusCode::CREATED, Json(session.snapshot().await))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<SessionSnapshot>> {
    let session = state.sessions.get(id).await?;
    Ok(Json(session.snapshot().await))
}

/// Feeds the session's search box; the search itself runs after the quiet period
pub async fn set_query(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(id): Path<Uuid>,
    Json(request): Json<SetQueryRequest>,
) -> AppResult<StatusCode> {
    let session = state.sessions.get(id).await?;

    tracing::debug!(
        request_id = %request_id,
        session_id = %id,
        query = %request.query,
        "Query updated"
    );

    session.set_query(request.query).await;
    Ok(StatusCode::ACCEPTED)
}

/// Opens the details view, falling back to a placeholder for known titles
pub async fn open_details(
    State(state): State<AppState>,
    Path((id, movie_id)): Path<(Uuid, String)>,
) -> AppResult<Json<MovieDetails>> {
    let session = state.sessions.get(id).await?;
    let fallback = state.watchlist.get(&movie_id).await;
    let details = session.open_details(&movie_id, fallback).await?;
    Ok(Json(details))
}

pub async fn close_details(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<SessionSnapshot>> {
    let session = state.sessions.get(id).await?;
    session.close_details().await;
    Ok(Json(session.snapshot().await))
}

/// Tears the session down, cancelling any pending debounced search
pub async fn delete(State(state): State<AppState>, Path(id): Path<Uuid>) -> AppResult<StatusCode> {
    if state.sessions.remove(id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("Search session {}", id)))
    }
}
