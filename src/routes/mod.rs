use axum::{
    http::StatusCode,
    middleware,
    routing::{get, post, put},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::request_id::{make_span_with_request_id, request_id_middleware};

pub mod movies;
pub mod preferences;
pub mod sessions;
pub mod state;
pub mod watchlist;

pub use state::AppState;

/// Creates the application router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_routes())
        .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// API routes under /api/v1
fn api_routes() -> Router<AppState> {
    Router::new()
        // Movie metadata
        .route("/movies/search", get(movies::search))
        .route("/movies/:id", get(movies::details))
        // Debounced search sessions
        .route("/sessions", post(sessions::create))
        .route("/sessions/:id", get(sessions::get).delete(sessions::delete))
        .route("/sessions/:id/query", put(sessions::set_query))
        .route("/sessions/:id/details", axum::routing::delete(sessions::close_details))
        .route("/sessions/:id/details/:movie_id", post(sessions::open_details))
        // Watchlist
        .route(
            "/watchlist",
            get(watchlist::list)
                .post(watchlist::add)
                .delete(watchlist::clear),
        )
        .route(
            "/watchlist/:id",
            get(watchlist::contains).delete(watchlist::remove),
        )
        // Preferences
        .route(
            "/preferences/theme",
            get(preferences::get_theme).put(preferences::set_theme),
        )
        .route("/preferences/theme/toggle", post(preferences::toggle_theme))
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}
