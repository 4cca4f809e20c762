use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::{models::Theme, routes::AppState};

#[derive(Debug, Deserialize)]
pub struct SetThemeRequest {
    pub theme: Theme,
}

#[derive(Debug, Serialize)]
pub struct ThemeResponse {
    pub theme: Theme,
    pub dark_mode: bool,
}

impl From<Theme> for ThemeResponse {
    fn from(theme: Theme) -> Self {
        Self {
            theme,
            dark_mode: theme.is_dark(),
        }
    }
}

pub async fn get_theme(State(state): State<AppState>) -> Json<ThemeResponse> {
    Json(state.preferences.theme().await.into())
}

pub async fn set_theme(
    State(state): State<AppState>,
    Json(request): Json<SetThemeRequest>,
) -> Json<ThemeResponse> {
    Json(state.preferences.set_theme(request.theme).await.into())
}

pub async fn toggle_theme(State(state): State<AppState>) -> Json<ThemeResponse> {
    Json(state.preferences.toggle_theme().await.into())
}
