use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use super::ApiError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct LinkPlatformRequest {
    pub anime_id: Option<i64>,
    pub platform_id: Option<i32>,
    pub url: Option<String>,
}

/// GET /api/platforms
pub async fn list_platforms(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let platforms = state.store.list_platforms().await?;
    Ok(Json(json!({ "platforms": platforms })))
}

/// GET /api/platforms/anime/{animeId}
pub async fn platforms_for_anime(
    State(state): State<Arc<AppState>>,
    Path(anime_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let platforms = state.store.platforms_for_anime(anime_id).await?;
    Ok(Json(json!({ "platforms": platforms })))
}

/// POST /api/platforms/anime
/// Upsert on (anime_id, platform_id); a repeated link replaces the url.
pub async fn link_anime_platform(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LinkPlatformRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (Some(anime_id), Some(platform_id)) = (payload.anime_id, payload.platform_id) else {
        return Err(ApiError::validation("anime_id and platform_id are required"));
    };

    let link = state
        .store
        .upsert_platform_link(anime_id, platform_id, payload.url)
        .await?
        .ok_or_else(|| ApiError::not_found("Platform not found"))?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Platform linked", "anime_platform": link })),
    ))
}
