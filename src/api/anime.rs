use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

use super::ApiError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct AnimeQuery {
    pub q: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// GET /api/anime
/// With `q` searches Jikan, without it returns the top list. The provider
/// body is passed through untouched.
pub async fn list_anime(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AnimeQuery>,
) -> Result<Json<Value>, ApiError> {
    let page = query.page.unwrap_or(1);
    let limit = query.limit.unwrap_or(20);

    let result = match query.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        Some(q) => state.jikan.search(q, page, limit).await,
        None => state.jikan.top(page, limit).await,
    };

    let body = result.map_err(|e| ApiError::jikan_error(e.to_string()))?;
    Ok(Json(body))
}

/// GET /api/anime/{id}
pub async fn get_anime(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let body = state
        .jikan
        .get_full(id)
        .await
        .map_err(|e| ApiError::jikan_error(e.to_string()))?
        .ok_or_else(|| ApiError::not_found("Anime not found"))?;

    Ok(Json(body))
}
