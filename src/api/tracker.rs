use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Deserializer};
use serde_json::json;
use std::sync::Arc;

use super::ApiError;
use super::auth::AuthUser;
use crate::db::TrackerPatch;
use crate::models::WatchStatus;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct TrackerQuery {
    pub status: Option<String>,
}

#[derive(Deserialize)]
pub struct AddTrackerRequest {
    pub anime_id: Option<i64>,
    pub status: Option<String>,
    pub progress: Option<serde_json::Value>,
    pub rating: Option<i32>,
    pub notes: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateTrackerRequest {
    pub status: Option<String>,
    pub progress: Option<serde_json::Value>,
    /// Absent keeps the stored rating; an explicit null clears it
    #[serde(default, deserialize_with = "double_option")]
    pub rating: Option<Option<i32>>,
    pub notes: Option<String>,
}

fn double_option<'de, D>(deserializer: D) -> Result<Option<Option<i32>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<i32>::deserialize(deserializer).map(Some)
}

/// Clients send progress as number or string; anything non-numeric
/// becomes 0.
fn coerce_progress(value: &serde_json::Value) -> i32 {
    match value {
        serde_json::Value::Number(n) => n.as_i64().unwrap_or(0).try_into().unwrap_or(0),
        serde_json::Value::String(s) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

fn validate_status(status: &str) -> Result<(), ApiError> {
    if WatchStatus::parse(status).is_none() {
        return Err(ApiError::validation("Invalid status"));
    }
    Ok(())
}

fn validate_rating(rating: i32) -> Result<(), ApiError> {
    if !(1..=10).contains(&rating) {
        return Err(ApiError::validation("Rating must be between 1 and 10"));
    }
    Ok(())
}

/// GET /api/tracker
pub async fn list_tracker(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Query(query): Query<TrackerQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let entries = state
        .store
        .list_tracker(user_id, query.status.as_deref())
        .await?;

    Ok(Json(json!({ "tracker": entries })))
}

/// POST /api/tracker
/// Upserts the caller's entry for one anime: 201 when created, 200 when
/// an existing entry was updated.
pub async fn add_to_tracker(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Json(payload): Json<AddTrackerRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let Some(anime_id) = payload.anime_id else {
        return Err(ApiError::validation("anime_id and status are required"));
    };
    let Some(status) = payload.status.as_deref().filter(|s| !s.is_empty()) else {
        return Err(ApiError::validation("anime_id and status are required"));
    };
    validate_status(status)?;
    if let Some(rating) = payload.rating {
        validate_rating(rating)?;
    }

    let progress = payload.progress.as_ref().map(coerce_progress);

    let (entry, created) = state
        .store
        .upsert_tracker(
            user_id,
            anime_id,
            status,
            progress,
            payload.rating,
            payload.notes,
        )
        .await?;

    let (code, message) = if created {
        (StatusCode::CREATED, "Anime added to tracker")
    } else {
        (StatusCode::OK, "Tracker entry updated")
    };

    Ok((code, Json(json!({ "message": message, "tracker": entry }))))
}

/// PUT /api/tracker/{id}
pub async fn update_tracker(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateTrackerRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(status) = payload.status.as_deref() {
        validate_status(status)?;
    }
    if let Some(Some(rating)) = payload.rating {
        validate_rating(rating)?;
    }

    let patch = TrackerPatch {
        status: payload.status,
        progress: payload.progress.as_ref().map(coerce_progress),
        rating: payload.rating,
        notes: payload.notes,
    };

    if patch.is_empty() {
        return Err(ApiError::validation("No fields to update"));
    }

    // Matched on id AND owner: not-found and not-owned look identical
    let entry = state
        .store
        .update_tracker(user_id, id, patch)
        .await?
        .ok_or_else(|| ApiError::not_found("Tracker entry not found"))?;

    Ok(Json(
        json!({ "message": "Tracker entry updated", "tracker": entry }),
    ))
}

/// DELETE /api/tracker/{id}
pub async fn delete_tracker(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let deleted = state.store.delete_tracker(user_id, id).await?;
    if !deleted {
        return Err(ApiError::not_found("Tracker entry not found"));
    }

    Ok(Json(json!({ "message": "Anime removed from tracker" })))
}
