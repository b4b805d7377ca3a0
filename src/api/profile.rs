use axum::{Extension, Json, extract::State, response::IntoResponse};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use super::ApiError;
use super::auth::AuthUser;
use crate::db::{ProfilePatch, UserProfile, repositories::user::verify_password};
use crate::models::TrackerStats;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct UpdateProfileRequest {
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub favorite_genres: Option<serde_json::Value>,
    pub location: Option<String>,
    pub website: Option<String>,
    pub birth_date: Option<String>,
    pub password: Option<String>,
    pub current_password: Option<String>,
}

/// GET /api/profile
pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .store
        .get_user_by_id(user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    let rows = state.store.tracker_stats_rows(user_id).await?;
    let stats = TrackerStats::from_rows(&rows);

    Ok(Json(
        json!({ "user": UserProfile::from(user), "stats": stats }),
    ))
}

/// PUT /api/profile
/// Patch-style update: only supplied fields are written. Changing the
/// password additionally requires the current one.
pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let favorite_genres = match payload.favorite_genres {
        Some(value) => Some(
            serde_json::from_value::<Vec<String>>(value)
                .map_err(|_| ApiError::validation("favorite_genres must be an array"))?,
        ),
        None => None,
    };

    if let Some(password) = payload.password.as_deref() {
        let Some(current) = payload.current_password.as_deref() else {
            return Err(ApiError::validation(
                "Current password is required to change password",
            ));
        };

        let user = state
            .store
            .get_user_by_id(user_id)
            .await?
            .ok_or_else(|| ApiError::not_found("User not found"))?;

        if !verify_password(current, &user.password_hash).await? {
            return Err(ApiError::unauthorized("Current password is incorrect"));
        }
        if password.len() < 6 {
            return Err(ApiError::validation(
                "Password must be at least 6 characters",
            ));
        }
    }

    let patch = ProfilePatch {
        display_name: payload.display_name,
        bio: payload.bio,
        avatar_url: payload.avatar_url,
        favorite_genres,
        location: payload.location,
        website: payload.website,
        birth_date: payload.birth_date,
        password: payload.password,
    };

    if patch.is_empty() {
        return Err(ApiError::validation("No fields to update"));
    }

    let user = state
        .store
        .update_user_profile(user_id, patch)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(Json(json!({
        "message": "Profile updated successfully",
        "profile": UserProfile::from(user),
    })))
}
