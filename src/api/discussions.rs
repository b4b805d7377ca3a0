use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use super::ApiError;
use super::auth::AuthUser;
use crate::db::{DiscussionPatch, ModifyOutcome};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct DiscussionListQuery {
    pub category: Option<String>,
    pub sort: Option<String>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

#[derive(Deserialize)]
pub struct CreateDiscussionRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub category: Option<String>,
    pub anime_id: Option<i64>,
    pub image_url: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateDiscussionRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub category: Option<String>,
}

#[derive(Deserialize)]
pub struct AddCommentRequest {
    pub content: Option<String>,
}

/// GET /api/discussions (public)
pub async fn list_discussions(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DiscussionListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let category = query
        .category
        .as_deref()
        .filter(|c| !c.is_empty() && *c != "all");
    let sort = query.sort.as_deref().unwrap_or("latest");
    let limit = query.limit.unwrap_or(20);
    let offset = query.offset.unwrap_or(0);

    let (discussions, total) = state
        .store
        .list_discussions(category, sort, limit, offset)
        .await?;

    Ok(Json(json!({ "discussions": discussions, "total": total })))
}

/// GET /api/discussions/{id} (public)
pub async fn get_discussion(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let discussion = state
        .store
        .get_discussion(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Discussion not found"))?;

    Ok(Json(discussion))
}

/// POST /api/discussions (auth)
pub async fn create_discussion(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<CreateDiscussionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let title = payload.title.as_deref().map(str::trim).unwrap_or_default();
    let content = payload
        .content
        .as_deref()
        .map(str::trim)
        .unwrap_or_default();

    if title.is_empty() || content.is_empty() {
        return Err(ApiError::validation("Title and content are required"));
    }

    let category = payload
        .category
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .unwrap_or("general");

    let created = state
        .store
        .create_discussion(
            user_id,
            title,
            content,
            category,
            payload.anime_id,
            payload.image_url,
        )
        .await?;

    // Reload through the join so the response carries the author summary
    let discussion = state
        .store
        .get_discussion(created.id)
        .await?
        .ok_or_else(|| ApiError::InternalError("Created discussion vanished".to_string()))?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Discussion created", "discussion": discussion })),
    ))
}

/// PUT /api/discussions/{id} (auth, author only)
pub async fn update_discussion(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateDiscussionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let patch = DiscussionPatch {
        title: payload.title,
        content: payload.content,
        category: payload.category,
    };

    match state.store.update_discussion(id, user_id, patch).await? {
        ModifyOutcome::NotFound => Err(ApiError::not_found("Discussion not found")),
        ModifyOutcome::Forbidden => Err(ApiError::Forbidden(
            "Not authorized to edit this discussion".to_string(),
        )),
        ModifyOutcome::Done(updated) => {
            let discussion = state
                .store
                .get_discussion(updated.id)
                .await?
                .ok_or_else(|| ApiError::InternalError("Updated discussion vanished".to_string()))?;

            Ok(Json(
                json!({ "message": "Discussion updated", "discussion": discussion }),
            ))
        }
    }
}

/// DELETE /api/discussions/{id} (auth, author only)
pub async fn delete_discussion(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    match state.store.delete_discussion(id, user_id).await? {
        ModifyOutcome::NotFound => Err(ApiError::not_found("Discussion not found")),
        ModifyOutcome::Forbidden => Err(ApiError::Forbidden(
            "Not authorized to delete this discussion".to_string(),
        )),
        ModifyOutcome::Done(()) => Ok(Json(json!({ "message": "Discussion deleted" }))),
    }
}

/// POST /api/discussions/{id}/like (auth)
/// Strict toggle: liking twice unlikes.
pub async fn toggle_like(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let liked = state
        .store
        .toggle_discussion_like(id, user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Discussion not found"))?;

    let message = if liked {
        "Discussion liked"
    } else {
        "Discussion unliked"
    };

    Ok(Json(json!({ "message": message, "liked": liked })))
}

/// GET /api/discussions/{id}/comments (public)
pub async fn list_comments(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let comments = state.store.list_discussion_comments(id).await?;
    Ok(Json(json!({ "comments": comments })))
}

/// POST /api/discussions/{id}/comments (auth)
pub async fn add_comment(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<i32>,
    Json(payload): Json<AddCommentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let content = payload
        .content
        .as_deref()
        .map(str::trim)
        .unwrap_or_default();
    if content.is_empty() {
        return Err(ApiError::validation("Comment content is required"));
    }

    let comment = state
        .store
        .add_discussion_comment(id, user_id, content)
        .await?
        .ok_or_else(|| ApiError::not_found("Discussion not found"))?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Comment added", "comment": comment })),
    ))
}
