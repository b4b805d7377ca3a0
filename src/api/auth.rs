use axum::{
    Json,
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, StatusCode, header, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::ApiError;
use crate::db::UserProfile;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserProfile,
}

// ============================================================================
// Middleware
// ============================================================================

/// The authenticated caller's user id, inserted as a request extension by
/// `auth_middleware` and consumed by handlers via the extractor below.
#[derive(Clone, Copy, Debug)]
pub struct AuthUser(pub i32);

fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<i32, ApiError> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "));

    let Some(token) = bearer else {
        return Err(ApiError::unauthorized("No token provided"));
    };

    // Fails closed: an unexpected verification error is reported the same
    // way as a bad token, with the detail kept in the logs.
    match state.tokens.verify(token.trim()) {
        Ok(Some(user_id)) => Ok(user_id),
        Ok(None) => Err(ApiError::unauthorized("Invalid token")),
        Err(err) => {
            tracing::error!("Token verification failed: {err}");
            Err(ApiError::unauthorized("Authentication failed"))
        }
    }
}

/// Guards fully-protected routers (tracker, profile).
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user_id = authenticate(&state, request.headers())?;
    request.extensions_mut().insert(AuthUser(user_id));
    Ok(next.run(request).await)
}

/// Extractor form, for routers that mix public and authenticated routes.
/// Uses the middleware-inserted extension when present, otherwise checks
/// the bearer header itself.
impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthUser>() {
            return Ok(*user);
        }
        authenticate(state, &parts.headers).map(AuthUser)
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/auth/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let username = payload.username.unwrap_or_default();
    let email = payload.email.unwrap_or_default();
    let password = payload.password.unwrap_or_default();

    if username.trim().is_empty() || email.trim().is_empty() || password.is_empty() {
        return Err(ApiError::validation(
            "Username, email and password are required",
        ));
    }
    if password.len() < 6 {
        return Err(ApiError::validation(
            "Password must be at least 6 characters",
        ));
    }

    let user = state
        .store
        .create_user(username.trim(), email.trim(), &password)
        .await?
        .ok_or_else(|| ApiError::Conflict("Username or email already exists".to_string()))?;

    let token = state
        .tokens
        .issue(user.id)
        .map_err(|e| ApiError::InternalError(format!("Failed to issue token: {e}")))?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            user: UserProfile::from(user),
        }),
    ))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let email = payload.email.unwrap_or_default();
    let password = payload.password.unwrap_or_default();

    if email.trim().is_empty() || password.is_empty() {
        return Err(ApiError::validation("Email and password are required"));
    }

    // Unknown email and wrong password are indistinguishable to callers
    let user = state
        .store
        .get_user_by_email(email.trim())
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid email or password"))?;

    let is_valid =
        crate::db::repositories::user::verify_password(&password, &user.password_hash).await?;
    if !is_valid {
        return Err(ApiError::unauthorized("Invalid email or password"));
    }

    let token = state
        .tokens
        .issue(user.id)
        .map_err(|e| ApiError::InternalError(format!("Failed to issue token: {e}")))?;

    Ok(Json(AuthResponse {
        token,
        user: UserProfile::from(user),
    }))
}
