use axum::{
    Json, Router,
    http::{HeaderValue, Method, StatusCode, header},
    middleware,
    response::IntoResponse,
    routing::{delete, get, post, put},
};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod anime;
pub mod auth;
pub mod discussions;
pub mod error;
pub mod platforms;
pub mod profile;
pub mod tracker;

pub use error::ApiError;

use crate::state::AppState;

/// GET /health
async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok", "message": "AniParadise API is running" }))
}

async fn route_not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "Route not found" })),
    )
}

/// CORS restricted to the single configured frontend origin, with
/// credentials allowed.
fn build_cors_layer(frontend_url: &str) -> CorsLayer {
    let origin = frontend_url
        .parse::<HeaderValue>()
        .unwrap_or_else(|_| HeaderValue::from_static("http://localhost:5173"));

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}

pub fn router(state: Arc<AppState>) -> Router {
    // Tracker and profile require auth on every route; discussions and
    // platforms mix public reads with authenticated writes, handled by
    // the AuthUser extractor per handler.
    let protected_routes = Router::new()
        .route("/tracker", get(tracker::list_tracker))
        .route("/tracker", post(tracker::add_to_tracker))
        .route("/tracker/{id}", put(tracker::update_tracker))
        .route("/tracker/{id}", delete(tracker::delete_tracker))
        .route("/profile", get(profile::get_profile))
        .route("/profile", put(profile::update_profile))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::auth_middleware,
        ));

    let api_router = Router::new()
        .merge(protected_routes)
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/anime", get(anime::list_anime))
        .route("/anime/{id}", get(anime::get_anime))
        .route("/discussions", get(discussions::list_discussions))
        .route("/discussions", post(discussions::create_discussion))
        .route("/discussions/{id}", get(discussions::get_discussion))
        .route("/discussions/{id}", put(discussions::update_discussion))
        .route("/discussions/{id}", delete(discussions::delete_discussion))
        .route("/discussions/{id}/like", post(discussions::toggle_like))
        .route(
            "/discussions/{id}/comments",
            get(discussions::list_comments),
        )
        .route("/discussions/{id}/comments", post(discussions::add_comment))
        .route("/platforms", get(platforms::list_platforms))
        .route(
            "/platforms/anime/{anime_id}",
            get(platforms::platforms_for_anime),
        )
        .route("/platforms/anime", post(platforms::link_anime_platform));

    let cors_layer = build_cors_layer(&state.config.server.frontend_url);

    Router::new()
        .route("/health", get(health))
        .nest("/api", api_router)
        .fallback(route_not_found)
        .layer(cors_layer)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
