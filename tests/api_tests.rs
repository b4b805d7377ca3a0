use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

use aniparadise::config::Config;
use aniparadise::state::AppState;

async fn spawn_app() -> Router {
    let mut config = Config::default();
    config.database.url = Some("sqlite::memory:".to_string());

    let state = AppState::new(config)
        .await
        .expect("Failed to create app state");
    aniparadise::api::router(Arc::new(state))
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }

    let request = if let Some(body) = body {
        builder
            .header("Content-Type", mime::APPLICATION_JSON.as_ref())
            .body(Body::from(body.to_string()))
            .unwrap()
    } else {
        builder.body(Body::empty()).unwrap()
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    (status, value)
}

async fn register(app: &Router, username: &str, email: &str) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({ "username": username, "email": email, "password": "password123" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health() {
    let app = spawn_app().await;

    let (status, body) = send(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["message"], "AniParadise API is running");
}

#[tokio::test]
async fn test_unknown_route() {
    let app = spawn_app().await;

    let (status, body) = send(&app, "GET", "/api/nope", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Route not found");
}

#[tokio::test]
async fn test_register_login_round_trip() {
    let app = spawn_app().await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({ "username": "rin", "email": "rin@example.com", "password": "password123" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let token = body["token"].as_str().unwrap().to_string();
    assert_eq!(body["user"]["username"], "rin");
    assert_eq!(body["user"]["email"], "rin@example.com");
    assert!(body["user"].get("password_hash").is_none());

    // The issued token is accepted by the auth middleware
    let (status, _) = send(&app, "GET", "/api/tracker", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    // Duplicate username or email
    let (status, body) = send(
        &app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({ "username": "rin", "email": "other@example.com", "password": "password123" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Username or email already exists");

    let (status, body) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": "rin@example.com", "password": "password123" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["token"].is_string());

    // Wrong password and unknown email are indistinguishable
    let (status, body) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": "rin@example.com", "password": "wrong-password" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid email or password");

    let (status, body) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": "nobody@example.com", "password": "password123" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid email or password");
}

#[tokio::test]
async fn test_register_validation() {
    let app = spawn_app().await;

    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({ "username": "rin", "password": "password123" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({ "username": "rin", "email": "rin@example.com", "password": "short" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Password must be at least 6 characters");
}

#[tokio::test]
async fn test_auth_middleware_messages() {
    let app = spawn_app().await;

    let (status, body) = send(&app, "GET", "/api/tracker", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "No token provided");

    let (status, body) = send(&app, "GET", "/api/tracker", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid token");

    // Extractor-guarded routes report the same way
    let (status, body) = send(
        &app,
        "POST",
        "/api/discussions",
        None,
        Some(json!({ "title": "t", "content": "c" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "No token provided");
}

#[tokio::test]
async fn test_tracker_upsert_cardinality() {
    let app = spawn_app().await;
    let token = register(&app, "aki", "aki@example.com").await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/tracker",
        Some(&token),
        Some(json!({ "anime_id": 5114, "status": "watching", "rating": 8 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["tracker"]["status"], "watching");
    assert_eq!(body["tracker"]["rating"], 8);
    assert_eq!(body["tracker"]["progress"], 0);

    // Same anime again updates in place; absent rating keeps the old one
    let (status, body) = send(
        &app,
        "POST",
        "/api/tracker",
        Some(&token),
        Some(json!({ "anime_id": 5114, "status": "completed", "progress": 64 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tracker"]["status"], "completed");
    assert_eq!(body["tracker"]["progress"], 64);
    assert_eq!(body["tracker"]["rating"], 8);

    let (status, body) = send(&app, "GET", "/api/tracker", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tracker"].as_array().unwrap().len(), 1);

    let (status, body) = send(
        &app,
        "POST",
        "/api/tracker",
        Some(&token),
        Some(json!({ "anime_id": 1, "status": "rewatching" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid status");

    let (status, _) = send(
        &app,
        "POST",
        "/api/tracker",
        Some(&token),
        Some(json!({ "status": "watching" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_tracker_update_owner_scoped() {
    let app = spawn_app().await;
    let owner = register(&app, "owner", "owner@example.com").await;
    let other = register(&app, "other", "other@example.com").await;

    let (_, body) = send(
        &app,
        "POST",
        "/api/tracker",
        Some(&owner),
        Some(json!({ "anime_id": 20, "status": "watching", "rating": 7 })),
    )
    .await;
    let id = body["tracker"]["id"].as_i64().unwrap();

    // Someone else's row looks like a missing row
    let (status, _) = send(
        &app,
        "PUT",
        &format!("/api/tracker/{id}"),
        Some(&other),
        Some(json!({ "status": "dropped" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/tracker/{id}"),
        Some(&owner),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No fields to update");

    // Explicit null clears the rating; string progress coerces
    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/tracker/{id}"),
        Some(&owner),
        Some(json!({ "rating": null, "progress": "not-a-number" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["tracker"]["rating"].is_null());
    assert_eq!(body["tracker"]["progress"], 0);

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/tracker/{id}"),
        Some(&owner),
        Some(json!({ "status": "on-hold", "notes": "waiting for s2" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tracker"]["status"], "on-hold");
    assert_eq!(body["tracker"]["notes"], "waiting for s2");
}

#[tokio::test]
async fn test_tracker_delete() {
    let app = spawn_app().await;
    let token = register(&app, "del", "del@example.com").await;

    let (_, body) = send(
        &app,
        "POST",
        "/api/tracker",
        Some(&token),
        Some(json!({ "anime_id": 30, "status": "plan-to-watch" })),
    )
    .await;
    let id = body["tracker"]["id"].as_i64().unwrap();

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/api/tracker/{id}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/api/tracker/{id}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_profile_stats() {
    let app = spawn_app().await;
    let token = register(&app, "stats", "stats@example.com").await;

    let (status, body) = send(&app, "GET", "/api/profile", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["stats"]["total_anime"], 0);
    assert_eq!(body["stats"]["mean_score"], "0.0");

    for (anime_id, status_str, rating) in [
        (1, "watching", Some(8)),
        (2, "completed", Some(9)),
        (3, "completed", None),
        (4, "plan-to-watch", None),
    ] {
        let mut payload = json!({ "anime_id": anime_id, "status": status_str });
        if let Some(rating) = rating {
            payload["rating"] = json!(rating);
        }
        let (status, _) = send(&app, "POST", "/api/tracker", Some(&token), Some(payload)).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = send(&app, "GET", "/api/profile", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["username"], "stats");
    assert_eq!(body["stats"]["total_anime"], 4);
    assert_eq!(body["stats"]["watching"], 1);
    assert_eq!(body["stats"]["completed"], 2);
    assert_eq!(body["stats"]["plan_to_watch"], 1);
    assert_eq!(body["stats"]["mean_score"], "8.5");
}

#[tokio::test]
async fn test_profile_patch() {
    let app = spawn_app().await;
    let token = register(&app, "patch", "patch@example.com").await;

    let (status, body) = send(
        &app,
        "PUT",
        "/api/profile",
        Some(&token),
        Some(json!({ "display_name": "Patch", "bio": "hello" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["profile"]["display_name"], "Patch");
    assert_eq!(body["profile"]["bio"], "hello");

    // Patching one field leaves the others alone
    let (status, body) = send(
        &app,
        "PUT",
        "/api/profile",
        Some(&token),
        Some(json!({ "display_name": "Patched" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["profile"]["display_name"], "Patched");
    assert_eq!(body["profile"]["bio"], "hello");

    let (status, body) = send(
        &app,
        "PUT",
        "/api/profile",
        Some(&token),
        Some(json!({ "favorite_genres": "not-an-array" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "favorite_genres must be an array");

    let (status, body) = send(
        &app,
        "PUT",
        "/api/profile",
        Some(&token),
        Some(json!({ "favorite_genres": ["action", "drama"] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["profile"]["favorite_genres"], json!(["action", "drama"]));

    let (status, body) = send(&app, "PUT", "/api/profile", Some(&token), Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No fields to update");
}

#[tokio::test]
async fn test_profile_password_change() {
    let app = spawn_app().await;
    let token = register(&app, "pw", "pw@example.com").await;

    let (status, _) = send(
        &app,
        "PUT",
        "/api/profile",
        Some(&token),
        Some(json!({ "password": "newpassword" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        "PUT",
        "/api/profile",
        Some(&token),
        Some(json!({ "password": "newpassword", "current_password": "wrong" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Current password is incorrect");

    let (status, _) = send(
        &app,
        "PUT",
        "/api/profile",
        Some(&token),
        Some(json!({ "password": "tiny", "current_password": "password123" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        "PUT",
        "/api/profile",
        Some(&token),
        Some(json!({ "password": "newpassword", "current_password": "password123" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": "pw@example.com", "password": "newpassword" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_discussions_crud_and_permissions() {
    let app = spawn_app().await;
    let author = register(&app, "author", "author@example.com").await;
    let other = register(&app, "lurker", "lurker@example.com").await;

    let (status, _) = send(
        &app,
        "POST",
        "/api/discussions",
        Some(&author),
        Some(json!({ "title": "  ", "content": "body" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        "POST",
        "/api/discussions",
        Some(&author),
        Some(json!({ "title": "Best OP of the season?", "content": "Discuss." })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["discussion"]["id"].as_i64().unwrap();
    assert_eq!(body["discussion"]["category"], "general");
    assert_eq!(body["discussion"]["author"]["username"], "author");

    let (status, body) = send(&app, "GET", "/api/discussions", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
    assert_eq!(body["discussions"].as_array().unwrap().len(), 1);

    let (status, body) = send(&app, "GET", &format!("/api/discussions/{id}"), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Best OP of the season?");

    // Existence is checked before ownership
    let (status, _) = send(
        &app,
        "PUT",
        "/api/discussions/9999",
        Some(&other),
        Some(json!({ "title": "x" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        "PUT",
        &format!("/api/discussions/{id}"),
        Some(&other),
        Some(json!({ "title": "hijacked" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/discussions/{id}"),
        Some(&author),
        Some(json!({ "title": "Best OP ever?" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["discussion"]["title"], "Best OP ever?");
    assert_eq!(body["discussion"]["content"], "Discuss.");

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/api/discussions/{id}"),
        Some(&other),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, "DELETE", "/api/discussions/9999", Some(&other), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/api/discussions/{id}"),
        Some(&author),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, "GET", &format!("/api/discussions/{id}"), None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_discussion_like_toggle() {
    let app = spawn_app().await;
    let token = register(&app, "liker", "liker@example.com").await;

    let (_, body) = send(
        &app,
        "POST",
        "/api/discussions",
        Some(&token),
        Some(json!({ "title": "t", "content": "c" })),
    )
    .await;
    let id = body["discussion"]["id"].as_i64().unwrap();

    let uri = format!("/api/discussions/{id}/like");
    let (status, body) = send(&app, "POST", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["liked"], true);

    let (status, body) = send(&app, "POST", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["liked"], false);

    let (status, body) = send(&app, "POST", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["liked"], true);

    let (_, body) = send(&app, "GET", &format!("/api/discussions/{id}"), None, None).await;
    assert_eq!(body["likes_count"], 1);

    let (status, _) = send(&app, "POST", "/api/discussions/9999/like", Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_discussion_comments() {
    let app = spawn_app().await;
    let token = register(&app, "commenter", "commenter@example.com").await;

    let (_, body) = send(
        &app,
        "POST",
        "/api/discussions",
        Some(&token),
        Some(json!({ "title": "t", "content": "c" })),
    )
    .await;
    let id = body["discussion"]["id"].as_i64().unwrap();
    let uri = format!("/api/discussions/{id}/comments");

    let (status, _) = send(
        &app,
        "POST",
        &uri,
        Some(&token),
        Some(json!({ "content": "   " })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        "POST",
        &uri,
        Some(&token),
        Some(json!({ "content": "first" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["comment"]["content"], "first");
    assert_eq!(body["comment"]["author"]["username"], "commenter");

    let (status, _) = send(
        &app,
        "POST",
        &uri,
        Some(&token),
        Some(json!({ "content": "second" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    // Oldest first
    let (status, body) = send(&app, "GET", &uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    let comments = body["comments"].as_array().unwrap();
    assert_eq!(comments.len(), 2);
    assert_eq!(comments[0]["content"], "first");
    assert_eq!(comments[1]["content"], "second");

    let (_, body) = send(&app, "GET", &format!("/api/discussions/{id}"), None, None).await;
    assert_eq!(body["comments_count"], 2);

    let (status, _) = send(
        &app,
        "POST",
        "/api/discussions/9999/comments",
        Some(&token),
        Some(json!({ "content": "lost" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_discussions_filter_and_hot_sort() {
    let app = spawn_app().await;
    let token = register(&app, "sorter", "sorter@example.com").await;

    let (_, body) = send(
        &app,
        "POST",
        "/api/discussions",
        Some(&token),
        Some(json!({ "title": "older", "content": "c", "category": "recommendations" })),
    )
    .await;
    let older_id = body["discussion"]["id"].as_i64().unwrap();

    let (_, _) = send(
        &app,
        "POST",
        "/api/discussions",
        Some(&token),
        Some(json!({ "title": "newer", "content": "c" })),
    )
    .await;

    // Latest puts the newer one first
    let (_, body) = send(&app, "GET", "/api/discussions", None, None).await;
    assert_eq!(body["discussions"][0]["title"], "newer");

    // A like flips the hot ordering
    send(
        &app,
        "POST",
        &format!("/api/discussions/{older_id}/like"),
        Some(&token),
        None,
    )
    .await;

    let (_, body) = send(&app, "GET", "/api/discussions?sort=hot", None, None).await;
    assert_eq!(body["discussions"][0]["title"], "older");

    let (_, body) = send(
        &app,
        "GET",
        "/api/discussions?category=recommendations",
        None,
        None,
    )
    .await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["discussions"][0]["title"], "older");

    // category=all is no filter
    let (_, body) = send(&app, "GET", "/api/discussions?category=all", None, None).await;
    assert_eq!(body["total"], 2);
}

#[tokio::test]
async fn test_platforms() {
    let app = spawn_app().await;

    let (status, body) = send(&app, "GET", "/api/platforms", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let platforms = body["platforms"].as_array().unwrap();
    assert_eq!(platforms.len(), 6);
    assert_eq!(platforms[0]["display_name"], "Amazon Prime Video");

    let (status, body) = send(&app, "GET", "/api/platforms/anime/5114", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["platforms"].as_array().unwrap().is_empty());

    let (status, _) = send(
        &app,
        "POST",
        "/api/platforms/anime",
        None,
        Some(json!({ "anime_id": 5114 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        "POST",
        "/api/platforms/anime",
        None,
        Some(json!({ "anime_id": 5114, "platform_id": 9999 })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Seed order makes Crunchyroll id 1
    let platform_id = 1;

    let (status, body) = send(
        &app,
        "POST",
        "/api/platforms/anime",
        None,
        Some(json!({
            "anime_id": 5114,
            "platform_id": platform_id,
            "url": "https://example.com/watch/1"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["anime_platform"]["url"], "https://example.com/watch/1");

    // Linking the same pair again replaces the url
    let (status, body) = send(
        &app,
        "POST",
        "/api/platforms/anime",
        None,
        Some(json!({
            "anime_id": 5114,
            "platform_id": platform_id,
            "url": "https://example.com/watch/2"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["anime_platform"]["url"], "https://example.com/watch/2");

    let (status, body) = send(&app, "GET", "/api/platforms/anime/5114", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let available = body["platforms"].as_array().unwrap();
    assert_eq!(available.len(), 1);
    assert_eq!(available[0]["platform_url"], "https://example.com/watch/2");
}
