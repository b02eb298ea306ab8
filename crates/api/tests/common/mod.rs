//! Shared helpers for HTTP-level integration tests.
//!
//! Builds the full application router with the production middleware stack
//! and drives it with `tower::ServiceExt::oneshot`, so tests exercise the
//! same layers (CORS, request ID, timeout, panic recovery) as production.

// Not every test binary uses every helper.
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderName, Method, Request, Response, StatusCode};
use axum::Router;
use sqlx::PgPool;
use tower::ServiceExt;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;

use storyweave_api::auth::jwt::JwtConfig;
use storyweave_api::config::ServerConfig;
use storyweave_api::routes;
use storyweave_api::state::AppState;
use storyweave_core::cache::BoundedCache;
use storyweave_events::Notifier;

/// Build a test `ServerConfig` with safe defaults and a fixed JWT secret.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        public_base_url: "http://localhost:3000".to_string(),
        review_inbox: "reviews@storyweave.local".to_string(),
        jwt: JwtConfig {
            secret: "integration-test-secret-long-enough".to_string(),
            access_token_expiry_mins: 15,
            refresh_token_expiry_days: 7,
        },
    }
}

/// Build the full application router with all middleware layers, using the
/// given database pool. The notifier is unconfigured (no SMTP in tests), so
/// submissions succeed with `notified: false`.
pub fn build_test_app(pool: PgPool) -> Router {
    let config = test_config();

    let domain_cache = Arc::new(BoundedCache::new(64, chrono::Duration::minutes(10)));
    let notifier = Arc::new(Notifier::new(None, domain_cache));

    let state = AppState {
        pool,
        config: Arc::new(config),
        notifier,
    };

    let cors = CorsLayer::new()
        .allow_origin(["http://localhost:5173".parse().unwrap()])
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600));

    let request_id_header = HeaderName::from_static("x-request-id");

    Router::new()
        .merge(routes::health::router())
        .nest("/api/v1", routes::api_routes())
        .layer(CatchPanicLayer::new())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(30),
        ))
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
        .layer(cors)
        .with_state(state)
}

/// Send a GET request.
pub async fn get(app: &Router, path: &str) -> Response<Body> {
    request(app, Method::GET, path, None, None).await
}

/// Send a GET request with a Bearer token.
pub async fn get_auth(app: &Router, path: &str, token: &str) -> Response<Body> {
    request(app, Method::GET, path, None, Some(token)).await
}

/// Send a POST request with a JSON body.
pub async fn post_json(app: &Router, path: &str, body: serde_json::Value) -> Response<Body> {
    request(app, Method::POST, path, Some(body), None).await
}

/// Send a POST request with a JSON body and a Bearer token.
pub async fn post_json_auth(
    app: &Router,
    path: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    request(app, Method::POST, path, Some(body), Some(token)).await
}

/// Send a PUT request with a JSON body and a Bearer token.
pub async fn put_json_auth(
    app: &Router,
    path: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    request(app, Method::PUT, path, Some(body), Some(token)).await
}

async fn request(
    app: &Router,
    method: Method,
    path: &str,
    body: Option<serde_json::Value>,
    token: Option<&str>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(path);
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request should build"),
        None => builder.body(Body::empty()).expect("request should build"),
    };
    app.clone()
        .oneshot(request)
        .await
        .expect("request should not error")
}

/// Read a response body as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = http_body_util::BodyExt::collect(response.into_body())
        .await
        .expect("body should collect")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("body should be JSON")
}

/// Read a response body as text (the HTML confirmation panel).
pub async fn body_text(response: Response<Body>) -> String {
    let bytes = http_body_util::BodyExt::collect(response.into_body())
        .await
        .expect("body should collect")
        .to_bytes();
    String::from_utf8(bytes.to_vec()).expect("body should be UTF-8")
}

/// Register an account and log in, returning `(user_id, access_token)`.
pub async fn register_and_login(app: &Router, username: &str) -> (i64, String) {
    let response = post_json(
        app,
        "/api/v1/auth/register",
        serde_json::json!({
            "username": username,
            "email": format!("{username}@example.org"),
            "password": "a-sufficiently-long-password",
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED, "registration failed");
    let user = body_json(response).await;
    let user_id = user["data"]["id"].as_i64().expect("user id");

    let response = post_json(
        app,
        "/api/v1/auth/login",
        serde_json::json!({
            "username": username,
            "password": "a-sufficiently-long-password",
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK, "login failed");
    let session = body_json(response).await;
    let token = session["data"]["access_token"]
        .as_str()
        .expect("access token")
        .to_string();

    (user_id, token)
}

/// Promote an account to admin directly in the database, returning a fresh
/// token carrying the admin role.
pub async fn promote_to_admin(app: &Router, pool: &PgPool, username: &str) -> String {
    sqlx::query("UPDATE users SET role = 'admin' WHERE username = $1")
        .bind(username)
        .execute(pool)
        .await
        .expect("promotion should succeed");

    let response = post_json(
        app,
        "/api/v1/auth/login",
        serde_json::json!({
            "username": username,
            "password": "a-sufficiently-long-password",
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK, "admin login failed");
    let session = body_json(response).await;
    session["data"]["access_token"]
        .as_str()
        .expect("access token")
        .to_string()
}

/// Complete the caller's creator profile (unlocks submission).
pub async fn complete_profile(app: &Router, token: &str) {
    let response = put_json_auth(
        app,
        "/api/v1/creator-profile",
        serde_json::json!({ "pen_name": "Quill", "bio": "writes empathy sims" }),
        token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK, "profile upsert failed");
}

/// A two-passage Twison story matching the coffee-shop scenario.
pub fn coffee_shop_twison() -> serde_json::Value {
    serde_json::json!({
        "name": "Coffee Shop Dilemma",
        "startnode": 1,
        "passages": [
            {
                "pid": 1,
                "name": "Start",
                "text": "You wait in line. [[Continue->End]]",
            },
            {
                "pid": 2,
                "name": "End",
                "text": "You drink your coffee.",
            }
        ]
    })
}

/// Import the coffee-shop story, returning its story id.
pub async fn import_coffee_shop(app: &Router, token: &str) -> i64 {
    let response = post_json_auth(
        app,
        "/api/v1/stories/import/twison",
        serde_json::json!({ "story": coffee_shop_twison() }),
        token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED, "import failed");
    let body = body_json(response).await;
    body["data"]["story"]["id"].as_i64().expect("story id")
}

/// Submit a story for approval with full consent, returning the version id.
pub async fn submit_story(app: &Router, token: &str, story_id: i64) -> i64 {
    let response = post_json_auth(
        app,
        &format!("/api/v1/stories/{story_id}/submit"),
        serde_json::json!({ "consent": { "transfer": true, "contact": true } }),
        token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED, "submission failed");
    let body = body_json(response).await;
    body["data"]["version"]["id"].as_i64().expect("version id")
}

/// Fetch a story's approval token straight from the database (it is never
/// exposed through the API).
pub async fn stored_approval_token(pool: &PgPool, story_id: i64) -> String {
    let row: (Option<String>,) =
        sqlx::query_as("SELECT approval_token FROM stories WHERE id = $1")
            .bind(story_id)
            .fetch_one(pool)
            .await
            .expect("story should exist");
    row.0.expect("approval token should be set")
}
