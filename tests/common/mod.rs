// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared test helpers: in-memory app construction and request plumbing.

use axum::body::Body;
use axum::http::Request;
use std::sync::Arc;
use streamhub::config::{Config, VoteMode};
use streamhub::db::Db;
use streamhub::models::User;
use streamhub::routes::create_router;
use streamhub::services::{IdeaService, IdentityResolver, TwitchClient, TwitchService, VoteService};
use streamhub::AppState;

/// Base URLs nothing listens on; Twitch calls fail fast.
pub const DEAD_HELIX_URL: &str = "http://127.0.0.1:1/helix";
pub const DEAD_OAUTH_URL: &str = "http://127.0.0.1:1/oauth";

/// Create a test app over an in-memory database.
///
/// Twitch base URLs point at a dead port unless overridden, so any test
/// that reaches upstream by accident fails loudly instead of calling out.
#[allow(dead_code)]
pub async fn create_test_app(mode: VoteMode) -> (axum::Router, Arc<AppState>) {
    create_test_app_with_urls(mode, DEAD_HELIX_URL, DEAD_OAUTH_URL).await
}

pub async fn create_test_app_with_urls(
    mode: VoteMode,
    helix_url: &str,
    oauth_url: &str,
) -> (axum::Router, Arc<AppState>) {
    let config = Config {
        vote_mode: mode,
        ..Config::default()
    };

    let db = Db::connect_in_memory()
        .await
        .expect("Failed to open in-memory database");

    let twitch = TwitchService::new(
        TwitchClient::with_base_urls(
            config.twitch_client_id.clone(),
            config.twitch_client_secret.clone(),
            helix_url.to_string(),
            oauth_url.to_string(),
        ),
        config.channel_login.clone(),
    );

    let auth_client = TwitchClient::with_base_urls(
        config.twitch_auth_client_id.clone(),
        config.twitch_auth_client_secret.clone(),
        helix_url.to_string(),
        oauth_url.to_string(),
    );

    let identity = IdentityResolver::new(mode, config.ip_hash_key.clone());

    let state = Arc::new(AppState {
        ideas: IdeaService::new(db.clone()),
        votes: VoteService::new(db.clone()),
        config: config.clone(),
        db,
        identity,
        twitch,
        auth_client,
    });

    (create_router(state.clone()), state)
}

/// Mint a session JWT the way the callback route does.
#[allow(dead_code)]
pub fn create_test_jwt(twitch_id: &str, signing_key: &[u8]) -> String {
    streamhub::middleware::auth::create_jwt(twitch_id, signing_key)
        .expect("Failed to create JWT")
}

/// Insert a user row, as the OAuth callback would.
#[allow(dead_code)]
pub async fn seed_user(state: &Arc<AppState>, twitch_id: &str, username: &str) -> User {
    state
        .db
        .upsert_user(twitch_id, username, None, chrono::Utc::now().timestamp())
        .await
        .expect("Failed to seed user")
}

/// Build a request with optional JSON body, bearer token and client IP.
#[allow(dead_code)]
pub fn request(
    method: &str,
    uri: &str,
    body: Option<serde_json::Value>,
    token: Option<&str>,
    forwarded_for: Option<&str>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);

    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    if let Some(ip) = forwarded_for {
        builder = builder.header("x-forwarded-for", ip);
    }

    match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Read a response body as JSON.
#[allow(dead_code)]
pub async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read response body");
    serde_json::from_slice(&bytes).expect("Response body is not JSON")
}
