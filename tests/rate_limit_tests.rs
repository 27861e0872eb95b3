// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Rolling-window submission rate limit.

mod common;

use axum::http::StatusCode;
use common::{body_json, create_test_app, request};
use serde_json::json;
use streamhub::config::VoteMode;
use tower::ServiceExt;

#[tokio::test]
async fn test_second_submission_within_window_rejected() {
    let (app, _state) = create_test_app(VoteMode::Anonymous).await;

    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/ideas",
            Some(json!({"title": "First idea"})),
            None,
            Some("203.0.113.7"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .oneshot(request(
            "POST",
            "/api/ideas",
            Some(json!({"title": "Second idea too soon"})),
            None,
            Some("203.0.113.7"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    let body = body_json(response).await;
    assert_eq!(body["error"], "rate_limited");
    assert!(body["details"].as_str().unwrap().contains("5 minutes"));
}

#[tokio::test]
async fn test_submission_allowed_after_window() {
    let (app, state) = create_test_app(VoteMode::Anonymous).await;

    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/ideas",
            Some(json!({"title": "First idea"})),
            None,
            Some("203.0.113.7"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    // Backdate the submission past the five-minute window
    let backdated = chrono::Utc::now().timestamp() - 301;
    sqlx::query("UPDATE stream_ideas SET created_at = ?1")
        .bind(backdated)
        .execute(state.db.pool())
        .await
        .unwrap();

    let response = app
        .oneshot(request(
            "POST",
            "/api/ideas",
            Some(json!({"title": "Second idea, later"})),
            None,
            Some("203.0.113.7"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn test_rate_limit_is_per_identity() {
    let (app, _state) = create_test_app(VoteMode::Anonymous).await;

    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/ideas",
            Some(json!({"title": "From the first viewer"})),
            None,
            Some("203.0.113.7"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    // A different IP is a different identity and is not limited
    let response = app
        .oneshot(request(
            "POST",
            "/api/ideas",
            Some(json!({"title": "From another viewer"})),
            None,
            Some("203.0.113.8"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
}
