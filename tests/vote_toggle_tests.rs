// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Vote toggling: round trips, the counter/row invariant, and identity
//! separation.

mod common;

use axum::http::StatusCode;
use common::{body_json, create_test_app, create_test_jwt, request, seed_user};
use serde_json::json;
use streamhub::config::VoteMode;
use tower::ServiceExt;

async fn create_idea(app: &axum::Router, ip: &str, title: &str) -> String {
    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/ideas",
            Some(json!({"title": title})),
            None,
            Some(ip),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["idea"]["id"]
        .as_str()
        .unwrap()
        .to_string()
}

#[tokio::test]
async fn test_vote_toggle_round_trip() {
    let (app, state) = create_test_app(VoteMode::Anonymous).await;
    let idea_id = create_idea(&app, "198.51.100.1", "Co-op indie night").await;

    // First toggle adds the vote and reports the count
    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/ideas/vote",
            Some(json!({"ideaId": idea_id})),
            None,
            Some("198.51.100.2"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["voted"], true);
    assert_eq!(body["votes"], 1);
    assert_eq!(state.db.count_votes(&idea_id).await.unwrap(), 1);

    // Second toggle removes it; the count is omitted on removal
    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/ideas/vote",
            Some(json!({"ideaId": idea_id})),
            None,
            Some("198.51.100.2"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["voted"], false);
    assert!(body.get("votes").is_none());
    assert_eq!(state.db.count_votes(&idea_id).await.unwrap(), 0);

    // The denormalized counter tracked both transitions
    let idea = state.db.get_idea(&idea_id).await.unwrap().unwrap();
    assert_eq!(idea.votes, 0);
}

#[tokio::test]
async fn test_vote_counter_matches_row_count() {
    let (app, state) = create_test_app(VoteMode::Anonymous).await;
    let idea_id = create_idea(&app, "198.51.100.1", "Viewer games Friday").await;

    let voters = ["198.51.100.10", "198.51.100.11", "198.51.100.12"];
    for ip in voters {
        let response = app
            .clone()
            .oneshot(request(
                "POST",
                "/api/ideas/vote",
                Some(json!({"ideaId": idea_id})),
                None,
                Some(ip),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    // One voter toggles back off
    app.clone()
        .oneshot(request(
            "POST",
            "/api/ideas/vote",
            Some(json!({"ideaId": idea_id})),
            None,
            Some("198.51.100.11"),
        ))
        .await
        .unwrap();

    let idea = state.db.get_idea(&idea_id).await.unwrap().unwrap();
    let rows = state.db.count_votes(&idea_id).await.unwrap();
    assert_eq!(idea.votes, 2);
    assert_eq!(idea.votes, rows);
}

#[tokio::test]
async fn test_vote_identities_are_independent() {
    let (app, _state) = create_test_app(VoteMode::Anonymous).await;
    let idea_id = create_idea(&app, "198.51.100.1", "Retro console deep dive").await;

    let body = body_json(
        app.clone()
            .oneshot(request(
                "POST",
                "/api/ideas/vote",
                Some(json!({"ideaId": idea_id})),
                None,
                Some("198.51.100.2"),
            ))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(body["votes"], 1);

    // A different IP adds, not toggles
    let body = body_json(
        app.oneshot(request(
            "POST",
            "/api/ideas/vote",
            Some(json!({"ideaId": idea_id})),
            None,
            Some("198.51.100.3"),
        ))
        .await
        .unwrap(),
    )
    .await;
    assert_eq!(body["voted"], true);
    assert_eq!(body["votes"], 2);
}

#[tokio::test]
async fn test_vote_unknown_idea() {
    let (app, _state) = create_test_app(VoteMode::Anonymous).await;

    let response = app
        .oneshot(request(
            "POST",
            "/api/ideas/vote",
            Some(json!({"ideaId": "no-such-idea"})),
            None,
            Some("198.51.100.2"),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_vote_missing_idea_id() {
    let (app, _state) = create_test_app(VoteMode::Anonymous).await;

    let response = app
        .oneshot(request(
            "POST",
            "/api/ideas/vote",
            Some(json!({})),
            None,
            Some("198.51.100.2"),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_vote_twitch_mode_requires_session() {
    let (app, state) = create_test_app(VoteMode::Twitch).await;

    // Seed an idea directly; HTTP submission would also need a session
    let user = seed_user(&state, "12345", "viewer_one").await;
    let idea = streamhub::models::StreamIdea {
        id: "idea-1".to_string(),
        title: "Sub-only speedrun night".to_string(),
        category: "general".to_string(),
        votes: 0,
        status: "pending".to_string(),
        owner_ref: user.id.clone(),
        user_id: Some(user.id.clone()),
        created_at: chrono::Utc::now().timestamp(),
    };
    state.db.insert_idea(&idea).await.unwrap();

    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/ideas/vote",
            Some(json!({"ideaId": "idea-1"})),
            None,
            Some("198.51.100.2"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // With a session the vote lands
    let token = create_test_jwt(&user.twitch_id, &state.config.jwt_signing_key);
    let response = app
        .oneshot(request(
            "POST",
            "/api/ideas/vote",
            Some(json!({"ideaId": "idea-1"})),
            Some(&token),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["voted"], true);
    assert_eq!(body["votes"], 1);
}
