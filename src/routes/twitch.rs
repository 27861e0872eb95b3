// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Cached read-through proxies for the Twitch Helix API.
//!
//! Every endpoint degrades to its empty shape with an `error` field when
//! the upstream call fails; the site never sees a hard crash.

use crate::AppState;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/twitch-status", get(stream_status))
        .route("/api/twitch-clips", get(clips))
        .route("/api/twitch-videos", get(videos))
        .route("/api/twitch-schedule", get(schedule))
}

/// Live status, cached for 60 seconds.
async fn stream_status(State(state): State<Arc<AppState>>) -> Response {
    match state.twitch.stream_status().await {
        Ok(status) => Json(status).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Twitch status fetch failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "isLive": false, "error": "Failed to fetch status" })),
            )
                .into_response()
        }
    }
}

/// Top clips, cached for 5 minutes.
async fn clips(State(state): State<Arc<AppState>>) -> Response {
    match state.twitch.clips().await {
        Ok(payload) => Json(payload).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Twitch clips fetch failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "clips": [], "error": "Failed to fetch clips" })),
            )
                .into_response()
        }
    }
}

#[derive(Deserialize)]
struct VideosQuery {
    #[serde(rename = "type")]
    video_type: Option<String>,
}

/// VODs of the requested type (default highlights), cached for 5 minutes.
async fn videos(State(state): State<Arc<AppState>>, Query(params): Query<VideosQuery>) -> Response {
    let video_type = params.video_type.as_deref().unwrap_or("highlight");

    match state.twitch.videos(video_type).await {
        Ok(payload) => Json(payload).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Twitch videos fetch failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "videos": [], "error": "Failed to fetch videos" })),
            )
                .into_response()
        }
    }
}

/// Stream schedule, cached for 5 minutes.
async fn schedule(State(state): State<Arc<AppState>>) -> Response {
    match state.twitch.schedule().await {
        Ok(payload) => Json(payload).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Twitch schedule fetch failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "segments": [], "error": "Failed to fetch schedule" })),
            )
                .into_response()
        }
    }
}
