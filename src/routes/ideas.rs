// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Idea board routes: listing, submission and vote toggling.
//!
//! These run in both deployment modes. The optional-auth middleware
//! attaches the session when present; the identity resolver decides
//! whether one is required.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::IdeaResponse;
use crate::AppState;
use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/ideas", get(list_ideas).post(create_idea))
        .route("/api/ideas/vote", post(toggle_vote))
}

// ─── Listing ─────────────────────────────────────────────────

#[derive(Deserialize)]
struct ListQuery {
    /// Status filter; "all" disables filtering.
    status: Option<String>,
    /// "votes" or anything else for newest-first.
    sort: Option<String>,
}

#[derive(Serialize)]
pub struct IdeasResponse {
    pub ideas: Vec<IdeaResponse>,
}

/// List the top ideas, annotated with the caller's votes.
async fn list_ideas(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<Option<AuthUser>>,
    headers: HeaderMap,
    Query(params): Query<ListQuery>,
) -> Result<Json<IdeasResponse>> {
    let viewer = state.identity.resolve(&state.db, &headers, auth.as_ref()).await;

    let ideas = state
        .ideas
        .list(
            params.status.as_deref().unwrap_or("pending"),
            params.sort.as_deref().unwrap_or("votes"),
            viewer.as_ref(),
        )
        .await?;

    Ok(Json(IdeasResponse { ideas }))
}

// ─── Submission ──────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateIdeaRequest {
    title: Option<String>,
    category: Option<String>,
}

#[derive(Serialize)]
pub struct IdeaEnvelope {
    pub idea: IdeaResponse,
}

/// Submit a new idea.
async fn create_idea(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<Option<AuthUser>>,
    headers: HeaderMap,
    Json(body): Json<CreateIdeaRequest>,
) -> Result<(StatusCode, Json<IdeaEnvelope>)> {
    let voter = state
        .identity
        .require(&state.db, &headers, auth.as_ref())
        .await?;

    let title = body
        .title
        .ok_or_else(|| AppError::BadRequest("Missing title".to_string()))?;

    let idea = state.ideas.create(&title, body.category, &voter).await?;

    Ok((StatusCode::CREATED, Json(IdeaEnvelope { idea })))
}

// ─── Voting ──────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct VoteRequest {
    idea_id: Option<String>,
}

#[derive(Serialize)]
pub struct VoteResponse {
    pub voted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub votes: Option<i64>,
}

/// Toggle the caller's vote on an idea.
async fn toggle_vote(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<Option<AuthUser>>,
    headers: HeaderMap,
    Json(body): Json<VoteRequest>,
) -> Result<Json<VoteResponse>> {
    let voter = state
        .identity
        .require(&state.db, &headers, auth.as_ref())
        .await?;

    let idea_id = body
        .idea_id
        .ok_or_else(|| AppError::BadRequest("Missing ideaId".to_string()))?;

    let outcome = state.votes.toggle(&idea_id, &voter).await?;

    Ok(Json(VoteResponse {
        voted: outcome.voted,
        // The count is only reported when a vote was added.
        votes: outcome.voted.then_some(outcome.votes),
    }))
}
