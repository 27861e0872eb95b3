// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Stream idea and vote models.

use crate::models::PublicUser;
use crate::time_utils::format_unix_rfc3339;
use serde::Serialize;
use sqlx::FromRow;

/// A stream idea row.
#[derive(Debug, Clone, FromRow)]
pub struct StreamIdea {
    pub id: String,
    pub title: String,
    pub category: String,
    /// Denormalized count of `votes` rows for this idea.
    pub votes: i64,
    pub status: String,
    /// Voter reference of the submitter (user id or IP hash).
    pub owner_ref: String,
    /// Owning user, present only in twitch mode.
    pub user_id: Option<String>,
    pub created_at: i64,
}

/// A vote row. Existence is the whole state; there is no up/down value.
#[derive(Debug, Clone, FromRow)]
pub struct Vote {
    pub id: String,
    pub idea_id: String,
    pub voter_ref: String,
    pub created_at: i64,
}

/// Idea listing row joined with the owning user's public profile.
#[derive(Debug, Clone, FromRow)]
pub struct IdeaWithOwner {
    pub id: String,
    pub title: String,
    pub category: String,
    pub votes: i64,
    pub status: String,
    pub created_at: i64,
    pub user_id: Option<String>,
    pub username: Option<String>,
    pub profile_picture: Option<String>,
}

/// API shape for a single idea.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdeaResponse {
    pub id: String,
    pub title: String,
    pub category: String,
    pub votes: i64,
    pub status: String,
    pub created_at: String,
    pub has_voted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<PublicUser>,
}

impl IdeaResponse {
    /// Build the API shape from a joined listing row.
    pub fn from_row(row: IdeaWithOwner, has_voted: bool) -> Self {
        let user = match (row.user_id, row.username) {
            (Some(id), Some(username)) => Some(PublicUser {
                id,
                username,
                profile_picture: row.profile_picture,
            }),
            _ => None,
        };

        Self {
            id: row.id,
            title: row.title,
            category: row.category,
            votes: row.votes,
            status: row.status,
            created_at: format_unix_rfc3339(row.created_at),
            has_voted,
            user,
        }
    }
}
