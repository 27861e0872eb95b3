// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User model for storage and API.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// User row, created on first Twitch sign-in and refreshed on each one.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    /// Internal id (UUID string)
    pub id: String,
    /// Twitch user id (OAuth subject)
    pub twitch_id: String,
    /// Twitch display name
    pub username: String,
    /// Avatar URL (may be None if not shared)
    pub profile_picture: Option<String>,
    /// When the user first signed in (unix seconds)
    pub created_at: i64,
    /// Last sign-in (unix seconds)
    pub updated_at: i64,
}

/// Public view of a user, embedded in idea listings.
///
/// Never exposes the Twitch id or timestamps.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: String,
    pub username: String,
    pub profile_picture: Option<String>,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            profile_picture: user.profile_picture,
        }
    }
}
