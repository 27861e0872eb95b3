// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! SQLite store with typed operations.
//!
//! Provides high-level operations for:
//! - Users (upserted on each Twitch sign-in)
//! - Stream ideas (submission, listing, rate-limit window check)
//! - Votes (transactional toggle keeping the denormalized counter in sync)

use crate::error::AppError;
use crate::models::{IdeaWithOwner, StreamIdea, User, Vote};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::collections::HashSet;
use std::str::FromStr;
use uuid::Uuid;

/// Sort order for idea listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdeaSort {
    /// Vote count descending, newest first among ties.
    Votes,
    /// Creation time descending.
    Newest,
}

/// Outcome of a vote toggle.
#[derive(Debug, Clone, Copy)]
pub struct VoteToggle {
    /// Whether the voter now holds a vote on the idea.
    pub voted: bool,
    /// The idea's counter after the toggle.
    pub votes: i64,
}

const LIST_IDEAS_BASE: &str = "SELECT i.id, i.title, i.category, i.votes, i.status, \
     i.created_at, i.user_id, u.username, u.profile_picture \
     FROM stream_ideas i LEFT JOIN users u ON u.id = i.user_id";

/// SQLite database client.
#[derive(Clone)]
pub struct Db {
    pool: SqlitePool,
}

impl Db {
    /// Open (creating if missing) the database at `database_url` and run
    /// pending migrations.
    pub async fn connect(database_url: &str) -> Result<Self, AppError> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| AppError::Database(format!("Invalid DATABASE_URL: {}", e)))?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| AppError::Database(format!("Failed to open database: {}", e)))?;

        let db = Self { pool };
        db.migrate().await?;

        tracing::info!(url = database_url, "Connected to SQLite");
        Ok(db)
    }

    /// Open an in-memory database for tests.
    ///
    /// The pool is pinned to a single connection; each SQLite `:memory:`
    /// connection is its own database.
    pub async fn connect_in_memory() -> Result<Self, AppError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| AppError::Database(e.to_string()))?
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|e| AppError::Database(format!("Failed to open in-memory db: {}", e)))?;

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    async fn migrate(&self) -> Result<(), AppError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::Database(format!("Migration failed: {}", e)))
    }

    /// Raw pool access, for tests that need to shape fixture data.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    // ─── User Operations ─────────────────────────────────────────

    /// Get a user by internal id.
    pub async fn get_user(&self, id: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    /// Get a user by their Twitch id.
    pub async fn get_user_by_twitch_id(&self, twitch_id: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE twitch_id = ?1")
            .bind(twitch_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    /// Create or refresh a user keyed by Twitch id.
    ///
    /// Display name and avatar are overwritten on every sign-in.
    pub async fn upsert_user(
        &self,
        twitch_id: &str,
        username: &str,
        profile_picture: Option<&str>,
        now: i64,
    ) -> Result<User, AppError> {
        sqlx::query(
            "INSERT INTO users (id, twitch_id, username, profile_picture, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?5) \
             ON CONFLICT (twitch_id) DO UPDATE SET \
                 username = excluded.username, \
                 profile_picture = excluded.profile_picture, \
                 updated_at = excluded.updated_at",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(twitch_id)
        .bind(username)
        .bind(profile_picture)
        .bind(now)
        .execute(&self.pool)
        .await?;

        self.get_user_by_twitch_id(twitch_id)
            .await?
            .ok_or_else(|| AppError::Database(format!("Upserted user {} missing", twitch_id)))
    }

    // ─── Idea Operations ─────────────────────────────────────────

    /// Insert a new stream idea.
    pub async fn insert_idea(&self, idea: &StreamIdea) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO stream_ideas \
             (id, title, category, votes, status, owner_ref, user_id, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )
        .bind(&idea.id)
        .bind(&idea.title)
        .bind(&idea.category)
        .bind(idea.votes)
        .bind(&idea.status)
        .bind(&idea.owner_ref)
        .bind(&idea.user_id)
        .bind(idea.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Get one idea by id.
    pub async fn get_idea(&self, id: &str) -> Result<Option<StreamIdea>, AppError> {
        let idea = sqlx::query_as::<_, StreamIdea>("SELECT * FROM stream_ideas WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(idea)
    }

    /// Get one idea joined with its owner's public profile.
    pub async fn get_idea_with_owner(&self, id: &str) -> Result<Option<IdeaWithOwner>, AppError> {
        let sql = format!("{} WHERE i.id = ?1", LIST_IDEAS_BASE);
        let idea = sqlx::query_as::<_, IdeaWithOwner>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(idea)
    }

    /// List ideas, optionally filtered by status, in the given order.
    pub async fn list_ideas(
        &self,
        status: Option<&str>,
        sort: IdeaSort,
        limit: i64,
    ) -> Result<Vec<IdeaWithOwner>, AppError> {
        let order = match sort {
            IdeaSort::Votes => "i.votes DESC, i.created_at DESC",
            IdeaSort::Newest => "i.created_at DESC",
        };

        let rows = if let Some(status) = status {
            let sql = format!(
                "{} WHERE i.status = ?1 ORDER BY {} LIMIT ?2",
                LIST_IDEAS_BASE, order
            );
            sqlx::query_as::<_, IdeaWithOwner>(&sql)
                .bind(status)
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
        } else {
            let sql = format!("{} ORDER BY {} LIMIT ?1", LIST_IDEAS_BASE, order);
            sqlx::query_as::<_, IdeaWithOwner>(&sql)
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
        };

        Ok(rows)
    }

    /// Whether `owner_ref` submitted any idea at or after `since` (unix seconds).
    ///
    /// Backs the rolling-window submission rate limit.
    pub async fn has_idea_since(&self, owner_ref: &str, since: i64) -> Result<bool, AppError> {
        let (exists,): (i64,) = sqlx::query_as(
            "SELECT EXISTS (SELECT 1 FROM stream_ideas \
             WHERE owner_ref = ?1 AND created_at >= ?2)",
        )
        .bind(owner_ref)
        .bind(since)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists != 0)
    }

    // ─── Vote Operations ─────────────────────────────────────────

    /// Idea ids the given voter has voted for.
    pub async fn voted_idea_ids(&self, voter_ref: &str) -> Result<HashSet<String>, AppError> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT idea_id FROM votes WHERE voter_ref = ?1")
                .bind(voter_ref)
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    /// Live count of vote rows for an idea (the counter's source of truth).
    pub async fn count_votes(&self, idea_id: &str) -> Result<i64, AppError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM votes WHERE idea_id = ?1")
            .bind(idea_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Toggle a vote for (idea, voter).
    ///
    /// The vote row mutation and the counter update commit as a single
    /// transaction so `stream_ideas.votes` always equals the row count.
    /// The caller must have verified the idea exists.
    pub async fn toggle_vote(
        &self,
        idea_id: &str,
        voter_ref: &str,
        now: i64,
    ) -> Result<VoteToggle, AppError> {
        let mut tx = self.pool.begin().await?;

        let existing = sqlx::query_as::<_, Vote>(
            "SELECT * FROM votes WHERE idea_id = ?1 AND voter_ref = ?2",
        )
        .bind(idea_id)
        .bind(voter_ref)
        .fetch_optional(&mut *tx)
        .await?;

        let voted = if let Some(vote) = existing {
            sqlx::query("DELETE FROM votes WHERE id = ?1")
                .bind(&vote.id)
                .execute(&mut *tx)
                .await?;
            sqlx::query("UPDATE stream_ideas SET votes = votes - 1 WHERE id = ?1")
                .bind(idea_id)
                .execute(&mut *tx)
                .await?;
            false
        } else {
            sqlx::query(
                "INSERT INTO votes (id, idea_id, voter_ref, created_at) VALUES (?1, ?2, ?3, ?4)",
            )
            .bind(Uuid::new_v4().to_string())
            .bind(idea_id)
            .bind(voter_ref)
            .bind(now)
            .execute(&mut *tx)
            .await?;
            sqlx::query("UPDATE stream_ideas SET votes = votes + 1 WHERE id = ?1")
                .bind(idea_id)
                .execute(&mut *tx)
                .await?;
            true
        };

        let (votes,): (i64,) = sqlx::query_as("SELECT votes FROM stream_ideas WHERE id = ?1")
            .bind(idea_id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(VoteToggle { voted, votes })
    }
}
