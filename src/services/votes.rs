// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Vote toggling for stream ideas.

use crate::db::{Db, VoteToggle};
use crate::error::AppError;
use crate::services::identity::Voter;
use chrono::Utc;

/// Vote service.
#[derive(Clone)]
pub struct VoteService {
    db: Db,
}

impl VoteService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Toggle `voter`'s vote on an idea.
    ///
    /// Inserting or removing the vote row and updating the idea's counter
    /// happen in one transaction, so the counter always matches the live
    /// row count.
    pub async fn toggle(&self, idea_id: &str, voter: &Voter) -> Result<VoteToggle, AppError> {
        self.db
            .get_idea(idea_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Idea not found".to_string()))?;

        let outcome = self
            .db
            .toggle_vote(idea_id, &voter.voter_ref, Utc::now().timestamp())
            .await?;

        tracing::debug!(
            idea_id,
            voted = outcome.voted,
            votes = outcome.votes,
            "Vote toggled"
        );

        Ok(outcome)
    }
}
