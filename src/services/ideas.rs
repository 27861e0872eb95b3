// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Stream idea submission and listing.

use crate::db::{Db, IdeaSort};
use crate::error::AppError;
use crate::models::{IdeaResponse, StreamIdea};
use crate::services::identity::Voter;
use chrono::Utc;
use std::collections::HashSet;
use uuid::Uuid;

/// Trimmed title length bounds.
const TITLE_MIN_CHARS: usize = 3;
const TITLE_MAX_CHARS: usize = 200;

/// One idea per identity per rolling window.
const SUBMIT_COOLDOWN_SECS: i64 = 5 * 60;

/// Fixed top-N listing, no pagination.
const LIST_LIMIT: i64 = 50;

const DEFAULT_CATEGORY: &str = "general";
const STATUS_PENDING: &str = "pending";

/// Idea board service.
#[derive(Clone)]
pub struct IdeaService {
    db: Db,
}

impl IdeaService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// List ideas, annotated with whether `viewer` has voted on each.
    ///
    /// `status` of `"all"` disables filtering; `sort` of `"votes"` orders
    /// by count, anything else by creation time.
    pub async fn list(
        &self,
        status: &str,
        sort: &str,
        viewer: Option<&Voter>,
    ) -> Result<Vec<IdeaResponse>, AppError> {
        let status_filter = if status == "all" { None } else { Some(status) };
        let order = if sort == "votes" {
            IdeaSort::Votes
        } else {
            IdeaSort::Newest
        };

        let rows = self.db.list_ideas(status_filter, order, LIST_LIMIT).await?;

        let voted_ids: HashSet<String> = match viewer {
            Some(voter) => self.db.voted_idea_ids(&voter.voter_ref).await?,
            None => HashSet::new(),
        };

        Ok(rows
            .into_iter()
            .map(|row| {
                let has_voted = voted_ids.contains(&row.id);
                IdeaResponse::from_row(row, has_voted)
            })
            .collect())
    }

    /// Submit a new idea for the given voter.
    pub async fn create(
        &self,
        title: &str,
        category: Option<String>,
        voter: &Voter,
    ) -> Result<IdeaResponse, AppError> {
        let title = validate_title(title)?;

        let now = Utc::now().timestamp();
        let since = now - SUBMIT_COOLDOWN_SECS;
        if self.db.has_idea_since(&voter.voter_ref, since).await? {
            return Err(AppError::RateLimited(
                "Wait 5 minutes between ideas".to_string(),
            ));
        }

        let category = category
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| DEFAULT_CATEGORY.to_string());

        let idea = StreamIdea {
            id: Uuid::new_v4().to_string(),
            title,
            category,
            votes: 0,
            status: STATUS_PENDING.to_string(),
            owner_ref: voter.voter_ref.clone(),
            user_id: voter.user_id.clone(),
            created_at: now,
        };

        self.db.insert_idea(&idea).await?;

        tracing::info!(idea_id = %idea.id, category = %idea.category, "Idea created");

        let row = self
            .db
            .get_idea_with_owner(&idea.id)
            .await?
            .ok_or_else(|| AppError::Database(format!("Inserted idea {} missing", idea.id)))?;

        Ok(IdeaResponse::from_row(row, false))
    }
}

/// Clamp the title to [3, 200] trimmed characters.
fn validate_title(raw: &str) -> Result<String, AppError> {
    let trimmed = raw.trim();
    let len = trimmed.chars().count();

    if len < TITLE_MIN_CHARS {
        return Err(AppError::BadRequest(
            "Idea must be at least 3 characters".to_string(),
        ));
    }
    if len > TITLE_MAX_CHARS {
        return Err(AppError::BadRequest(
            "Idea must be at most 200 characters".to_string(),
        ));
    }

    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_title_bounds() {
        assert!(validate_title("ab").is_err());
        assert!(validate_title("  ab  ").is_err());
        assert_eq!(validate_title(" abc ").unwrap(), "abc");
        assert!(validate_title(&"x".repeat(200)).is_ok());
        assert!(validate_title(&"x".repeat(201)).is_err());
    }

    #[test]
    fn test_validate_title_counts_trimmed_chars() {
        // Whitespace padding does not count toward the maximum.
        let padded = format!("  {}  ", "x".repeat(200));
        assert!(validate_title(&padded).is_ok());
        // Multi-byte characters count as one.
        assert!(validate_title("æøå").is_ok());
    }
}
