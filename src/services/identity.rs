// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Voter identity resolution.
//!
//! One resolver, two strategies, selected by deployment config:
//! - Anonymous: salted HMAC of the client IP. Always resolves.
//! - Twitch: JWT session subject looked up against the users table.
//!   Missing session is an error for writes; reads degrade to "no voter".

use crate::config::VoteMode;
use crate::db::Db;
use crate::error::AppError;
use crate::middleware::auth::AuthUser;
use axum::http::HeaderMap;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// A resolved voter identity.
#[derive(Debug, Clone)]
pub struct Voter {
    /// Opaque reference recorded on vote and idea rows.
    pub voter_ref: String,
    /// Backing user row, present only in twitch mode.
    pub user_id: Option<String>,
}

/// Maps an inbound request to exactly one voter reference.
pub enum IdentityResolver {
    Anonymous { hash_key: Vec<u8> },
    Twitch,
}

impl IdentityResolver {
    pub fn new(mode: VoteMode, ip_hash_key: Vec<u8>) -> Self {
        match mode {
            VoteMode::Anonymous => IdentityResolver::Anonymous {
                hash_key: ip_hash_key,
            },
            VoteMode::Twitch => IdentityResolver::Twitch,
        }
    }

    /// Resolve the voter for a write operation.
    ///
    /// Anonymous mode never fails. Twitch mode requires a valid session
    /// (`Unauthorized`) backed by an existing user row (`NotFound`).
    pub async fn require(
        &self,
        db: &Db,
        headers: &HeaderMap,
        auth: Option<&AuthUser>,
    ) -> Result<Voter, AppError> {
        match self {
            IdentityResolver::Anonymous { hash_key } => {
                let ip = client_ip(headers);
                Ok(Voter {
                    voter_ref: hash_ip(hash_key, &ip)?,
                    user_id: None,
                })
            }
            IdentityResolver::Twitch => {
                let auth = auth.ok_or(AppError::Unauthorized)?;
                let user = db
                    .get_user_by_twitch_id(&auth.twitch_id)
                    .await?
                    .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
                Ok(Voter {
                    voter_ref: user.id.clone(),
                    user_id: Some(user.id),
                })
            }
        }
    }

    /// Resolve the voter for a read, if possible.
    ///
    /// Used to annotate listings with `hasVoted`; a missing or stale
    /// session simply means no votes are highlighted.
    pub async fn resolve(
        &self,
        db: &Db,
        headers: &HeaderMap,
        auth: Option<&AuthUser>,
    ) -> Option<Voter> {
        match self {
            IdentityResolver::Anonymous { .. } => {
                self.require(db, headers, auth).await.ok()
            }
            IdentityResolver::Twitch => {
                auth?;
                match self.require(db, headers, auth).await {
                    Ok(voter) => Some(voter),
                    Err(e) => {
                        tracing::debug!(error = %e, "No voter identity for read");
                        None
                    }
                }
            }
        }
    }
}

/// First `X-Forwarded-For` address, or the literal `"unknown"`.
fn client_ip(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Salted one-way hash of a client IP.
fn hash_ip(key: &[u8], ip: &str) -> Result<String, AppError> {
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("HMAC init failed: {}", e)))?;
    mac.update(ip.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_client_ip_first_forwarded_entry() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.7, 10.0.0.1"),
        );
        assert_eq!(client_ip(&headers), "203.0.113.7");
    }

    #[test]
    fn test_client_ip_missing_header() {
        assert_eq!(client_ip(&HeaderMap::new()), "unknown");
    }

    #[test]
    fn test_hash_ip_is_stable_and_salted() {
        let a = hash_ip(b"salt", "203.0.113.7").unwrap();
        let b = hash_ip(b"salt", "203.0.113.7").unwrap();
        let c = hash_ip(b"other-salt", "203.0.113.7").unwrap();
        let d = hash_ip(b"salt", "203.0.113.8").unwrap();

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);
        // Hex-encoded SHA-256 output
        assert_eq!(a.len(), 64);
    }

    #[tokio::test]
    async fn test_anonymous_always_resolves() {
        let db = crate::db::Db::connect_in_memory().await.unwrap();
        let resolver = IdentityResolver::new(VoteMode::Anonymous, b"salt".to_vec());

        let voter = resolver
            .require(&db, &HeaderMap::new(), None)
            .await
            .expect("anonymous resolution cannot fail");
        assert!(voter.user_id.is_none());
        assert_eq!(voter.voter_ref, hash_ip(b"salt", "unknown").unwrap());
    }

    #[tokio::test]
    async fn test_twitch_mode_requires_session() {
        let db = crate::db::Db::connect_in_memory().await.unwrap();
        let resolver = IdentityResolver::new(VoteMode::Twitch, Vec::new());

        let err = resolver.require(&db, &HeaderMap::new(), None).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized));

        assert!(resolver.resolve(&db, &HeaderMap::new(), None).await.is_none());
    }
}
