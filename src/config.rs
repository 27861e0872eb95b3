// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! Secrets are read once at startup and cached in memory for the lifetime
//! of the process.

use std::env;

/// Which identity strategy the voting board uses.
///
/// A deployment runs exactly one of these; they are never combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteMode {
    /// Voters are identified by a salted hash of their client IP.
    Anonymous,
    /// Voters must sign in with Twitch; identity is the user row.
    Twitch,
}

impl VoteMode {
    fn parse(raw: &str) -> Result<Self, ConfigError> {
        match raw {
            "anonymous" => Ok(VoteMode::Anonymous),
            "twitch" => Ok(VoteMode::Twitch),
            _ => Err(ConfigError::Invalid("VOTE_MODE")),
        }
    }
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// Twitch login of the channel this site fronts
    pub channel_login: String,
    /// Twitch Helix app client ID (public)
    pub twitch_client_id: String,
    /// Twitch OAuth client ID used for viewer sign-in
    pub twitch_auth_client_id: String,
    /// Frontend URL for OAuth redirects and CORS
    pub frontend_url: String,
    /// SQLite connection string
    pub database_url: String,
    /// Server port
    pub port: u16,
    /// Identity strategy for the ideas board
    pub vote_mode: VoteMode,

    // --- Secrets ---
    /// Twitch Helix app client secret (client-credentials grant)
    pub twitch_client_secret: String,
    /// Twitch OAuth client secret used for viewer sign-in
    pub twitch_auth_client_secret: String,
    /// JWT signing key for session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
    /// HMAC key for the signed OAuth state parameter
    pub oauth_state_key: Vec<u8>,
    /// Salt for anonymous voter IP hashing
    pub ip_hash_key: Vec<u8>,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            channel_login: "teststreamer".to_string(),
            twitch_client_id: "test_client_id".to_string(),
            twitch_auth_client_id: "test_auth_client_id".to_string(),
            frontend_url: "http://localhost:3000".to_string(),
            database_url: "sqlite::memory:".to_string(),
            port: 8080,
            vote_mode: VoteMode::Twitch,
            twitch_client_secret: "test_secret".to_string(),
            twitch_auth_client_secret: "test_auth_secret".to_string(),
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
            oauth_state_key: b"test_state_key".to_vec(),
            ip_hash_key: b"test_ip_hash_key".to_vec(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Secrets come from the environment in all deployments; a `.env` file
    /// is honored for local development.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let twitch_client_id = env::var("TWITCH_CLIENT_ID")
            .map_err(|_| ConfigError::Missing("TWITCH_CLIENT_ID"))?;
        let twitch_client_secret = env::var("TWITCH_CLIENT_SECRET")
            .map(|v| v.trim().to_string())
            .map_err(|_| ConfigError::Missing("TWITCH_CLIENT_SECRET"))?;
        let jwt_signing_key = env::var("JWT_SIGNING_KEY")
            .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
            .into_bytes();

        let vote_mode = match env::var("VOTE_MODE") {
            Ok(raw) => VoteMode::parse(raw.trim())?,
            Err(_) => VoteMode::Twitch,
        };

        // The original deployment reused the Helix client secret as the IP
        // hash salt; a dedicated IP_HASH_KEY overrides that.
        let ip_hash_key = env::var("IP_HASH_KEY")
            .map(String::into_bytes)
            .unwrap_or_else(|_| twitch_client_secret.clone().into_bytes());

        let oauth_state_key = env::var("OAUTH_STATE_KEY")
            .map(String::into_bytes)
            .unwrap_or_else(|_| jwt_signing_key.clone());

        Ok(Self {
            channel_login: env::var("TWITCH_CHANNEL_LOGIN")
                .map_err(|_| ConfigError::Missing("TWITCH_CHANNEL_LOGIN"))?,
            twitch_auth_client_id: env::var("TWITCH_AUTH_CLIENT_ID")
                .unwrap_or_else(|_| twitch_client_id.clone()),
            twitch_auth_client_secret: env::var("TWITCH_AUTH_CLIENT_SECRET")
                .map(|v| v.trim().to_string())
                .unwrap_or_else(|_| twitch_client_secret.clone()),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://streamhub.db?mode=rwc".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            vote_mode,
            twitch_client_id,
            twitch_client_secret,
            jwt_signing_key,
            oauth_state_key,
            ip_hash_key,
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}
