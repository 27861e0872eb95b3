// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Streamhub: API server for a Twitch streamer's fan site.
//!
//! This crate provides the backend for the crowd-sourced stream-ideas
//! voting board, the Twitch OAuth sign-in flow, and the cached
//! read-through proxies over the Twitch Helix API that the site and
//! broadcast overlay consume.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::Db;
use services::{IdeaService, IdentityResolver, TwitchClient, TwitchService, VoteService};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: Db,
    pub ideas: IdeaService,
    pub votes: VoteService,
    pub identity: IdentityResolver,
    pub twitch: TwitchService,
    /// OAuth client for viewer sign-in (separate credentials from the
    /// Helix app client).
    pub auth_client: TwitchClient,
}
