// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Streamhub API Server
//!
//! Backs a Twitch streamer's fan site: the stream-ideas voting board,
//! viewer sign-in via Twitch OAuth, and cached proxies over the Helix
//! API for live status, clips, VODs and the schedule.

use streamhub::{
    config::Config,
    db::Db,
    services::{IdeaService, IdentityResolver, TwitchClient, TwitchService, VoteService},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(
        port = config.port,
        channel = %config.channel_login,
        mode = ?config.vote_mode,
        "Starting Streamhub API"
    );

    // Open the database and run migrations
    let db = Db::connect(&config.database_url)
        .await
        .expect("Failed to open database");

    // Helix client + caches (one set per process)
    let twitch = TwitchService::new(
        TwitchClient::new(
            config.twitch_client_id.clone(),
            config.twitch_client_secret.clone(),
        ),
        config.channel_login.clone(),
    );

    // Separate OAuth client for viewer sign-in
    let auth_client = TwitchClient::new(
        config.twitch_auth_client_id.clone(),
        config.twitch_auth_client_secret.clone(),
    );

    // Voter identity strategy for this deployment
    let identity = IdentityResolver::new(config.vote_mode, config.ip_hash_key.clone());

    // Build shared state
    let state = Arc::new(AppState {
        ideas: IdeaService::new(db.clone()),
        votes: VoteService::new(db.clone()),
        config: config.clone(),
        db,
        identity,
        twitch,
        auth_client,
    });

    // Build router
    let app = streamhub::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("streamhub=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
