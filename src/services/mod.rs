// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod cache;
pub mod identity;
pub mod ideas;
pub mod twitch;
pub mod votes;

pub use cache::TimedSlot;
pub use identity::{IdentityResolver, Voter};
pub use ideas::IdeaService;
pub use twitch::{TwitchClient, TwitchService};
pub use votes::VoteService;
