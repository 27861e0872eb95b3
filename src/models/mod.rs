// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the application.

pub mod idea;
pub mod user;

pub use idea::{IdeaResponse, IdeaWithOwner, StreamIdea, Vote};
pub use user::{PublicUser, User};
