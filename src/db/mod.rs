// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Database layer (sqlx over SQLite).

pub mod store;

pub use store::{Db, IdeaSort, VoteToggle};
