// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Time-boxed single-slot caches for upstream API data.
//!
//! One slot per resource, holding the last fetched value and when it was
//! fetched. There is no invalidation and no single-flight: concurrent
//! requests that find the slot stale may each refetch, which is fine at
//! fan-site traffic.

use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;

struct Entry<T> {
    data: T,
    fetched_at: DateTime<Utc>,
}

/// A single cached value with a fixed freshness window.
pub struct TimedSlot<T> {
    ttl: Duration,
    slot: RwLock<Option<Entry<T>>>,
}

impl<T: Clone> TimedSlot<T> {
    /// Create an empty slot whose entries stay fresh for `ttl_secs`.
    pub fn new(ttl_secs: i64) -> Self {
        Self {
            ttl: Duration::seconds(ttl_secs),
            slot: RwLock::new(None),
        }
    }

    /// Return the cached value if it is still fresh.
    pub async fn get(&self) -> Option<T> {
        self.get_at(Utc::now()).await
    }

    /// Freshness check against an explicit clock.
    pub async fn get_at(&self, now: DateTime<Utc>) -> Option<T> {
        let guard = self.slot.read().await;
        guard.as_ref().and_then(|entry| {
            if now.signed_duration_since(entry.fetched_at) < self.ttl {
                Some(entry.data.clone())
            } else {
                None
            }
        })
    }

    /// Store a freshly fetched value.
    pub async fn put(&self, data: T) {
        self.put_at(data, Utc::now()).await;
    }

    /// Store a value with an explicit fetch time.
    pub async fn put_at(&self, data: T, now: DateTime<Utc>) {
        let mut guard = self.slot.write().await;
        *guard = Some(Entry {
            data,
            fetched_at: now,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_empty_slot_misses() {
        let slot: TimedSlot<String> = TimedSlot::new(60);
        assert_eq!(slot.get().await, None);
    }

    #[tokio::test]
    async fn test_fresh_within_window() {
        let slot = TimedSlot::new(60);
        let t0 = Utc::now();
        slot.put_at("live".to_string(), t0).await;

        assert_eq!(
            slot.get_at(t0 + Duration::seconds(59)).await,
            Some("live".to_string())
        );
    }

    #[tokio::test]
    async fn test_stale_after_window() {
        let slot = TimedSlot::new(60);
        let t0 = Utc::now();
        slot.put_at("live".to_string(), t0).await;

        assert_eq!(slot.get_at(t0 + Duration::seconds(60)).await, None);
        assert_eq!(slot.get_at(t0 + Duration::seconds(3600)).await, None);
    }

    #[tokio::test]
    async fn test_put_refreshes() {
        let slot = TimedSlot::new(60);
        let t0 = Utc::now();
        slot.put_at("old".to_string(), t0).await;
        slot.put_at("new".to_string(), t0 + Duration::seconds(90)).await;

        assert_eq!(
            slot.get_at(t0 + Duration::seconds(120)).await,
            Some("new".to_string())
        );
    }
}
