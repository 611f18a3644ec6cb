//! Timestamped cache wrapper.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// A persisted value together with the instant it was written.
///
/// Freshness is always judged against a caller-supplied horizon: the same
/// entry can be fresh for fallback purposes (30 min for weather) while the
/// UI already flags it as stale (15 min). The raw bytes stay on disk past
/// any horizon until overwritten; expiry is purely a read-side decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    pub value: T,
    pub timestamp: DateTime<Utc>,
}

impl<T> CacheEntry<T> {
    pub fn new(value: T, timestamp: DateTime<Utc>) -> Self {
        Self { value, timestamp }
    }

    /// Age of the entry at `now`.
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now - self.timestamp
    }

    /// True while the entry is strictly younger than `max_age`.
    pub fn is_fresh(&self, now: DateTime<Utc>, max_age: Duration) -> bool {
        self.age(now) < max_age
    }
}
