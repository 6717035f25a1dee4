//! Per-year cache store

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;

use crate::data::Record;

/// Default time-to-live for a year's records, in seconds
pub const DEFAULT_TTL_SECS: u64 = 3600;

/// The most recent successful fetch for one year
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// Year the records belong to
    pub year: u16,
    /// Records in upstream order, shared between concurrent readers
    pub records: Arc<Vec<Record>>,
    /// When the records were fetched
    pub fetched_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Returns true while the entry is no older than `ttl` at `now`
    ///
    /// The boundary is inclusive: an entry exactly `ttl` old is still fresh.
    pub fn is_fresh(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now - self.fetched_at <= ttl
    }
}

/// Shared cache of violation records keyed by year
///
/// Constructed once at startup and handed to the request pipeline; there is
/// no global state.
#[derive(Debug, Default)]
pub struct ViolationCache {
    entries: RwLock<HashMap<u16, CacheEntry>>,
}

impl ViolationCache {
    /// Creates an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the entry for `year`, fresh or not
    pub async fn get(&self, year: u16) -> Option<CacheEntry> {
        self.entries.read().await.get(&year).cloned()
    }

    /// Replaces whatever is cached for `year` and returns the new entry
    pub async fn put(&self, year: u16, records: Vec<Record>, fetched_at: DateTime<Utc>) -> CacheEntry {
        let entry = CacheEntry {
            year,
            records: Arc::new(records),
            fetched_at,
        };

        self.entries.write().await.insert(year, entry.clone());
        entry
    }

    /// Years currently held in the cache, ascending
    pub async fn years(&self) -> Vec<u16> {
        let mut years: Vec<u16> = self.entries.read().await.keys().copied().collect();
        years.sort_unstable();
        years
    }

    /// Number of years cached
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Returns true when no year has been cached yet
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}
