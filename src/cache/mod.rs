//! In-memory cache of violation records, keyed by year
//!
//! Each year holds the most recent successful fetch together with the time it
//! was taken. Entries are never evicted; staleness is checked lazily on read,
//! so an expired entry stays available for stale-serving when a refresh
//! fails. Coordinating refreshes is left to the service layer.

mod store;

pub use store::{CacheEntry, ViolationCache, DEFAULT_TTL_SECS};
