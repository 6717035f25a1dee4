//! Request pipeline: cache lookup, refresh, filtering and pagination
//!
//! [`ViolationService`] owns the upstream source and the cache. For each
//! query it serves the cached year if fresh, otherwise joins (or starts) the
//! year's in-flight refresh so concurrent misses share one upstream fetch and
//! its outcome, success or failure.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, Utc};
use futures::future::{BoxFuture, FutureExt, Shared};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::cache::{CacheEntry, ViolationCache, DEFAULT_TTL_SECS};
use crate::config::StalePolicy;
use crate::data::{Record, UpstreamError, ViolationSource};
use crate::filter::FilterSet;
use crate::pagination::{paginate, PageRequest};

/// Outcome of one refresh, cloned out to every request that awaited it
type RefreshOutcome = Result<CacheEntry, Arc<UpstreamError>>;

/// A refresh that any number of requests can await
type SharedRefresh = Shared<BoxFuture<'static, RefreshOutcome>>;

/// Where the served records came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheStatus {
    /// Fresh cache hit, or records fetched for this request
    Cached,
    /// Expired records served because the refresh failed
    Stale,
}

/// A validated violations query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViolationQuery {
    pub year: u16,
    pub page: PageRequest,
    pub filters: FilterSet,
}

/// Response body for a violations query
#[derive(Debug, Clone, Serialize)]
pub struct ViolationsPage {
    pub data: Vec<Record>,
    /// Number of records in `data`
    pub count: usize,
    /// Number of records matching the filters across all pages
    pub total_items: usize,
    pub page: usize,
    pub page_size: usize,
    pub total_pages: usize,
    pub status: CacheStatus,
}

/// Orchestrates cache, upstream source, filters and pagination
pub struct ViolationService {
    source: Arc<dyn ViolationSource>,
    cache: Arc<ViolationCache>,
    /// Refreshes currently running, at most one per year
    inflight: Arc<Mutex<HashMap<u16, SharedRefresh>>>,
    ttl: Duration,
    stale_policy: StalePolicy,
}

impl ViolationService {
    /// Creates a service with the default TTL and stale policy
    pub fn new(source: Arc<dyn ViolationSource>, cache: Arc<ViolationCache>) -> Self {
        Self {
            source,
            cache,
            inflight: Arc::new(Mutex::new(HashMap::new())),
            ttl: Duration::seconds(DEFAULT_TTL_SECS as i64),
            stale_policy: StalePolicy::default(),
        }
    }

    /// Sets how long a year's records stay fresh after they were fetched
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_stale_policy(mut self, stale_policy: StalePolicy) -> Self {
        self.stale_policy = stale_policy;
        self
    }

    pub fn cache(&self) -> &ViolationCache {
        &self.cache
    }

    /// Runs a query: records for the year, then filters, then the page window
    ///
    /// # Arguments
    /// * `query` - Validated year, filters and page window
    ///
    /// # Returns
    /// The requested page with totals and the cache status, or the upstream
    /// error when no records can be served
    pub async fn query(&self, query: &ViolationQuery) -> Result<ViolationsPage, UpstreamError> {
        let (entry, status) = self.records_for(query.year).await?;

        if !query.filters.is_empty() {
            debug!(year = query.year, filters = ?query.filters, "Applying filters");
        }
        let filtered = query.filters.apply(entry.records.iter());
        let page = paginate(&filtered, query.page.page, query.page.page_size);
        let data: Vec<Record> = page.items.iter().map(|record| (*record).clone()).collect();

        Ok(ViolationsPage {
            count: data.len(),
            data,
            total_items: page.total_items,
            page: query.page.page,
            page_size: query.page.page_size,
            total_pages: page.total_pages,
            status,
        })
    }

    /// Returns the records for `year`, refreshing them if missing or stale
    ///
    /// # Behavior
    /// - Fresh cache entry: returned as `Cached`
    /// - Missing or expired: joins the year's in-flight refresh, starting one
    ///   if none is running. Every request that joined gets that refresh's
    ///   outcome, including its failure
    /// - Fetch failure with an existing entry and `ServeStale`: the old entry
    ///   is returned as `Stale`
    /// - Any other fetch failure is returned as the error
    pub async fn records_for(&self, year: u16) -> Result<(CacheEntry, CacheStatus), UpstreamError> {
        if let Some(entry) = self.fresh_entry(year).await {
            debug!(year, "Serving violations from cache");
            return Ok((entry, CacheStatus::Cached));
        }

        let existing = self.cache.get(year).await;
        let refresh = {
            let mut inflight = self.inflight.lock().await;
            match inflight.get(&year) {
                Some(refresh) => {
                    debug!(year, "Joining in-flight refresh");
                    refresh.clone()
                }
                None => {
                    // A refresh may have finished between the first check and the lock.
                    if let Some(entry) = self.fresh_entry(year).await {
                        debug!(year, "Cache refreshed by a concurrent request");
                        return Ok((entry, CacheStatus::Cached));
                    }

                    info!(year, cached = existing.is_some(), "Cache is expired or empty, fetching new data");
                    let refresh = self.start_refresh(year);
                    inflight.insert(year, refresh.clone());
                    refresh
                }
            }
        };

        match refresh.await {
            Ok(entry) => Ok((entry, CacheStatus::Cached)),
            Err(err) => match (existing, self.stale_policy) {
                (Some(entry), StalePolicy::ServeStale) => {
                    warn!(year, error = %err, "Upstream fetch failed, serving stale data from cache");
                    Ok((entry, CacheStatus::Stale))
                }
                _ => {
                    error!(year, error = %err, "Upstream fetch failed");
                    Err(Arc::try_unwrap(err).unwrap_or_else(UpstreamError::Shared))
                }
            },
        }
    }

    /// Spawns the fetch for `year` and returns a handle every waiter can share
    ///
    /// The fetch runs on its own task, so it completes and fills the cache
    /// even when every request awaiting it has gone away. It drops itself
    /// from the in-flight map once its outcome is known; later misses start
    /// a new attempt.
    fn start_refresh(&self, year: u16) -> SharedRefresh {
        let source = Arc::clone(&self.source);
        let cache = Arc::clone(&self.cache);
        let inflight = Arc::clone(&self.inflight);
        let task_inflight = Arc::clone(&inflight);

        let task = tokio::spawn(async move {
            let started = Utc::now();
            let outcome = match source.fetch(year).await {
                Ok(records) => {
                    let entry = cache.put(year, records, started).await;
                    info!(year, records = entry.records.len(), "Cache updated");
                    Ok(entry)
                }
                Err(err) => Err(Arc::new(err)),
            };
            task_inflight.lock().await.remove(&year);
            outcome
        });

        async move {
            match task.await {
                Ok(outcome) => outcome,
                Err(e) => {
                    // The task died before it could deregister itself.
                    inflight.lock().await.remove(&year);
                    Err(Arc::new(UpstreamError::Interrupted(e.to_string())))
                }
            }
        }
        .boxed()
        .shared()
    }

    async fn fresh_entry(&self, year: u16) -> Option<CacheEntry> {
        self.cache
            .get(year)
            .await
            .filter(|entry| entry.is_fresh(Utc::now(), self.ttl))
    }
}
