//! Socrata API client for the MTA Bus ACE violations dataset
//!
//! Fetches every non-exempt violation for a given year from the NY Open Data
//! portal, walking `$offset` pages until the API returns an empty page.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;
use tracing::{debug, info};

use super::{Record, ViolationSource};

/// Default Socrata endpoint for the MTA Bus ACE violations dataset
pub const DEFAULT_BASE_URL: &str = "https://data.ny.gov/resource/kh8p-hcbm.json";

/// Number of records requested per page
pub const PAGE_LIMIT: usize = 50_000;

/// Violation statuses that are always excluded server-side
pub const EXEMPT_STATUSES: [&str; 4] = [
    "EXEMPT - OTHER",
    "EXEMPT - EMERGENCY VEHICLE",
    "EXEMPT - BUS/PARATRANSIT",
    "EXEMPT - COMMERCIAL VEHICLE",
];

/// Timestamp column whose year component selects a year's records
const YEAR_FIELD: &str = "first_occurrence";

/// Errors that can occur when fetching violation data
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// The API answered with a non-success status
    #[error("Upstream returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// HTTP request failed (connection, timeout, ...)
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Failed to parse API response
    #[error("Failed to parse upstream response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The fetch task ended before producing a result
    #[error("Upstream fetch interrupted: {0}")]
    Interrupted(String),

    /// Failure of a fetch shared by several concurrent requests
    #[error(transparent)]
    Shared(Arc<UpstreamError>),
}

/// Client for the violations dataset on the Socrata API
#[derive(Debug, Clone)]
pub struct SocrataClient {
    /// HTTP client for making requests
    http_client: Client,
    /// Dataset endpoint (allows override for testing)
    base_url: String,
    /// Optional Socrata application token, sent as `X-App-Token`
    app_token: Option<String>,
    /// Records requested per page
    page_limit: usize,
}

impl SocrataClient {
    /// Creates a new SocrataClient against the public dataset endpoint
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Creates a new SocrataClient with a custom endpoint
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.into(),
            app_token: None,
            page_limit: PAGE_LIMIT,
        }
    }

    /// Rebuilds the HTTP client so every request is bounded by `timeout`
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, UpstreamError> {
        self.http_client = Client::builder().timeout(timeout).build()?;
        Ok(self)
    }

    /// Sets the application token sent with every request
    pub fn with_app_token(mut self, token: Option<String>) -> Self {
        self.app_token = token;
        self
    }

    /// Overrides the page size, mainly so tests can exercise paging cheaply
    pub fn with_page_limit(mut self, page_limit: usize) -> Self {
        self.page_limit = page_limit.max(1);
        self
    }

    /// Builds the SoQL `$where` clause for a year
    ///
    /// Exempt statuses are excluded permanently; string literals are single
    /// quoted and comma-joined.
    pub fn where_clause(year: u16) -> String {
        let statuses = EXEMPT_STATUSES
            .iter()
            .map(|status| format!("'{}'", status))
            .collect::<Vec<_>>()
            .join(", ");

        format!(
            "violation_status NOT IN ({}) AND date_extract_y({}) = {}",
            statuses, YEAR_FIELD, year
        )
    }

    /// Builds the URL for one page of results
    fn page_url(&self, year: u16, offset: usize) -> String {
        format!(
            "{}?$where={}&$limit={}&$offset={}",
            self.base_url,
            urlencoding::encode(&Self::where_clause(year)),
            self.page_limit,
            offset
        )
    }

    /// Fetches a single page starting at `offset`
    async fn fetch_page(&self, year: u16, offset: usize) -> Result<Vec<Record>, UpstreamError> {
        let mut request = self.http_client.get(self.page_url(year, offset));
        if let Some(ref token) = self.app_token {
            request = request.header("X-App-Token", token);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        Ok(serde_json::from_str(&text)?)
    }
}

impl Default for SocrataClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ViolationSource for SocrataClient {
    /// Fetches all pages for `year` and concatenates them in arrival order
    ///
    /// A single failed page aborts the whole fetch; nothing is returned for
    /// the pages that did succeed.
    ///
    /// # Arguments
    /// * `year` - Calendar year matched against `first_occurrence`
    ///
    /// # Returns
    /// Every non-exempt record for the year, or the first page's error
    async fn fetch(&self, year: u16) -> Result<Vec<Record>, UpstreamError> {
        info!(year, clause = %Self::where_clause(year), "Fetching violations from upstream");

        let mut records = Vec::new();
        let mut offset = 0;

        loop {
            let page = self.fetch_page(year, offset).await?;
            if page.is_empty() {
                break;
            }

            records.extend(page);
            offset += self.page_limit;
            debug!(year, offset, total = records.len(), "Fetched upstream page");
        }

        info!(year, total = records.len(), "Finished fetching violations");
        Ok(records)
    }
}
