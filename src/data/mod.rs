//! Violation records and the upstream data source
//!
//! Records are kept exactly as the open-data API returns them: an open-ended
//! JSON object per violation. No schema is enforced beyond what filtering
//! needs, which is field lookup and coercion to a string.

pub mod violations;

pub use violations::{SocrataClient, UpstreamError};

use async_trait::async_trait;
use serde_json::{Map, Value};

/// A single violation record as returned by the upstream API
pub type Record = Map<String, Value>;

/// Source of violation records for a given year
///
/// Implemented by [`SocrataClient`] for the live API. The request pipeline
/// only depends on this trait, so tests can substitute their own source.
#[async_trait]
pub trait ViolationSource: Send + Sync {
    /// Fetches every record for `year`, in the order the source returned them
    async fn fetch(&self, year: u16) -> Result<Vec<Record>, UpstreamError>;
}

/// Returns the string form of `field` on `record` used for filter comparison
///
/// Missing fields and JSON `null` become the empty string. Strings are
/// returned as-is; numbers, booleans and nested values use their compact
/// JSON text.
pub fn field_as_string(record: &Record, field: &str) -> String {
    match record.get(field) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
