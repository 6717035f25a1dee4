//! Query-string validation for `/api/violations`

use std::ops::RangeInclusive;

use crate::filter::FilterSet;
use crate::pagination::{PageRequest, DEFAULT_PAGE, MAX_PAGE_SIZE};
use crate::service::ViolationQuery;

use super::ApiError;

/// Years the dataset covers
pub const VALID_YEARS: RangeInclusive<u16> = 2019..=2025;

/// Turns raw query pairs into a validated query
///
/// `year` is required; `page` and `page_size` fall back to their defaults.
/// Every other parameter becomes a filter. Repeated parameters keep the last
/// value.
///
/// # Arguments
/// * `params` - Decoded query pairs in request order
///
/// # Returns
/// The validated query, or `ApiError::Validation` naming the bad parameter
pub fn parse_violation_query(params: &[(String, String)]) -> Result<ViolationQuery, ApiError> {
    let year = match last_value(params, "year") {
        Some(raw) => parse_year(raw)?,
        None => return Err(ApiError::Validation("year is required".to_string())),
    };

    let page = match last_value(params, "page") {
        Some(raw) => parse_positive("page", raw)?,
        None => DEFAULT_PAGE,
    };
    let page_size = match last_value(params, "page_size") {
        Some(raw) => parse_positive("page_size", raw)?,
        None => MAX_PAGE_SIZE,
    };

    Ok(ViolationQuery {
        year,
        page: PageRequest::new(page, page_size)?,
        filters: FilterSet::from_query(params.iter().map(|(k, v)| (k.as_str(), v.as_str()))),
    })
}

fn last_value<'a>(params: &'a [(String, String)], name: &str) -> Option<&'a str> {
    params
        .iter()
        .rev()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.as_str())
}

fn parse_year(raw: &str) -> Result<u16, ApiError> {
    let year: u16 = parse_digits(raw)
        .ok_or_else(|| ApiError::Validation(format!("year must be an integer, got '{}'", raw)))?;

    if !VALID_YEARS.contains(&year) {
        return Err(ApiError::Validation(format!(
            "year must be between {} and {}, got {}",
            VALID_YEARS.start(),
            VALID_YEARS.end(),
            year
        )));
    }
    Ok(year)
}

fn parse_positive(name: &str, raw: &str) -> Result<usize, ApiError> {
    parse_digits(raw).ok_or_else(|| {
        ApiError::Validation(format!("{} must be a positive integer, got '{}'", name, raw))
    })
}

/// Parses plain ASCII digits only: no sign, no surrounding whitespace
fn parse_digits<T: std::str::FromStr>(raw: &str) -> Option<T> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}
