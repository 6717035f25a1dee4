//! Case-insensitive equality filtering over violation records
//!
//! Every query parameter that is not reserved for paging or cache selection
//! becomes a `field = value` predicate. A record passes when all predicates
//! match, comparing the lowercased string form of the field against the
//! lowercased expected value.

use std::collections::BTreeMap;

use crate::data::{field_as_string, Record};

/// Query parameters that never become filter predicates
pub const RESERVED_PARAMS: [&str; 3] = ["year", "page", "page_size"];

/// A set of `field = value` equality predicates, combined with AND
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSet {
    /// Field name to lowercased expected value
    predicates: BTreeMap<String, String>,
}

impl FilterSet {
    /// Creates a set with no predicates, which matches every record
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a filter set from raw query parameters
    ///
    /// Reserved parameters are skipped. When a field repeats, the last value
    /// wins.
    pub fn from_query<I, K, V>(params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: AsRef<str>,
    {
        let mut filters = Self::new();
        for (field, expected) in params {
            filters.insert(field, expected.as_ref());
        }
        filters
    }

    /// Adds a predicate, returning false if `field` is reserved
    pub fn insert(&mut self, field: impl Into<String>, expected: &str) -> bool {
        let field = field.into();
        if RESERVED_PARAMS.contains(&field.as_str()) {
            return false;
        }

        self.predicates.insert(field, expected.to_lowercase());
        true
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// Number of field predicates
    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    /// Iterates predicates as `(field, lowercased expected value)`
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.predicates.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Returns true if `record` satisfies every predicate
    ///
    /// A field missing from the record compares as the empty string, so a
    /// predicate with an empty expected value matches it.
    pub fn matches(&self, record: &Record) -> bool {
        self.predicates
            .iter()
            .all(|(field, expected)| field_as_string(record, field).to_lowercase() == *expected)
    }

    /// Keeps the records that match, preserving their relative order
    pub fn apply<'a, I>(&self, records: I) -> Vec<&'a Record>
    where
        I: IntoIterator<Item = &'a Record>,
    {
        records.into_iter().filter(|record| self.matches(record)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            _ => panic!("test record must be a JSON object"),
        }
    }

    fn sample_records() -> Vec<Record> {
        vec![
            record(json!({"id": "1", "bus_route_id": "M15+", "violation_status": "VIOLATION ISSUED", "vehicle_id": 101})),
            record(json!({"id": "2", "bus_route_id": "BX12+", "violation_status": "TECHNICAL ISSUE/OTHER", "vehicle_id": 102})),
            record(json!({"id": "3", "bus_route_id": "m15+", "violation_status": "Violation Issued", "vehicle_id": 101})),
            record(json!({"id": "4", "bus_route_id": "M15+", "violation_status": "DRIVER/VEHICLE INFO MISSING"})),
        ]
    }

    fn ids(records: &[&Record]) -> Vec<String> {
        records.iter().map(|r| field_as_string(r, "id")).collect()
    }

    #[test]
    fn test_reserved_params_are_excluded() {
        let filters = FilterSet::from_query([
            ("year", "2023"),
            ("page", "2"),
            ("page_size", "10"),
            ("bus_route_id", "M15+"),
        ]);

        assert_eq!(filters.len(), 1);
        assert_eq!(filters.iter().collect::<Vec<_>>(), vec![("bus_route_id", "m15+")]);
    }

    #[test]
    fn test_insert_rejects_reserved_field() {
        let mut filters = FilterSet::new();
        assert!(!filters.insert("page", "1"));
        assert!(filters.insert("stop_id", "400123"));
        assert_eq!(filters.len(), 1);
    }

    #[test]
    fn test_last_repeated_param_wins() {
        let filters = FilterSet::from_query([("bus_route_id", "M15+"), ("bus_route_id", "BX12+")]);
        assert_eq!(filters.iter().collect::<Vec<_>>(), vec![("bus_route_id", "bx12+")]);
    }

    #[test]
    fn test_empty_filter_set_is_identity() {
        let records = sample_records();
        let filtered = FilterSet::new().apply(&records);

        assert_eq!(ids(&filtered), vec!["1", "2", "3", "4"]);
    }

    #[test]
    fn test_match_is_case_insensitive_and_order_preserving() {
        let records = sample_records();
        let filters = FilterSet::from_query([("violation_status", "violation issued")]);

        assert_eq!(ids(&filters.apply(&records)), vec!["1", "3"]);
    }

    #[test]
    fn test_all_predicates_must_match() {
        let records = sample_records();
        let filters = FilterSet::from_query([("bus_route_id", "M15+"), ("violation_status", "VIOLATION ISSUED")]);

        assert_eq!(ids(&filters.apply(&records)), vec!["1", "3"]);

        let none = FilterSet::from_query([("bus_route_id", "BX12+"), ("violation_status", "VIOLATION ISSUED")]);
        assert!(none.apply(&records).is_empty());
    }

    #[test]
    fn test_numeric_fields_compare_as_strings() {
        let records = sample_records();
        let filters = FilterSet::from_query([("vehicle_id", "101")]);

        assert_eq!(ids(&filters.apply(&records)), vec!["1", "3"]);
    }

    #[test]
    fn test_missing_field_matches_empty_expected_value() {
        let records = sample_records();

        let empty = FilterSet::from_query([("vehicle_id", "")]);
        assert_eq!(ids(&empty.apply(&records)), vec!["4"]);

        let absent = FilterSet::from_query([("stop_name", "anything")]);
        assert!(absent.apply(&records).is_empty());
    }

    #[test]
    fn test_filters_compose_in_any_order() {
        let records = sample_records();
        let route = FilterSet::from_query([("bus_route_id", "m15+")]);
        let status = FilterSet::from_query([("violation_status", "violation issued")]);
        let both = FilterSet::from_query([("bus_route_id", "m15+"), ("violation_status", "violation issued")]);

        let route_then_status = status.apply(route.apply(&records));
        let status_then_route = route.apply(status.apply(&records));
        let at_once = both.apply(&records);

        assert_eq!(ids(&route_then_status), ids(&at_once));
        assert_eq!(ids(&status_then_route), ids(&at_once));
    }
}
