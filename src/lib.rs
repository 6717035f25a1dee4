//! MTA bus lane violations proxy
//!
//! Fetches violation records from the NY Open Data Socrata API, caches them
//! per year in memory, and serves them filtered and paginated over HTTP.

pub mod cache;
pub mod cli;
pub mod config;
pub mod data;
pub mod filter;
pub mod pagination;
pub mod service;
pub mod web;
