//! Route handlers

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};

use crate::service::ViolationsPage;

use super::{params::parse_violation_query, ApiError, AppState};

/// Liveness response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    /// Years currently held in the cache
    pub cached_years: Vec<u16>,
}

/// `GET /`
pub async fn index() -> Json<Value> {
    Json(json!({ "message": "Welcome to the MTA Datathon API Backend!" }))
}

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        cached_years: state.service.cache().years().await,
    })
}

/// `GET /api/violations?year=..&page=..&page_size=..&<field>=<value>..`
pub async fn list_violations(
    State(state): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Json<ViolationsPage>, ApiError> {
    let query = parse_violation_query(&params)?;
    let page = state.service.query(&query).await?;
    Ok(Json(page))
}
