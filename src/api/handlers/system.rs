//! System endpoints: health check, supported schools.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;

use crate::app_state::AppState;

/// Health check response.
#[derive(Debug, Serialize)]
struct HealthResponse {
    status: String,
    timestamp: String,
    version: String,
    school: &'static str,
}

/// `GET /health`: Service health status.
pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
            timestamp: Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            school: state.subscriptions.school(),
        }),
    )
}

/// Supported school info.
#[derive(Debug, Serialize)]
struct SchoolInfo {
    school: &'static str,
    active: bool,
}

/// `GET /config/schools`: List schools with a registered status provider.
pub async fn schools_handler(State(state): State<AppState>) -> impl IntoResponse {
    let active = state.subscriptions.school();
    let schools: Vec<SchoolInfo> = state
        .schools
        .iter()
        .map(|&school| SchoolInfo {
            school,
            active: school == active,
        })
        .collect();
    (StatusCode::OK, Json(schools))
}

/// System routes mounted at the root level (not under /api/v1).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_handler))
        .route("/config/schools", get(schools_handler))
}
