//! Health and Metrics Routes

use axum::{extract::State, http::header, response::IntoResponse, Json};
use serde::Serialize;
use std::sync::Arc;

use alerting::AlertSummary;

use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// Health response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub version: String,
    pub uptime_seconds: u64,
    pub alerts: AlertSummary,
    pub readings: usize,
    pub zones: usize,
    pub scenarios: usize,
}

/// Health check handler
pub async fn get_health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        timestamp: chrono::Utc::now(),
        version: state.version.clone(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        alerts: state.engine.summary().await,
        readings: state.readings.len(),
        zones: state.monitor.zone_risks().await.len(),
        scenarios: state.scenarios.len(),
    })
}

/// Prometheus exposition
pub async fn get_metrics(State(state): State<Arc<AppState>>) -> ApiResult<impl IntoResponse> {
    let handle = state
        .metrics
        .as_ref()
        .ok_or_else(|| ApiError::Unavailable("metrics recorder not installed".to_string()))?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        handle.render(),
    ))
}
