//! Sensor and Zone Routes

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use risk_scorer::ZoneRisk;
use sensor_feed::{Metric, ZoneReading};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::warn;

use alerting::Alert;

use crate::error::{ApiError, ApiResult};
use crate::extract::{ApiJson, ApiQuery};
use crate::AppState;

const MAX_LIVE_LIMIT: usize = 500;

/// Query parameters for the live endpoint
#[derive(Debug, Deserialize)]
pub struct SensorQuery {
    pub zone: Option<String>,
    /// Maximum number of records to return
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    100
}

/// Response for the live endpoint
#[derive(Debug, Serialize)]
pub struct SensorResponse {
    pub data: Vec<ZoneReading>,
    pub meta: SensorMeta,
}

#[derive(Debug, Serialize)]
pub struct SensorMeta {
    pub count: usize,
    pub limit: usize,
}

/// Get recent readings, newest first
pub async fn get_live(
    State(state): State<Arc<AppState>>,
    ApiQuery(params): ApiQuery<SensorQuery>,
) -> ApiResult<Json<SensorResponse>> {
    let limit = params.limit.min(MAX_LIVE_LIMIT);
    let data = state.readings.latest(params.zone.as_deref(), limit)?;

    Ok(Json(SensorResponse {
        meta: SensorMeta {
            count: data.len(),
            limit,
        },
        data,
    }))
}

/// One pushed reading: `{"zone": "Zone B", "rainfall": 90, ...}`
#[derive(Debug, Deserialize)]
pub struct ReadingInput {
    pub zone: String,
    /// Defaults to the arrival time
    pub timestamp: Option<DateTime<Utc>>,
    /// Metric values keyed by name; unknown names are skipped
    #[serde(flatten)]
    pub values: BTreeMap<String, f64>,
}

#[derive(Debug, Deserialize)]
pub struct IngestRequest {
    pub readings: Vec<ReadingInput>,
}

#[derive(Debug, Serialize)]
pub struct IngestResponse {
    pub stored: usize,
    pub risks: Vec<ZoneRisk>,
    pub raised: Vec<Alert>,
    /// Metric names that were not recognised, once each
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ignored: Vec<String>,
}

/// Push readings; they are stored, classified, and may raise alerts
pub async fn post_readings(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<IngestRequest>,
) -> ApiResult<(StatusCode, Json<IngestResponse>)> {
    if request.readings.is_empty() {
        return Err(ApiError::Validation("readings must not be empty".to_string()));
    }

    let now = Utc::now();
    let mut batch = Vec::with_capacity(request.readings.len());
    let mut ignored = BTreeSet::new();
    for input in request.readings {
        if input.zone.trim().is_empty() {
            return Err(ApiError::Validation("zone must not be empty".to_string()));
        }
        let mut reading = ZoneReading::new(input.zone.trim(), input.timestamp.unwrap_or(now));
        for (name, value) in input.values {
            match name.parse::<Metric>() {
                Ok(metric) => reading = reading.with(metric, value),
                Err(e) => {
                    warn!(zone = %reading.zone(), "Skipping reading value: {}", e);
                    ignored.insert(name);
                }
            }
        }
        batch.push(reading);
    }

    let stored = batch.len();
    let evaluation = state.monitor.ingest(batch).await?;

    Ok((
        StatusCode::CREATED,
        Json(IngestResponse {
            stored,
            risks: evaluation.risks,
            raised: evaluation.raised,
            ignored: ignored.into_iter().collect(),
        }),
    ))
}

#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    pub zone: Option<String>,
}

/// Download recent readings as CSV
pub async fn export_csv(
    State(state): State<Arc<AppState>>,
    ApiQuery(params): ApiQuery<ExportQuery>,
) -> ApiResult<impl IntoResponse> {
    let csv = state.readings.export_csv(params.zone.as_deref())?;
    let filename = format!(
        "attachment; filename=\"sensor-data-{}.csv\"",
        Utc::now().format("%Y-%m-%d")
    );

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, filename),
        ],
        csv,
    ))
}

/// Zone risk as rendered by the risk indicator
#[derive(Debug, Serialize)]
pub struct ZoneRiskView {
    #[serde(flatten)]
    pub risk: ZoneRisk,
    /// `SAFE`, `WARNING` or `DANGER`
    pub indicator: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ZoneRiskResponse {
    pub zones: Vec<ZoneRiskView>,
}

/// Latest risk per zone
pub async fn get_zone_risk(State(state): State<Arc<AppState>>) -> Json<ZoneRiskResponse> {
    let zones = state
        .monitor
        .zone_risks()
        .await
        .into_iter()
        .map(|risk| ZoneRiskView {
            indicator: risk.level().indicator(),
            risk,
        })
        .collect();

    Json(ZoneRiskResponse { zones })
}
