//! Alert Routes

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use alerting::{
    Alert, AlertFilter, AlertId, AlertSummary, AlertType, NewAlert, Notification, RaiseOutcome,
    StatusFilter, Transition,
};
use storage::IncidentEntry;

use crate::error::{ApiError, ApiResult};
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::AppState;

/// Type filter of the alerts page
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeFilter {
    #[default]
    All,
    Critical,
    Warning,
    Info,
}

impl TypeFilter {
    fn alert_type(self) -> Option<AlertType> {
        match self {
            TypeFilter::All => None,
            TypeFilter::Critical => Some(AlertType::Critical),
            TypeFilter::Warning => Some(AlertType::Warning),
            TypeFilter::Info => Some(AlertType::Info),
        }
    }
}

/// Query parameters for the alerts endpoint
#[derive(Debug, Deserialize)]
pub struct AlertQuery {
    #[serde(rename = "type", default)]
    pub alert_type: TypeFilter,
    #[serde(default)]
    pub status: StatusFilter,
    /// Maximum number of records
    pub limit: Option<usize>,
}

/// Response for the alerts endpoint
#[derive(Debug, Serialize)]
pub struct AlertResponse {
    pub data: Vec<Alert>,
    pub count: usize,
    pub summary: AlertSummary,
}

/// List alerts, newest first
pub async fn get_alerts(
    State(state): State<Arc<AppState>>,
    ApiQuery(params): ApiQuery<AlertQuery>,
) -> Json<AlertResponse> {
    let filter = AlertFilter {
        alert_type: params.alert_type.alert_type(),
        status: params.status,
        limit: params.limit,
    };
    let data = state.engine.alerts(&filter).await;
    let summary = state.engine.summary().await;

    Json(AlertResponse {
        count: data.len(),
        summary,
        data,
    })
}

/// Manual raise request; `actor` defaults to `operator`
#[derive(Debug, Deserialize)]
pub struct RaiseRequest {
    #[serde(flatten)]
    pub alert: NewAlert,
    #[serde(default = "default_actor")]
    pub actor: String,
}

fn default_actor() -> String {
    "operator".to_string()
}

#[derive(Debug, Serialize)]
pub struct RaiseResponse {
    /// False when an open alert already covered the zone and category
    pub created: bool,
    pub alert: Alert,
}

/// Raise an alert by hand
pub async fn post_alert(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<RaiseRequest>,
) -> ApiResult<(StatusCode, Json<RaiseResponse>)> {
    match state.engine.raise_manual(request.alert, &request.actor).await? {
        RaiseOutcome::Created(alert) => Ok((
            StatusCode::CREATED,
            Json(RaiseResponse {
                created: true,
                alert,
            }),
        )),
        RaiseOutcome::Suppressed(alert) => Ok((
            StatusCode::OK,
            Json(RaiseResponse {
                created: false,
                alert,
            }),
        )),
        RaiseOutcome::NotAlerting => Err(ApiError::Validation(
            "alert type does not raise an alert".to_string(),
        )),
    }
}

/// Get one alert
pub async fn get_alert(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<String>,
) -> ApiResult<Json<Alert>> {
    Ok(Json(state.engine.alert(&AlertId::from(id)).await?))
}

#[derive(Debug, Deserialize)]
pub struct AcknowledgeRequest {
    pub actor: String,
}

pub async fn acknowledge(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<String>,
    ApiJson(request): ApiJson<AcknowledgeRequest>,
) -> ApiResult<Json<Transition>> {
    let transition = state
        .engine
        .acknowledge(&AlertId::from(id), &request.actor)
        .await?;
    Ok(Json(transition))
}

#[derive(Debug, Deserialize)]
pub struct ResolveRequest {
    pub actor: String,
    #[serde(default)]
    pub note: String,
}

pub async fn resolve(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<String>,
    ApiJson(request): ApiJson<ResolveRequest>,
) -> ApiResult<Json<Transition>> {
    let transition = state
        .engine
        .resolve(&AlertId::from(id), &request.actor, &request.note)
        .await?;
    Ok(Json(transition))
}

#[derive(Debug, Serialize)]
pub struct IncidentResponse {
    pub data: Vec<IncidentEntry>,
    pub count: usize,
}

/// Incident trail of one alert, oldest first
pub async fn get_alert_incidents(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<String>,
) -> ApiResult<Json<IncidentResponse>> {
    let data = state.engine.incidents(&AlertId::from(id)).await?;
    Ok(Json(IncidentResponse {
        count: data.len(),
        data,
    }))
}

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<usize>,
}

/// Newest incident entries across all alerts
pub async fn get_incidents(
    State(state): State<Arc<AppState>>,
    ApiQuery(params): ApiQuery<LimitQuery>,
) -> ApiResult<Json<IncidentResponse>> {
    let data = state
        .engine
        .recent_incidents(params.limit.unwrap_or(50).min(500))
        .await?;
    Ok(Json(IncidentResponse {
        count: data.len(),
        data,
    }))
}

#[derive(Debug, Serialize)]
pub struct NotificationResponse {
    pub data: Vec<Notification>,
    pub count: usize,
}

/// Recent critical-alert notifications, newest first
pub async fn get_notifications(
    State(state): State<Arc<AppState>>,
    ApiQuery(params): ApiQuery<LimitQuery>,
) -> Json<NotificationResponse> {
    let data = state
        .engine
        .recent_notifications(params.limit.unwrap_or(20))
        .await;
    Json(NotificationResponse {
        count: data.len(),
        data,
    })
}
