//! Prediction and Scenario Routes

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use estimator::{PredictionResult, SimulationParameters};
use storage::Scenario;

use crate::error::ApiResult;
use crate::extract::{ApiJson, ApiPath};
use crate::AppState;

/// Run the estimator on a parameter set
pub async fn estimate(
    State(state): State<Arc<AppState>>,
    ApiJson(params): ApiJson<SimulationParameters>,
) -> Json<PredictionResult> {
    Json(state.estimator.estimate(&params))
}

/// Save request; the result is recomputed when not supplied
#[derive(Debug, Deserialize)]
pub struct SaveScenarioRequest {
    pub name: Option<String>,
    #[serde(default)]
    pub parameters: SimulationParameters,
    pub result: Option<PredictionResult>,
}

#[derive(Debug, Serialize)]
pub struct ScenarioResponse {
    pub data: Vec<Scenario>,
    pub count: usize,
}

/// Saved scenarios, most recent first
pub async fn get_scenarios(State(state): State<Arc<AppState>>) -> ApiResult<Json<ScenarioResponse>> {
    let data = state.scenarios.list()?;
    Ok(Json(ScenarioResponse {
        count: data.len(),
        data,
    }))
}

pub async fn save_scenario(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<SaveScenarioRequest>,
) -> ApiResult<(StatusCode, Json<Scenario>)> {
    let result = match request.result {
        Some(result) => result,
        None => state.estimator.estimate(&request.parameters),
    };
    let name = request.name.filter(|n| !n.trim().is_empty());
    let scenario = state.scenarios.save(name, request.parameters, result)?;
    Ok((StatusCode::CREATED, Json(scenario)))
}

/// Reload one saved scenario
pub async fn get_scenario(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<Scenario>> {
    Ok(Json(state.scenarios.get(id)?))
}
