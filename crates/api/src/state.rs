//! Shared Application State

use crate::config::AppConfig;
use alerting::AlertEngine;
use estimator::PredictiveEstimator;
use metrics_exporter_prometheus::PrometheusHandle;
use monitor::Monitor;
use std::sync::Arc;
use std::time::Instant;
use storage::{
    IncidentSink, MemoryIncidentSink, ReadingLog, ScenarioStore, SqliteIncidentSink, StorageError,
};
use tracing::info;

/// Application state shared across handlers.
///
/// Every component synchronizes internally, so handlers share it through a plain `Arc`.
pub struct AppState {
    pub engine: Arc<AlertEngine>,
    pub monitor: Arc<Monitor>,
    pub readings: Arc<ReadingLog>,
    pub scenarios: ScenarioStore,
    pub estimator: PredictiveEstimator,
    /// Prometheus exposition, when a recorder is installed
    pub metrics: Option<PrometheusHandle>,
    pub version: String,
    pub start_time: Instant,
}

impl AppState {
    /// Build the state, opening the SQLite incident log when one is configured
    pub async fn from_config(config: &AppConfig) -> Result<Self, StorageError> {
        let sink: Arc<dyn IncidentSink> = match &config.storage.incident_db {
            Some(url) => {
                info!("Incident log backed by {}", url);
                Arc::new(SqliteIncidentSink::connect(url).await?)
            }
            None => {
                info!("Incident log kept in memory");
                Arc::new(MemoryIncidentSink::new())
            }
        };
        Ok(Self::with_sink(config, sink))
    }

    /// Build the state around an existing incident log
    pub fn with_sink(config: &AppConfig, sink: Arc<dyn IncidentSink>) -> Self {
        let engine = Arc::new(AlertEngine::new(config.alerting.clone(), sink));
        let readings = Arc::new(ReadingLog::new(config.storage.reading_retention));
        let monitor = Arc::new(Monitor::new(
            config.monitor.clone(),
            Arc::new(config.threshold_table()),
            readings.clone(),
            engine.clone(),
        ));

        Self {
            engine,
            monitor,
            readings,
            scenarios: ScenarioStore::new(config.storage.scenario_retention),
            estimator: PredictiveEstimator::new(),
            metrics: None,
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: Instant::now(),
        }
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    pub fn with_estimator(mut self, estimator: PredictiveEstimator) -> Self {
        self.estimator = estimator;
        self
    }
}
