//! Monitor Loop Implementation

use crate::MonitorError;
use alerting::{Alert, AlertEngine};
use chrono::Utc;
use risk_scorer::{assess, RiskLevel, ThresholdTable, ZoneRisk};
use sensor_feed::{ReadingSource, SimulatedSource, ZoneReading, DEFAULT_ZONES};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use storage::ReadingLog;
use tokio::sync::{watch, RwLock};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Configuration for the monitor loop
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Run the simulated feed at startup
    pub enabled: bool,
    /// Sampling period in milliseconds (default: 5000)
    pub sample_interval_ms: u64,
    /// Reclassification period in milliseconds (default: 30000)
    pub classify_interval_ms: u64,
    /// Zones produced by the simulated feed
    pub zones: Vec<String>,
    /// Simulator seed; random when unset
    pub seed: Option<u64>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            sample_interval_ms: 5_000,
            classify_interval_ms: 30_000,
            zones: DEFAULT_ZONES.iter().map(|z| z.to_string()).collect(),
            seed: None,
        }
    }
}

impl MonitorConfig {
    pub fn sample_interval(&self) -> Duration {
        Duration::from_millis(self.sample_interval_ms.max(1))
    }

    pub fn classify_interval(&self) -> Duration {
        Duration::from_millis(self.classify_interval_ms.max(1))
    }

    /// Simulated feed over the configured zones
    pub fn simulated_source(&self) -> SimulatedSource {
        let seed = self.seed.unwrap_or_else(rand::random);
        info!("Simulated feed seeded with {}", seed);
        SimulatedSource::new(self.zones.clone(), seed)
    }
}

/// What one classification pass produced
#[derive(Debug, Clone, Default)]
pub struct Evaluation {
    /// One entry per evaluated reading
    pub risks: Vec<ZoneRisk>,
    /// Alerts created by this pass (suppressed duplicates excluded)
    pub raised: Vec<Alert>,
}

/// Drives readings through the scorer into the alert engine
pub struct Monitor {
    config: MonitorConfig,
    thresholds: Arc<ThresholdTable>,
    readings: Arc<ReadingLog>,
    engine: Arc<AlertEngine>,
    /// Latest risk per zone
    board: RwLock<BTreeMap<String, ZoneRisk>>,
}

impl Monitor {
    pub fn new(
        config: MonitorConfig,
        thresholds: Arc<ThresholdTable>,
        readings: Arc<ReadingLog>,
        engine: Arc<AlertEngine>,
    ) -> Self {
        info!(
            "Monitor created: sample every {:?}, classify every {:?}, {} thresholds",
            config.sample_interval(),
            config.classify_interval(),
            thresholds.len()
        );
        Self {
            config,
            thresholds,
            readings,
            engine,
            board: RwLock::new(BTreeMap::new()),
        }
    }

    /// Store a batch in the reading log without classifying it
    pub fn record(&self, batch: Vec<ZoneReading>) -> Result<usize, MonitorError> {
        let stored = self.readings.insert(batch)?;
        metrics::counter!("hazard_readings_ingested_total").increment(stored as u64);
        Ok(stored)
    }

    /// Store a batch and classify it right away
    pub async fn ingest(&self, batch: Vec<ZoneReading>) -> Result<Evaluation, MonitorError> {
        self.record(batch.clone())?;
        Ok(self.evaluate(&batch).await)
    }

    /// Classify the latest reading of every zone
    pub async fn reclassify(&self) -> Result<Evaluation, MonitorError> {
        let latest = self.readings.latest_per_zone()?;
        let evaluation = self.evaluate(&latest).await;
        debug!(
            "Reclassified {} zones, {} alerts raised",
            evaluation.risks.len(),
            evaluation.raised.len()
        );
        Ok(evaluation)
    }

    /// Score readings, refresh the board and raise alerts for alerting composites
    pub async fn evaluate(&self, readings: &[ZoneReading]) -> Evaluation {
        let mut evaluation = Evaluation::default();

        for reading in readings {
            let risk = assess(reading, &self.thresholds);

            if risk.level().is_alerting() {
                if let Some(alert) = self.engine.raise(&risk.composite).await.created() {
                    evaluation.raised.push(alert.clone());
                }
            }

            {
                let mut board = self.board.write().await;
                let stale = board
                    .get(&risk.zone)
                    .is_some_and(|current| current.timestamp > risk.timestamp);
                if !stale {
                    board.insert(risk.zone.clone(), risk.clone());
                }
            }
            evaluation.risks.push(risk);
        }

        let board = self.board.read().await;
        let critical = board
            .values()
            .filter(|r| r.level() == RiskLevel::Critical)
            .count();
        metrics::gauge!("hazard_zones_critical").set(critical as f64);

        evaluation
    }

    /// Latest risk per zone, ordered by zone
    pub async fn zone_risks(&self) -> Vec<ZoneRisk> {
        self.board.read().await.values().cloned().collect()
    }

    /// Sample `source` and reclassify on their configured periods until `shutdown` flips to true
    pub async fn run<S: ReadingSource + ?Sized>(
        &self,
        source: &mut S,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<(), MonitorError> {
        info!("Starting monitor loop with source '{}'", source.name());

        let mut sample_tick = tokio::time::interval(self.config.sample_interval());
        sample_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut classify_tick = tokio::time::interval(self.config.classify_interval());
        classify_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;

                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                _ = sample_tick.tick() => {
                    let batch = source.sample(Utc::now());
                    if !batch.is_empty() {
                        if let Err(e) = self.record(batch) {
                            warn!("Failed to store readings from '{}': {}", source.name(), e);
                        }
                    }
                }
                _ = classify_tick.tick() => {
                    if let Err(e) = self.reclassify().await {
                        warn!("Reclassification failed: {}", e);
                    }
                }
            }
        }

        info!("Monitor loop stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alerting::{AlertConfig, AlertFilter, AlertType};
    use sensor_feed::{Metric, ScriptedSource};
    use storage::MemoryIncidentSink;

    fn monitor(config: MonitorConfig) -> (Arc<Monitor>, Arc<AlertEngine>, Arc<ReadingLog>) {
        let engine = Arc::new(AlertEngine::new(
            AlertConfig::default(),
            Arc::new(MemoryIncidentSink::new()),
        ));
        let readings = Arc::new(ReadingLog::default());
        let monitor = Monitor::new(
            config,
            Arc::new(ThresholdTable::default()),
            readings.clone(),
            engine.clone(),
        );
        (Arc::new(monitor), engine, readings)
    }

    fn reading(zone: &str, rainfall: f64) -> ZoneReading {
        ZoneReading::new(zone, Utc::now())
            .with(Metric::Rainfall, rainfall)
            .with(Metric::Vibration, 10.0)
            .with(Metric::Pressure, 20.0)
    }

    #[test]
    fn test_default_config() {
        let config = MonitorConfig::default();
        assert_eq!(config.sample_interval(), Duration::from_secs(5));
        assert_eq!(config.classify_interval(), Duration::from_secs(30));
        assert_eq!(config.zones.len(), 5);
    }

    #[tokio::test]
    async fn test_ingest_raises_for_critical_zone() {
        let (monitor, engine, readings) = monitor(MonitorConfig::default());

        let evaluation = monitor
            .ingest(vec![reading("Zone B", 90.0), reading("Zone A", 10.0)])
            .await
            .unwrap();

        assert_eq!(readings.len(), 2);
        assert_eq!(evaluation.raised.len(), 1);
        assert_eq!(evaluation.raised[0].zone, "Zone B");
        assert_eq!(evaluation.raised[0].alert_type, AlertType::Critical);

        let board = monitor.zone_risks().await;
        assert_eq!(board.len(), 2);
        assert_eq!(board[0].zone, "Zone A");
        assert_eq!(board[0].level(), RiskLevel::Normal);
        assert_eq!(board[1].level(), RiskLevel::Critical);
        assert_eq!(engine.len().await, 1);
    }

    #[tokio::test]
    async fn test_reclassify_does_not_duplicate_alerts() {
        let (monitor, engine, _) = monitor(MonitorConfig::default());
        monitor.record(vec![reading("Zone C", 65.0)]).unwrap();

        let first = monitor.reclassify().await.unwrap();
        assert_eq!(first.raised.len(), 1);
        let second = monitor.reclassify().await.unwrap();
        assert!(second.raised.is_empty());

        let alerts = engine.alerts(&AlertFilter::default()).await;
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].alert_type, AlertType::Warning);
    }

    #[tokio::test]
    async fn test_board_keeps_newest_reading() {
        let (monitor, _, _) = monitor(MonitorConfig::default());
        let newer = reading("Zone D", 10.0);
        let older = ZoneReading::new("Zone D", newer.timestamp() - chrono::Duration::seconds(60))
            .with(Metric::Rainfall, 90.0);

        monitor.evaluate(&[newer]).await;
        monitor.evaluate(&[older]).await;

        let board = monitor.zone_risks().await;
        assert_eq!(board[0].level(), RiskLevel::Normal);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_samples_and_classifies_until_shutdown() {
        let config = MonitorConfig {
            sample_interval_ms: 5_000,
            classify_interval_ms: 30_000,
            ..Default::default()
        };
        let (monitor, engine, readings) = monitor(config);
        let mut source = ScriptedSource::new(vec![
            vec![reading("Zone A", 10.0)],
            vec![reading("Zone E", 95.0)],
        ]);

        let (tx, rx) = watch::channel(false);
        let task = {
            let monitor = Arc::clone(&monitor);
            tokio::spawn(async move { monitor.run(&mut source, rx).await })
        };

        tokio::time::sleep(Duration::from_secs(31)).await;
        tx.send(true).unwrap();
        task.await.unwrap().unwrap();

        assert_eq!(readings.len(), 2);
        let alerts = engine.alerts(&AlertFilter::default()).await;
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].zone, "Zone E");
    }
}
