//! Saved Estimator Scenarios

use crate::StorageError;
use chrono::{DateTime, Utc};
use estimator::{PredictionResult, SimulationParameters};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Mutex;
use tracing::info;
use uuid::Uuid;

/// Scenarios retained by default
pub const DEFAULT_SCENARIO_RETENTION: usize = 10;

/// A saved estimator input/output pair. Never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub id: Uuid,
    pub name: String,
    pub parameters: SimulationParameters,
    pub result: PredictionResult,
    pub timestamp: DateTime<Utc>,
}

struct Inner {
    /// Newest at the front
    scenarios: VecDeque<Scenario>,
    saved_total: usize,
}

/// Fixed-size most-recent window of scenarios
pub struct ScenarioStore {
    inner: Mutex<Inner>,
    max_scenarios: usize,
}

impl ScenarioStore {
    pub fn new(max_scenarios: usize) -> Self {
        let max_scenarios = max_scenarios.max(1);
        Self {
            inner: Mutex::new(Inner {
                scenarios: VecDeque::with_capacity(max_scenarios),
                saved_total: 0,
            }),
            max_scenarios,
        }
    }

    /// Save a scenario, evicting the oldest beyond the retention bound.
    ///
    /// Unlabelled scenarios are named `Scenario N` from a running counter.
    pub fn save(
        &self,
        name: Option<String>,
        parameters: SimulationParameters,
        result: PredictionResult,
    ) -> Result<Scenario, StorageError> {
        let mut inner = self.inner.lock().map_err(|e| {
            StorageError::DatabaseError(format!("Lock error: {}", e))
        })?;

        inner.saved_total += 1;
        let name = name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| format!("Scenario {}", inner.saved_total));

        let scenario = Scenario {
            id: Uuid::new_v4(),
            name,
            parameters,
            result,
            timestamp: Utc::now(),
        };

        inner.scenarios.push_front(scenario.clone());
        while inner.scenarios.len() > self.max_scenarios {
            inner.scenarios.pop_back();
        }

        info!("Saved scenario '{}' ({})", scenario.name, scenario.id);
        Ok(scenario)
    }

    /// All retained scenarios, most recent first
    pub fn list(&self) -> Result<Vec<Scenario>, StorageError> {
        let inner = self.inner.lock().map_err(|e| {
            StorageError::DatabaseError(format!("Lock error: {}", e))
        })?;
        Ok(inner.scenarios.iter().cloned().collect())
    }

    /// Load one scenario
    pub fn get(&self, id: Uuid) -> Result<Scenario, StorageError> {
        let inner = self.inner.lock().map_err(|e| {
            StorageError::DatabaseError(format!("Lock error: {}", e))
        })?;
        inner
            .scenarios
            .iter()
            .find(|s| s.id == id)
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().map(|i| i.scenarios.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ScenarioStore {
    fn default() -> Self {
        Self::new(DEFAULT_SCENARIO_RETENTION)
    }
}
