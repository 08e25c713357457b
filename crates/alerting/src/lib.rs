//! Alerting
//!
//! Turns risk classifications into alerts, deduplicates them per zone and
//! category, and drives the acknowledge/resolve lifecycle with an audit trail.

mod alert;
mod engine;
mod filter;
mod notify;

pub use alert::{Alert, AlertId, AlertStatus, AlertType, Category, NewAlert, Priority};
pub use engine::{
    AlertConfig, AlertEngine, AuditStatus, RaiseOutcome, Transition, SYSTEM_ACTOR,
};
pub use filter::{AlertFilter, AlertSummary, StatusFilter};
pub use notify::Notification;

use storage::StorageError;
use thiserror::Error;

/// Alert engine errors
#[derive(Debug, Error)]
pub enum AlertError {
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Alert {id} is {status}, cannot {action}")]
    InvalidState {
        id: AlertId,
        status: AlertStatus,
        action: &'static str,
    },
    #[error("Alert not found: {0}")]
    NotFound(AlertId),
    #[error("Incident log did not answer within {0}ms")]
    SinkTimeout(u64),
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}
