//! Zone Monitor
//!
//! Periodically samples a `ReadingSource` into the reading log and
//! reclassifies every zone, raising alerts for warning/critical composites.

mod monitor;

pub use monitor::{Evaluation, Monitor, MonitorConfig};

use storage::StorageError;
use thiserror::Error;

/// Monitor errors
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}
