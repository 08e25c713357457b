//! Recent Readings Log

use crate::StorageError;
use chrono::SecondsFormat;
use csv::{Terminator, WriterBuilder};
use sensor_feed::{Metric, ZoneReading};
use std::collections::{BTreeMap, VecDeque};
use std::sync::Mutex;
use tracing::debug;

/// Readings kept in memory (100 ticks across 5 zones)
pub const DEFAULT_READING_RETENTION: usize = 500;
/// Rows written by one CSV export
pub const MAX_EXPORT_ROWS: usize = 100;
/// CSV export header
pub const CSV_HEADER: &str = "timestamp,zone,rainfall,vibration,pressure,temperature,humidity,seismic";

/// Bounded log of the most recent readings, oldest evicted first
pub struct ReadingLog {
    readings: Mutex<VecDeque<ZoneReading>>,
    max_records: usize,
}

impl ReadingLog {
    pub fn new(max_records: usize) -> Self {
        let max_records = max_records.max(1);
        Self {
            readings: Mutex::new(VecDeque::with_capacity(max_records)),
            max_records,
        }
    }

    /// Append readings in arrival order
    pub fn insert(&self, batch: impl IntoIterator<Item = ZoneReading>) -> Result<usize, StorageError> {
        let mut log = self.readings.lock().map_err(|e| {
            StorageError::DatabaseError(format!("Lock error: {}", e))
        })?;

        let mut inserted = 0;
        for reading in batch {
            // Enforce retention
            while log.len() >= self.max_records {
                log.pop_front();
            }
            log.push_back(reading);
            inserted += 1;
        }
        debug!("Stored {} readings ({} retained)", inserted, log.len());
        Ok(inserted)
    }

    /// Most recent readings first, optionally for one zone
    pub fn latest(&self, zone: Option<&str>, limit: usize) -> Result<Vec<ZoneReading>, StorageError> {
        let log = self.readings.lock().map_err(|e| {
            StorageError::DatabaseError(format!("Lock error: {}", e))
        })?;

        Ok(log
            .iter()
            .rev()
            .filter(|r| zone.map_or(true, |z| r.zone() == z))
            .take(limit)
            .cloned()
            .collect())
    }

    /// Newest reading of every zone, ordered by zone name
    pub fn latest_per_zone(&self) -> Result<Vec<ZoneReading>, StorageError> {
        let log = self.readings.lock().map_err(|e| {
            StorageError::DatabaseError(format!("Lock error: {}", e))
        })?;

        let mut newest: BTreeMap<&str, &ZoneReading> = BTreeMap::new();
        for reading in log.iter().rev() {
            newest.entry(reading.zone()).or_insert(reading);
        }
        Ok(newest.into_values().cloned().collect())
    }

    pub fn len(&self) -> usize {
        self.readings.lock().map(|l| l.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// CSV of the most recent readings (newest first, at most [`MAX_EXPORT_ROWS`])
    pub fn export_csv(&self, zone: Option<&str>) -> Result<String, StorageError> {
        let rows = self.latest(zone, MAX_EXPORT_ROWS)?;
        to_csv(&rows)
    }
}

impl Default for ReadingLog {
    fn default() -> Self {
        Self::new(DEFAULT_READING_RETENTION)
    }
}

/// Render readings as CSV, one row per reading; missing metrics are empty cells
pub fn to_csv(readings: &[ZoneReading]) -> Result<String, StorageError> {
    let mut writer = WriterBuilder::new()
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(CSV_HEADER.split(','))?;
    for reading in readings {
        let mut record = Vec::with_capacity(2 + Metric::ALL.len());
        record.push(reading.timestamp().to_rfc3339_opts(SecondsFormat::Millis, true));
        record.push(reading.zone().to_string());
        record.extend(
            Metric::ALL
                .iter()
                .map(|m| reading.value(*m).map(|v| v.to_string()).unwrap_or_default()),
        );
        writer.write_record(&record)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| StorageError::SerializationError(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| StorageError::SerializationError(e.to_string()))
}
