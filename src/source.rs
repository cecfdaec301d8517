//! # Data Source Module
//!
//! Seams to the collaborators the pipeline consumes: the readings store and
//! the device assignment registry.
//!
//! ## Key Types
//! - `SeriesSource`: fetch raw rows for a device and window
//! - `AssignmentSource`: look up the patient bound to a device
//! - `JsonFileSource`: both, backed by a JSON document on disk
//!
//! ## File layout
//! ```text
//! {
//!   "devices": {
//!     "Hospital03": {
//!       "patient": { "hn": "HN-0042", "name": "Somchai" },
//!       "readings": [ { "_time": "...", "heart_rate": 72, ... }, ... ]
//!     }
//!   }
//! }
//! ```
//! The file is re-read on every fetch so an external writer can append to it
//! while the dashboard is polling.

use crate::error::SourceError;
use crate::normalizer::{normalize, RawReading};
use crate::status::{Assignment, Patient};
use crate::window::TimeWindow;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Raw readings for a device. Order is not guaranteed.
pub trait SeriesSource: Send + Sync {
    fn fetch(
        &self,
        device_id: &str,
        window: &TimeWindow,
        now: DateTime<Utc>,
    ) -> Result<Vec<RawReading>, SourceError>;
}

pub trait AssignmentSource: Send + Sync {
    fn assignment(&self, device_id: &str) -> Result<Assignment, SourceError>;
}

#[derive(Debug, Deserialize)]
struct WardDocument {
    #[serde(default)]
    devices: BTreeMap<String, DeviceEntry>,
}

#[derive(Debug, Deserialize)]
struct DeviceEntry {
    #[serde(default)]
    patient: Option<PatientEntry>,
    #[serde(default)]
    readings: Vec<RawReading>,
}

#[derive(Debug, Deserialize)]
struct PatientEntry {
    hn: String,
    name: String,
}

/// File-backed source for both collaborators
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Device ids present in the document
    pub fn device_ids(&self) -> Result<Vec<String>, SourceError> {
        Ok(self.read_document()?.devices.into_keys().collect())
    }

    fn read_document(&self) -> Result<WardDocument, SourceError> {
        let contents = fs::read_to_string(&self.path).map_err(SourceError::ReadFailed)?;
        serde_json::from_str(&contents).map_err(SourceError::ParseFailed)
    }

    fn device(&self, device_id: &str) -> Result<DeviceEntry, SourceError> {
        self.read_document()?
            .devices
            .remove(device_id)
            .ok_or_else(|| SourceError::UnknownDevice(device_id.to_string()))
    }
}

impl SeriesSource for JsonFileSource {
    fn fetch(
        &self,
        device_id: &str,
        window: &TimeWindow,
        now: DateTime<Utc>,
    ) -> Result<Vec<RawReading>, SourceError> {
        let (start, end) = window.bounds(now);
        let entry = self.device(device_id)?;
        let total = entry.readings.len();

        // Untimed rows pass through; the normalizer decides what to do with them
        let rows: Vec<RawReading> = entry
            .readings
            .into_iter()
            .filter(|row| match normalize(row).time {
                Some(t) => t >= start && t <= end,
                None => true,
            })
            .collect();

        log::debug!(
            "Fetched {} of {} rows for {} in {}",
            rows.len(),
            total,
            device_id,
            window
        );

        Ok(rows)
    }
}

impl AssignmentSource for JsonFileSource {
    fn assignment(&self, device_id: &str) -> Result<Assignment, SourceError> {
        Ok(match self.device(device_id)?.patient {
            Some(p) => Assignment::Active(Patient {
                hn: p.hn,
                name: p.name,
            }),
            None => Assignment::Unassigned,
        })
    }
}
