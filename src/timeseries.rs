//! # Vital-Sign Time Series Module
//!
//! Canonical reading type and the ordered per-device series every pipeline
//! stage consumes.
//!
//! ## Missing values
//! Continuous fields are `Option<f64>`. `None` means the sample did not carry
//! the field; arithmetic stages read it through `value_or_zero`, so a missing
//! heart rate behaves like a literal 0 downstream (status logic reads that as
//! "no signal").

use chrono::{DateTime, Utc};
use std::fmt;

/// One of the four plotted channels of a reading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VitalField {
    HeartRate,
    Temperature,
    BatteryPercent,
    Posture,
}

impl VitalField {
    pub fn all() -> [VitalField; 4] {
        [
            VitalField::HeartRate,
            VitalField::Temperature,
            VitalField::BatteryPercent,
            VitalField::Posture,
        ]
    }

    pub fn key(&self) -> &'static str {
        match self {
            VitalField::HeartRate => "heart_rate",
            VitalField::Temperature => "temperature",
            VitalField::BatteryPercent => "battery_percent",
            VitalField::Posture => "posture",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            VitalField::HeartRate => "bpm",
            VitalField::Temperature => "°C",
            VitalField::BatteryPercent => "%",
            VitalField::Posture => "",
        }
    }
}

impl fmt::Display for VitalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Display state for the posture code reported by the wearable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Posture {
    /// Lying down or sitting
    Resting,
    /// Standing or walking slowly
    Upright,
    /// Fast walk or light run
    Brisk,
    Fall,
    /// Code outside 0..=3, kept numerically
    Unknown(i64),
}

impl Posture {
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => Posture::Resting,
            1 => Posture::Upright,
            2 => Posture::Brisk,
            3 => Posture::Fall,
            other => Posture::Unknown(other),
        }
    }

    pub fn is_fall(&self) -> bool {
        matches!(self, Posture::Fall)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Posture::Resting => "resting",
            Posture::Upright => "upright",
            Posture::Brisk => "brisk walk",
            Posture::Fall => "fall",
            Posture::Unknown(_) => "unknown",
        }
    }
}

/// A single timed sensor observation
///
/// Readings are immutable once built; reduction stages produce new ones.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub time: DateTime<Utc>,
    pub heart_rate: Option<f64>,
    pub temperature: Option<f64>,
    pub battery_percent: Option<f64>,
    pub posture: Option<i64>,
}

impl Reading {
    /// Reading with every channel missing
    #[cfg(test)]
    pub fn new(time: DateTime<Utc>) -> Self {
        Self {
            time,
            heart_rate: None,
            temperature: None,
            battery_percent: None,
            posture: None,
        }
    }

    pub fn get(&self, field: VitalField) -> Option<f64> {
        match field {
            VitalField::HeartRate => self.heart_rate,
            VitalField::Temperature => self.temperature,
            VitalField::BatteryPercent => self.battery_percent,
            VitalField::Posture => self.posture.map(|p| p as f64),
        }
    }

    /// Field value with the missing-value sentinel applied
    pub fn value_or_zero(&self, field: VitalField) -> f64 {
        self.get(field).unwrap_or(0.0)
    }

    pub fn posture_state(&self) -> Option<Posture> {
        self.posture.map(Posture::from_code)
    }

    pub fn time_ms(&self) -> i64 {
        self.time.timestamp_millis()
    }
}

/// Readings for one device over a queried window, sorted ascending by time
#[derive(Debug, Clone, Default)]
pub struct Series {
    data: Vec<Reading>,
}

impl Series {
    /// Build a series from readings in any order
    ///
    /// The sort is stable, so readings sharing a timestamp keep arrival order.
    pub fn from_readings(mut readings: Vec<Reading>) -> Self {
        readings.sort_by_key(|r| r.time);
        Self { data: readings }
    }

    /// Wrap readings already in time order
    pub(crate) fn from_sorted(readings: Vec<Reading>) -> Self {
        debug_assert!(readings.windows(2).all(|w| w[0].time <= w[1].time));
        Self { data: readings }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn readings(&self) -> &[Reading] {
        &self.data
    }

    pub fn last(&self) -> Option<&Reading> {
        self.data.last()
    }

    /// `last.time - first.time` in milliseconds, 0 below two readings
    pub fn span_ms(&self) -> i64 {
        self.data.as_slice().span_ms()
    }
}

pub trait ReadingSliceExt {
    fn span_ms(&self) -> i64;
}

impl ReadingSliceExt for [Reading] {
    fn span_ms(&self) -> i64 {
        match (self.first(), self.last()) {
            (Some(first), Some(last)) if self.len() >= 2 => last.time_ms() - first.time_ms(),
            _ => 0,
        }
    }
}
