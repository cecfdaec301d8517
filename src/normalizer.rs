//! # Reading Normalizer Module
//!
//! Turns raw rows from the data source into canonical readings.
//!
//! ## Responsibilities
//! 1. Accept loosely typed rows (numbers, numeric strings, nulls, missing keys)
//! 2. Coerce each field independently, leaving unusable fields as `None`
//! 3. Parse the timestamp (RFC 3339 string or epoch milliseconds)
//! 4. Drop untimed rows when building a `Series`
//!
//! A malformed field never fails the whole row. Absence is data, not an error.

use crate::timeseries::{Reading, Series};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

/// A raw row as delivered by the series source
pub type RawReading = Map<String, Value>;

const TIME_KEYS: [&str; 3] = ["_time", "time", "timestamp"];
const HEART_RATE_KEYS: [&str; 2] = ["heart_rate", "heartRate"];
const TEMPERATURE_KEYS: [&str; 1] = ["temperature"];
const BATTERY_KEYS: [&str; 3] = ["BatteryPercent", "battery_percent", "battery"];
const POSTURE_KEYS: [&str; 1] = ["posture"];

/// Output of normalization: all fields optional, including time
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedReading {
    pub time: Option<DateTime<Utc>>,
    pub heart_rate: Option<f64>,
    pub temperature: Option<f64>,
    pub battery_percent: Option<f64>,
    pub posture: Option<i64>,
}

impl NormalizedReading {
    /// Convert into a `Reading`, or `None` when the time was unparseable
    pub fn into_reading(self) -> Option<Reading> {
        let time = self.time?;
        Some(Reading {
            time,
            heart_rate: self.heart_rate,
            temperature: self.temperature,
            battery_percent: self.battery_percent,
            posture: self.posture,
        })
    }
}

/// Normalize one raw row. Never fails.
pub fn normalize(raw: &RawReading) -> NormalizedReading {
    let time = lookup(raw, &TIME_KEYS).and_then(parse_time);
    if time.is_none() {
        log::debug!("Reading has no parseable time: {:?}", lookup(raw, &TIME_KEYS));
    }

    let heart_rate = lookup(raw, &HEART_RATE_KEYS)
        .and_then(coerce_number)
        .filter(|hr| {
            let valid = *hr >= 0.0;
            if !valid {
                log::debug!("Discarding negative heart rate {}", hr);
            }
            valid
        });

    let temperature = lookup(raw, &TEMPERATURE_KEYS).and_then(coerce_number);

    let battery_percent = lookup(raw, &BATTERY_KEYS)
        .and_then(coerce_number)
        .map(|b| b.clamp(0.0, 100.0));

    let posture = lookup(raw, &POSTURE_KEYS)
        .and_then(coerce_number)
        .map(|p| p.round() as i64);

    NormalizedReading {
        time,
        heart_rate,
        temperature,
        battery_percent,
        posture,
    }
}

/// Normalize a batch and build a sorted series from the timed rows
pub fn normalize_series(raw: &[RawReading]) -> Series {
    let mut readings = Vec::with_capacity(raw.len());
    let mut untimed = 0usize;

    for row in raw {
        match normalize(row).into_reading() {
            Some(reading) => readings.push(reading),
            None => untimed += 1,
        }
    }

    if untimed > 0 {
        log::warn!(
            "Dropped {} of {} readings without a parseable time",
            untimed,
            raw.len()
        );
    }

    Series::from_readings(readings)
}

fn lookup<'a>(raw: &'a RawReading, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| raw.get(*k))
        .find(|v| !v.is_null())
}

fn coerce_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    n.filter(|v| v.is_finite())
}

fn parse_time(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s.trim())
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        Value::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> RawReading {
        match value {
            Value::Object(map) => map,
            _ => panic!("test rows must be objects"),
        }
    }

    #[test]
    fn test_full_row() {
        let n = normalize(&row(json!({
            "_time": "2024-03-01T08:00:00Z",
            "heart_rate": 72,
            "temperature": 36.6,
            "BatteryPercent": 88,
            "posture": 1
        })));

        assert_eq!(n.time.unwrap().to_rfc3339(), "2024-03-01T08:00:00+00:00");
        assert_eq!(n.heart_rate, Some(72.0));
        assert_eq!(n.temperature, Some(36.6));
        assert_eq!(n.battery_percent, Some(88.0));
        assert_eq!(n.posture, Some(1));
    }

    #[test]
    fn test_missing_fields_are_none() {
        let n = normalize(&row(json!({ "_time": "2024-03-01T08:00:00Z" })));
        assert!(n.time.is_some());
        assert_eq!(n.heart_rate, None);
        assert_eq!(n.temperature, None);
        assert_eq!(n.battery_percent, None);
        assert_eq!(n.posture, None);
    }

    #[test]
    fn test_wrong_types_coerced_or_dropped() {
        let n = normalize(&row(json!({
            "time": 1_709_280_000_000i64,
            "heart_rate": "81.5",
            "temperature": { "value": 37 },
            "battery_percent": 140,
            "posture": "3"
        })));

        assert_eq!(n.time.unwrap().timestamp(), 1_709_280_000);
        assert_eq!(n.heart_rate, Some(81.5));
        assert_eq!(n.temperature, None);
        assert_eq!(n.battery_percent, Some(100.0));
        assert_eq!(n.posture, Some(3));
    }

    #[test]
    fn test_unparseable_time() {
        let n = normalize(&row(json!({ "_time": "yesterday", "heart_rate": 70 })));
        assert_eq!(n.time, None);
        assert_eq!(n.heart_rate, Some(70.0));
        assert!(n.into_reading().is_none());
    }

    #[test]
    fn test_negative_heart_rate_discarded() {
        let n = normalize(&row(json!({ "_time": "2024-03-01T08:00:00Z", "heart_rate": -4 })));
        assert_eq!(n.heart_rate, None);
    }

    #[test]
    fn test_unknown_posture_preserved() {
        let n = normalize(&row(json!({ "_time": "2024-03-01T08:00:00Z", "posture": 9 })));
        assert_eq!(n.posture, Some(9));
    }

    #[test]
    fn test_normalize_series_sorts_and_drops_untimed() {
        let raw = vec![
            row(json!({ "_time": "2024-03-01T08:02:00Z", "heart_rate": 75 })),
            row(json!({ "_time": null, "heart_rate": 90 })),
            row(json!({ "_time": "2024-03-01T08:01:00Z", "heart_rate": 74 })),
        ];
        let series = normalize_series(&raw);
        assert_eq!(series.len(), 2);
        assert_eq!(series.readings()[0].heart_rate, Some(74.0));
        assert_eq!(series.readings()[1].heart_rate, Some(75.0));
    }
}
