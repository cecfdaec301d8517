//! # Bucket Aggregator Module
//!
//! Coarsens long ranges by collapsing fixed-width time buckets into one
//! representative reading each.
//!
//! ## Reduction rules
//! - Heart rate, temperature and battery: arithmetic mean, one decimal
//! - Posture and time: taken from the last member of the bucket
//!
//! Buckets narrower than one hour are never built. Clinical events on short
//! ranges are brief, so those ranges keep full resolution.

use crate::range_config::HOUR_MS;
use crate::timeseries::{Reading, Series, VitalField};

/// Intervals below this are returned unaggregated
pub const AGGREGATION_FLOOR_MS: i64 = HOUR_MS;

/// Collapse a sorted series into buckets of `interval_ms`
///
/// Single pass. The bucket boundary starts at the first timestamp; a gap
/// wider than one interval moves the boundary forward by whole intervals
/// without emitting empty buckets.
pub fn aggregate(series: &Series, interval_ms: i64) -> Series {
    if interval_ms < AGGREGATION_FLOOR_MS || series.is_empty() {
        return series.clone();
    }

    let readings = series.readings();
    let mut out = Vec::new();
    let mut boundary = readings[0].time_ms();
    let mut bucket_start = 0usize;

    for (i, reading) in readings.iter().enumerate() {
        let t = reading.time_ms();
        if t < boundary + interval_ms {
            continue;
        }

        out.push(reduce_bucket(&readings[bucket_start..i]));
        bucket_start = i;

        let skipped = (t - boundary) / interval_ms;
        boundary += skipped * interval_ms;
    }

    out.push(reduce_bucket(&readings[bucket_start..]));

    log::debug!(
        "Aggregated {} readings into {} buckets of {} ms",
        readings.len(),
        out.len(),
        interval_ms
    );

    Series::from_sorted(out)
}

/// Reduce a non-empty bucket to one reading
fn reduce_bucket(bucket: &[Reading]) -> Reading {
    let last = &bucket[bucket.len() - 1];

    Reading {
        time: last.time,
        heart_rate: mean(bucket, VitalField::HeartRate),
        temperature: mean(bucket, VitalField::Temperature),
        battery_percent: mean(bucket, VitalField::BatteryPercent),
        posture: last.posture,
    }
}

/// Mean over every member, missing values counted as zero.
/// `None` only when no member carries the field at all.
fn mean(bucket: &[Reading], field: VitalField) -> Option<f64> {
    if bucket.iter().all(|r| r.get(field).is_none()) {
        return None;
    }
    let sum: f64 = bucket.iter().map(|r| r.value_or_zero(field)).sum();
    Some(round_one_decimal(sum / bucket.len() as f64))
}

pub(crate) fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::range_config::{DAY_MS, MINUTE_MS};
    use chrono::{DateTime, TimeZone, Utc};

    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap()
    }

    fn reading(offset_ms: i64, hr: f64, posture: i64) -> Reading {
        Reading {
            time: base() + chrono::Duration::milliseconds(offset_ms),
            heart_rate: Some(hr),
            temperature: Some(36.5),
            battery_percent: Some(90.0),
            posture: Some(posture),
        }
    }

    #[test]
    fn test_sub_hour_interval_is_identity() {
        let series = Series::from_readings(
            (0..500).map(|i| reading(i * 7_000, 70.0 + (i % 5) as f64, 0)).collect(),
        );
        let out = aggregate(&series, 20 * MINUTE_MS);
        assert_eq!(out.readings(), series.readings());
    }

    #[test]
    fn test_empty_series() {
        assert!(aggregate(&Series::default(), DAY_MS).is_empty());
    }

    #[test]
    fn test_bucket_means_and_last_member() {
        let series = Series::from_readings(vec![
            reading(0, 60.0, 0),
            reading(10 * MINUTE_MS, 71.0, 1),
            reading(HOUR_MS, 90.0, 2),
            reading(HOUR_MS + 5 * MINUTE_MS, 95.0, 3),
        ]);

        let out = aggregate(&series, HOUR_MS);
        let points = out.readings();
        assert_eq!(points.len(), 2);

        assert_eq!(points[0].heart_rate, Some(65.5));
        assert_eq!(points[0].posture, Some(1));
        assert_eq!(points[0].time, series.readings()[1].time);

        assert_eq!(points[1].heart_rate, Some(92.5));
        assert_eq!(points[1].posture, Some(3));
        assert_eq!(points[1].time, series.readings()[3].time);
    }

    #[test]
    fn test_rounds_to_one_decimal() {
        let series = Series::from_readings(vec![
            reading(0, 70.0, 0),
            reading(1_000, 71.0, 0),
            reading(2_000, 71.0, 0),
        ]);
        let out = aggregate(&series, HOUR_MS);
        assert_eq!(out.readings()[0].heart_rate, Some(70.7));
    }

    #[test]
    fn test_missing_values_count_as_zero() {
        let mut blank = reading(1_000, 0.0, 0);
        blank.heart_rate = None;
        blank.temperature = None;
        let mut first = reading(0, 80.0, 0);
        first.temperature = None;

        let out = aggregate(&Series::from_readings(vec![first, blank]), HOUR_MS);
        assert_eq!(out.readings()[0].heart_rate, Some(40.0));
        assert_eq!(out.readings()[0].temperature, None);
    }

    #[test]
    fn test_gap_skips_empty_buckets() {
        let series = Series::from_readings(vec![
            reading(0, 70.0, 0),
            reading(10 * HOUR_MS + MINUTE_MS, 80.0, 0),
            reading(10 * HOUR_MS + 30 * MINUTE_MS, 82.0, 0),
            reading(11 * HOUR_MS + MINUTE_MS, 84.0, 0),
        ]);
        let out = aggregate(&series, HOUR_MS);
        let hrs: Vec<Option<f64>> = out.readings().iter().map(|r| r.heart_rate).collect();
        assert_eq!(hrs, vec![Some(70.0), Some(81.0), Some(84.0)]);
    }

    #[test]
    fn test_length_bound_and_order() {
        let interval = 3 * HOUR_MS;
        let series = Series::from_readings(
            (0..2_000)
                .map(|i| reading(i * 97 * MINUTE_MS / 10, 60.0 + (i % 40) as f64, i % 4))
                .collect(),
        );
        let out = aggregate(&series, interval);
        let span = series.span_ms();
        let bound = ((span + interval - 1) / interval + 1) as usize;

        assert!(out.len() <= bound);
        assert!(out.readings().windows(2).all(|w| w[0].time <= w[1].time));
        assert_eq!(out.last().map(|r| r.time), series.last().map(|r| r.time));
    }
}
