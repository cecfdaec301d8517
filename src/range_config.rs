//! # Range Classifier Module
//!
//! Static table of chart configurations keyed by the time span of the data,
//! and the lookup that picks the finest configuration still covering a span.

use crate::timeseries::Series;

pub const SECOND_MS: i64 = 1_000;
pub const MINUTE_MS: i64 = 60 * SECOND_MS;
pub const HOUR_MS: i64 = 60 * MINUTE_MS;
pub const DAY_MS: i64 = 24 * HOUR_MS;
pub const MONTH_MS: i64 = 30 * DAY_MS;

/// One row of the range table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketConfig {
    /// Largest span (ms) this row covers. `i64::MAX` for the catch-all row.
    pub max_span_ms: i64,
    /// Number of x-axis ticks to plan
    pub tick_count: usize,
    /// Aggregation bucket width in ms
    pub bucket_interval_ms: i64,
    /// Rotation of the x-axis labels in degrees
    pub label_angle: i32,
}

impl BucketConfig {
    const fn new(max_span_ms: i64, tick_count: usize, bucket_interval_ms: i64, label_angle: i32) -> Self {
        Self {
            max_span_ms,
            tick_count,
            bucket_interval_ms,
            label_angle,
        }
    }
}

/// Ordered ascending by `max_span_ms`; the last row is unbounded.
pub const BUCKET_CONFIGS: [BucketConfig; 13] = [
    // Short ranges keep fine detail
    BucketConfig::new(HOUR_MS, 12, 5 * MINUTE_MS, -30),
    BucketConfig::new(6 * HOUR_MS, 18, 20 * MINUTE_MS, -30),
    BucketConfig::new(24 * HOUR_MS, 24, HOUR_MS, -45),
    BucketConfig::new(2 * DAY_MS, 16, 3 * HOUR_MS, -30),
    // Medium ranges
    BucketConfig::new(7 * DAY_MS, 7, DAY_MS, 0),
    BucketConfig::new(14 * DAY_MS, 14, DAY_MS, -30),
    BucketConfig::new(31 * DAY_MS, 15, 2 * DAY_MS, -30),
    BucketConfig::new(92 * DAY_MS, 12, 7 * DAY_MS, -30),
    // Long ranges, labels carry the year
    BucketConfig::new(183 * DAY_MS, 12, 14 * DAY_MS, -45),
    BucketConfig::new(365 * DAY_MS, 12, MONTH_MS, -45),
    BucketConfig::new(730 * DAY_MS, 12, 2 * MONTH_MS, -45),
    BucketConfig::new(1825 * DAY_MS, 12, 5 * MONTH_MS, -45),
    BucketConfig::new(i64::MAX, 12, 10 * MONTH_MS, -45),
];

/// First row whose `max_span_ms >= span_ms`, falling back to the catch-all
pub fn select_config(span_ms: i64) -> &'static BucketConfig {
    BUCKET_CONFIGS
        .iter()
        .find(|c| span_ms <= c.max_span_ms)
        .unwrap_or(&BUCKET_CONFIGS[BUCKET_CONFIGS.len() - 1])
}

/// Config for a series. Empty and single-point series get the finest row.
pub fn config_for_series(series: &Series) -> &'static BucketConfig {
    select_config(series.span_ms())
}
