//! # Chart Reduction Module
//!
//! Composes the reduction stages into one render-ready view:
//!
//! ```text
//! Series ─► select_config ─► aggregate ─► downsample ─► plan_ticks
//!                                               └────► y_domain (per field, on demand)
//! ```
//!
//! Every stage is pure, so `reduce` can be called again for any parameter
//! change without coordination.

use crate::aggregator::aggregate;
use crate::downsample::downsample;
use crate::range_config::{config_for_series, BucketConfig};
use crate::ticks::{plan_ticks, LabelFormatter};
use crate::timeseries::{Reading, Series, VitalField};
use crate::window::TimeWindow;
use crate::y_domain::{y_domain, Domain};
use chrono::{DateTime, FixedOffset, Utc};

/// Render-ready output of the reduction pipeline
#[derive(Debug, Clone)]
pub struct ChartView {
    pub points: Vec<Reading>,
    pub ticks: Vec<DateTime<Utc>>,
    pub labels: LabelFormatter,
    pub angle: i32,
    pub config: BucketConfig,
    /// Reading count before reduction
    pub source_len: usize,
}

impl ChartView {
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn y_domain(&self, field: VitalField) -> Domain {
        y_domain(&self.points, field)
    }

    pub fn tick_labels(&self) -> Vec<String> {
        self.ticks.iter().map(|t| self.labels.format(*t)).collect()
    }

    /// `true` when some readings were merged or skipped
    pub fn is_reduced(&self) -> bool {
        self.points.len() < self.source_len
    }
}

/// Reduce a sorted series for display in `window`
///
/// `label_offset` only changes the tick label text; points and ticks stay in UTC.
pub fn reduce(series: &Series, window: &TimeWindow, label_offset: FixedOffset) -> ChartView {
    let config = *config_for_series(series);
    let span_ms = series.span_ms();

    let aggregated = aggregate(series, config.bucket_interval_ms);
    let points = downsample(aggregated.readings(), window.render_budget());
    let ticks = plan_ticks(&points, config.tick_count);

    log::debug!(
        "Reduced {} readings for {} to {} points, {} ticks",
        series.len(),
        window,
        points.len(),
        ticks.len()
    );

    ChartView {
        points,
        ticks,
        labels: LabelFormatter::for_span(span_ms, label_offset),
        angle: config.label_angle,
        config,
        source_len: series.len(),
    }
}
