//! # Y-Domain Calculator Module
//!
//! Padded, clamped y-axis bounds per channel, computed from the points that
//! are actually on screen. Clamps keep a single bad reading from blowing the
//! axis out past physiologically plausible limits.

use crate::aggregator::round_one_decimal;
use crate::timeseries::{Reading, VitalField};
use std::fmt;

pub const MIN_PADDING: f64 = 5.0;
pub const PADDING_RATIO: f64 = 0.1;

pub const HEART_RATE_AXIS: (f64, f64) = (40.0, 160.0);
pub const TEMPERATURE_AXIS: (f64, f64) = (30.0, 42.0);
pub const BATTERY_AXIS: (f64, f64) = (0.0, 100.0);
pub const POSTURE_AXIS: (f64, f64) = (0.0, 3.0);

/// One end of an axis domain
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AxisBound {
    /// Let the renderer pick
    Auto,
    Value(f64),
}

impl fmt::Display for AxisBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AxisBound::Auto => f.write_str("auto"),
            AxisBound::Value(v) => write!(f, "{}", v),
        }
    }
}

pub type Domain = (AxisBound, AxisBound);

pub const AUTO_DOMAIN: Domain = (AxisBound::Auto, AxisBound::Auto);

/// Axis domain for `field` over `points`
///
/// Only positive values count. With none, the domain is `auto/auto`.
pub fn y_domain(points: &[Reading], field: VitalField) -> Domain {
    let (min, max) = match points
        .iter()
        .filter_map(|p| p.get(field))
        .filter(|v| *v > 0.0)
        .fold(None, |acc: Option<(f64, f64)>, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        }) {
        Some(range) => range,
        None => return AUTO_DOMAIN,
    };

    let padding = (PADDING_RATIO * (max - min)).max(MIN_PADDING);

    let (lo, hi) = match field {
        VitalField::HeartRate => clamp_to_axis(
            (min - padding).floor(),
            (max + padding).ceil(),
            HEART_RATE_AXIS,
        ),
        VitalField::Temperature => clamp_to_axis(
            round_one_decimal(min - padding),
            round_one_decimal(max + padding),
            TEMPERATURE_AXIS,
        ),
        VitalField::BatteryPercent => BATTERY_AXIS,
        VitalField::Posture => POSTURE_AXIS,
    };

    (AxisBound::Value(lo), AxisBound::Value(hi))
}

/// Both ends land inside `axis` and `lo <= hi`, even when every value is
/// outside the axis (the domain then collapses onto the nearest limit)
fn clamp_to_axis(lo: f64, hi: f64, axis: (f64, f64)) -> (f64, f64) {
    let lo = lo.clamp(axis.0, axis.1);
    (lo, hi.clamp(lo, axis.1))
}
