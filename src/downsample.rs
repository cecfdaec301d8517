//! # Perceptual Downsampler Module
//!
//! Bounds the number of rendered points while keeping the transitions a
//! clinician needs to see.
//!
//! ## Algorithm
//! The first and last readings are always kept. The interior is split into
//! consecutive windows and each window contributes the one reading that
//! moved furthest from the previously selected reading, where distance is
//! a weighted sum over all four channels:
//!
//! ```text
//! |Δhr| + 10·|Δtemp| + 0.5·|Δbattery| + 20·|Δposture|
//! ```
//!
//! Posture and temperature changes are rare but high-signal, so they carry
//! the heaviest weights. A single fall (posture 3) among thousands of resting
//! samples outweighs ordinary heart-rate jitter and survives the reduction.

use crate::timeseries::{Reading, VitalField};

pub const HEART_RATE_WEIGHT: f64 = 1.0;
pub const TEMPERATURE_WEIGHT: f64 = 10.0;
pub const BATTERY_WEIGHT: f64 = 0.5;
pub const POSTURE_WEIGHT: f64 = 20.0;

/// Weighted visual distance between two readings
pub fn deviation(a: &Reading, b: &Reading) -> f64 {
    let delta = |field: VitalField| (a.value_or_zero(field) - b.value_or_zero(field)).abs();

    HEART_RATE_WEIGHT * delta(VitalField::HeartRate)
        + TEMPERATURE_WEIGHT * delta(VitalField::Temperature)
        + BATTERY_WEIGHT * delta(VitalField::BatteryPercent)
        + POSTURE_WEIGHT * delta(VitalField::Posture)
}

/// Reduce `readings` to at most `max_points`
///
/// Input must be sorted by time; output stays sorted. Series already within
/// budget are returned unchanged.
pub fn downsample(readings: &[Reading], max_points: usize) -> Vec<Reading> {
    let n = readings.len();
    if n <= max_points {
        return readings.to_vec();
    }

    match max_points {
        0 => return Vec::new(),
        1 => return vec![readings[0].clone()],
        2 => return vec![readings[0].clone(), readings[n - 1].clone()],
        _ => {}
    }

    // Interior windows share the budget left after the two fixed endpoints
    let interior = &readings[1..n - 1];
    let slots = max_points - 2;
    let step = interior.len().div_ceil(slots);

    let mut sampled = Vec::with_capacity(max_points);
    sampled.push(readings[0].clone());

    let mut previous = &readings[0];
    for window in interior.chunks(step) {
        let mut selected = &window[0];
        let mut max_diff = 0.0;

        for candidate in window {
            let diff = deviation(candidate, previous);
            if diff > max_diff {
                max_diff = diff;
                selected = candidate;
            }
        }

        sampled.push(selected.clone());
        previous = selected;
    }

    sampled.push(readings[n - 1].clone());

    log::debug!(
        "Downsampled {} readings to {} (budget {}, window {})",
        n,
        sampled.len(),
        max_points,
        step
    );

    sampled
}
