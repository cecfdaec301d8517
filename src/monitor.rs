//! # Device Monitor Module
//!
//! Builds the two dashboard views from the collaborators and keeps the most
//! recent result of each.
//!
//! ## Views
//! - Detail: one device, one window, reduced for charting
//! - Ward: a card per configured device with status and latest vitals
//!
//! ## Ordering
//! Poll results may arrive out of order. `DeviceMonitor::apply` keeps a
//! result only if its sequence number is newer than the last one applied for
//! the same view; anything older is stale and dropped.

use crate::charts::{reduce, ChartView};
use crate::error::SourceError;
use crate::normalizer::normalize_series;
use crate::scheduler::PollUpdate;
use crate::source::{AssignmentSource, SeriesSource};
use crate::status::{classify_status, Assignment, BatteryLevel, DeviceStatus, Patient};
use crate::timeseries::{Posture, Reading};
use crate::window::TimeWindow;
use chrono::{DateTime, FixedOffset, Utc};

/// Detail view of one device
#[derive(Debug, Clone)]
pub struct DetailSnapshot {
    pub device_id: String,
    pub window: TimeWindow,
    pub assignment: Assignment,
    pub status: DeviceStatus,
    /// Newest raw reading, before any reduction
    pub latest: Option<Reading>,
    pub view: ChartView,
}

/// Overview card of one device
#[derive(Debug, Clone, PartialEq)]
pub struct WardCard {
    pub device_id: String,
    pub status: DeviceStatus,
    pub patient: Option<Patient>,
    pub latest: Option<Reading>,
    pub battery: Option<BatteryLevel>,
    pub posture: Option<Posture>,
}

impl WardCard {
    pub fn heart_rate(&self) -> Option<f64> {
        self.latest.as_ref().and_then(|r| r.heart_rate)
    }

    pub fn temperature(&self) -> Option<f64> {
        self.latest.as_ref().and_then(|r| r.temperature)
    }

    pub fn has_fallen(&self) -> bool {
        self.posture.is_some_and(|p| p.is_fall())
    }
}

/// Fetch, normalize, sort, reduce and classify one device
pub fn build_detail(
    series_source: &dyn SeriesSource,
    assignments: &dyn AssignmentSource,
    device_id: &str,
    window: &TimeWindow,
    now: DateTime<Utc>,
    label_offset: FixedOffset,
) -> Result<DetailSnapshot, SourceError> {
    let raw = series_source.fetch(device_id, window, now)?;
    let assignment = assignments.assignment(device_id)?;

    let series = normalize_series(&raw);
    let latest = series.last().cloned();
    let status = classify_status(&assignment, latest.as_ref().and_then(|r| r.heart_rate));
    let view = reduce(&series, window, label_offset);

    Ok(DetailSnapshot {
        device_id: device_id.to_string(),
        window: *window,
        assignment,
        status,
        latest,
        view,
    })
}

fn build_card(
    series_source: &dyn SeriesSource,
    assignments: &dyn AssignmentSource,
    device_id: &str,
    lookback: &TimeWindow,
    now: DateTime<Utc>,
) -> Result<WardCard, SourceError> {
    let raw = series_source.fetch(device_id, lookback, now)?;
    let assignment = assignments.assignment(device_id)?;
    let latest = normalize_series(&raw).last().cloned();

    Ok(WardCard {
        device_id: device_id.to_string(),
        status: classify_status(&assignment, latest.as_ref().and_then(|r| r.heart_rate)),
        patient: assignment.patient().cloned(),
        battery: latest
            .as_ref()
            .and_then(|r| r.battery_percent)
            .map(BatteryLevel::from_percent),
        posture: latest.as_ref().and_then(|r| r.posture_state()),
        latest,
    })
}

/// One card per device. Devices whose source fails are logged and left out.
pub fn build_ward(
    series_source: &dyn SeriesSource,
    assignments: &dyn AssignmentSource,
    devices: &[String],
    lookback: &TimeWindow,
    now: DateTime<Utc>,
) -> Vec<WardCard> {
    devices
        .iter()
        .filter_map(|id| match build_card(series_source, assignments, id, lookback, now) {
            Ok(card) => Some(card),
            Err(e) => {
                log::warn!("Skipping {} on ward view: {}", id, e);
                None
            }
        })
        .collect()
}

/// Payload of a poll cycle
#[derive(Debug)]
pub enum MonitorUpdate {
    Detail(Result<DetailSnapshot, SourceError>),
    Ward(Vec<WardCard>),
}

/// Latest applied state of both views
#[derive(Debug, Default)]
pub struct DeviceMonitor {
    detail: Option<DetailSnapshot>,
    detail_error: Option<String>,
    ward: Vec<WardCard>,
    detail_seq: u64,
    ward_seq: u64,
}

impl DeviceMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies `update` if it is newer than what is shown. Returns whether it was.
    pub fn apply(&mut self, update: PollUpdate<MonitorUpdate>) -> bool {
        match update.value {
            MonitorUpdate::Detail(result) => {
                if update.seq <= self.detail_seq {
                    log::debug!("Dropping stale detail update #{}", update.seq);
                    return false;
                }
                self.detail_seq = update.seq;
                match result {
                    Ok(snapshot) => {
                        self.detail = Some(snapshot);
                        self.detail_error = None;
                    }
                    Err(e) => {
                        // keep the last good chart on screen
                        log::warn!("Detail refresh failed: {}", e);
                        self.detail_error = Some(e.to_string());
                    }
                }
            }
            MonitorUpdate::Ward(cards) => {
                if update.seq <= self.ward_seq {
                    log::debug!("Dropping stale ward update #{}", update.seq);
                    return false;
                }
                self.ward_seq = update.seq;
                self.ward = cards;
            }
        }
        log::debug!("Applied update #{} issued at {}", update.seq, update.issued_at);
        true
    }

    pub fn detail(&self) -> Option<&DetailSnapshot> {
        self.detail.as_ref()
    }

    pub fn detail_error(&self) -> Option<&str> {
        self.detail_error.as_deref()
    }

    pub fn ward(&self) -> &[WardCard] {
        &self.ward
    }

    /// Cards currently in the critical state
    pub fn alerts(&self) -> impl Iterator<Item = &WardCard> {
        self.ward.iter().filter(|c| c.status.is_alert())
    }
}
