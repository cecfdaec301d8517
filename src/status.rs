//! # Status Classifier Module
//!
//! Derives the clinical status shown on a device card from its assignment and
//! the latest raw heart-rate reading.
//!
//! ## Rules
//! - `Available`: no patient assigned
//! - `Inactive`: assigned, heart rate missing or 0 (no signal)
//! - `Critical`: assigned, heart rate above 100 or below 60
//! - `Active`: assigned, heart rate within [60, 100]
//!
//! Status is recomputed from scratch on every poll. There is no hysteresis,
//! so one noisy sample can flip `Active` and `Critical` for a cycle.
//!
//! A heart rate of exactly 0 is read as a disconnected sensor. A real zero
//! (cardiac arrest) therefore also shows as `Inactive`; the two cases are not
//! distinguishable from the reading alone.

use std::fmt;

pub const HEART_RATE_LOW: f64 = 60.0;
pub const HEART_RATE_HIGH: f64 = 100.0;

/// Patient bound to a device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Patient {
    /// Hospital number
    pub hn: String,
    pub name: String,
}

/// Assignment state reported by the assignment collaborator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Assignment {
    Unassigned,
    Active(Patient),
}

impl Assignment {
    pub fn is_active(&self) -> bool {
        matches!(self, Assignment::Active(_))
    }

    pub fn patient(&self) -> Option<&Patient> {
        match self {
            Assignment::Active(patient) => Some(patient),
            Assignment::Unassigned => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceStatus {
    Available,
    Inactive,
    Active,
    Critical,
}

impl DeviceStatus {
    pub fn label(&self) -> &'static str {
        match self {
            DeviceStatus::Available => "available",
            DeviceStatus::Inactive => "inactive",
            DeviceStatus::Active => "active",
            DeviceStatus::Critical => "critical",
        }
    }

    pub fn is_alert(&self) -> bool {
        matches!(self, DeviceStatus::Critical)
    }
}

impl fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Pure function of assignment and the latest heart rate
pub fn classify_status(assignment: &Assignment, latest_heart_rate: Option<f64>) -> DeviceStatus {
    if !assignment.is_active() {
        return DeviceStatus::Available;
    }

    match latest_heart_rate {
        None => DeviceStatus::Inactive,
        Some(hr) if hr <= 0.0 => DeviceStatus::Inactive,
        Some(hr) if hr > HEART_RATE_HIGH || hr < HEART_RATE_LOW => DeviceStatus::Critical,
        Some(_) => DeviceStatus::Active,
    }
}

/// Battery indicator tier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatteryLevel {
    Good,
    Low,
    Critical,
}

impl BatteryLevel {
    pub fn from_percent(percent: f64) -> Self {
        if percent > 50.0 {
            BatteryLevel::Good
        } else if percent > 20.0 {
            BatteryLevel::Low
        } else {
            BatteryLevel::Critical
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            BatteryLevel::Good => "good",
            BatteryLevel::Low => "low",
            BatteryLevel::Critical => "critical",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assigned() -> Assignment {
        Assignment::Active(Patient {
            hn: "HN-0042".to_string(),
            name: "Somchai".to_string(),
        })
    }

    #[test]
    fn test_status_table() {
        assert_eq!(classify_status(&assigned(), Some(75.0)), DeviceStatus::Active);
        assert_eq!(classify_status(&assigned(), Some(120.0)), DeviceStatus::Critical);
        assert_eq!(classify_status(&assigned(), Some(45.0)), DeviceStatus::Critical);
        assert_eq!(classify_status(&assigned(), Some(0.0)), DeviceStatus::Inactive);
        assert_eq!(classify_status(&Assignment::Unassigned, Some(75.0)), DeviceStatus::Available);
    }

    #[test]
    fn test_boundaries_are_normal() {
        assert_eq!(classify_status(&assigned(), Some(60.0)), DeviceStatus::Active);
        assert_eq!(classify_status(&assigned(), Some(100.0)), DeviceStatus::Active);
        assert_eq!(classify_status(&assigned(), Some(100.1)), DeviceStatus::Critical);
        assert_eq!(classify_status(&assigned(), Some(59.9)), DeviceStatus::Critical);
    }

    #[test]
    fn test_missing_heart_rate_is_inactive() {
        assert_eq!(classify_status(&assigned(), None), DeviceStatus::Inactive);
        assert_eq!(classify_status(&Assignment::Unassigned, None), DeviceStatus::Available);
    }

    #[test]
    fn test_no_hysteresis() {
        let a = assigned();
        let statuses: Vec<DeviceStatus> = [80.0, 101.0, 80.0]
            .iter()
            .map(|hr| classify_status(&a, Some(*hr)))
            .collect();
        assert_eq!(
            statuses,
            vec![DeviceStatus::Active, DeviceStatus::Critical, DeviceStatus::Active]
        );
    }

    #[test]
    fn test_battery_levels() {
        assert_eq!(BatteryLevel::from_percent(51.0), BatteryLevel::Good);
        assert_eq!(BatteryLevel::from_percent(50.0), BatteryLevel::Low);
        assert_eq!(BatteryLevel::from_percent(21.0), BatteryLevel::Low);
        assert_eq!(BatteryLevel::from_percent(20.0), BatteryLevel::Critical);
    }

    #[test]
    fn test_labels() {
        assert_eq!(DeviceStatus::Critical.to_string(), "critical");
        assert!(DeviceStatus::Critical.is_alert());
        assert!(!DeviceStatus::Inactive.is_alert());
    }
}
