//! # Time Window Module
//!
//! Describes the window a chart is queried for and the render budget that
//! goes with it.
//!
//! ## Window kinds
//! - `Preset`: one of the quick-select lookbacks (last hour ... last 10 years)
//! - `Lookback`: any other relative lookback, e.g. the 5 minute ward poll
//! - `Custom`: explicit start/end picked by the user
//!
//! Relative windows are written the way the time-series store expects them:
//! a leading minus, an integer and a unit (`-30s`, `-5m`, `-6h`, `-7d`, `-2w`).

use crate::error::WindowError;
use chrono::{DateTime, Duration, Utc};
use std::fmt;
use std::str::FromStr;

/// Budget for lookbacks that are not presets
pub const DEFAULT_RENDER_BUDGET: usize = 100;

/// Quick-select ranges with tuned render budgets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RangePreset {
    LastHour,
    Last6Hours,
    LastDay,
    LastWeek,
    Last30Days,
    Last90Days,
    Last180Days,
    LastYear,
    Last2Years,
    Last5Years,
    Last10Years,
}

impl RangePreset {
    pub fn all() -> [RangePreset; 11] {
        [
            RangePreset::LastHour,
            RangePreset::Last6Hours,
            RangePreset::LastDay,
            RangePreset::LastWeek,
            RangePreset::Last30Days,
            RangePreset::Last90Days,
            RangePreset::Last180Days,
            RangePreset::LastYear,
            RangePreset::Last2Years,
            RangePreset::Last5Years,
            RangePreset::Last10Years,
        ]
    }

    pub fn duration(&self) -> Duration {
        match self {
            RangePreset::LastHour => Duration::hours(1),
            RangePreset::Last6Hours => Duration::hours(6),
            RangePreset::LastDay => Duration::hours(24),
            RangePreset::LastWeek => Duration::days(7),
            RangePreset::Last30Days => Duration::days(30),
            RangePreset::Last90Days => Duration::days(90),
            RangePreset::Last180Days => Duration::days(180),
            RangePreset::LastYear => Duration::days(365),
            RangePreset::Last2Years => Duration::days(730),
            RangePreset::Last5Years => Duration::days(1825),
            RangePreset::Last10Years => Duration::days(3650),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RangePreset::LastHour => "-1h",
            RangePreset::Last6Hours => "-6h",
            RangePreset::LastDay => "-24h",
            RangePreset::LastWeek => "-7d",
            RangePreset::Last30Days => "-30d",
            RangePreset::Last90Days => "-90d",
            RangePreset::Last180Days => "-180d",
            RangePreset::LastYear => "-365d",
            RangePreset::Last2Years => "-730d",
            RangePreset::Last5Years => "-1825d",
            RangePreset::Last10Years => "-3650d",
        }
    }

    pub fn render_budget(&self) -> usize {
        match self {
            RangePreset::LastHour => 60,
            RangePreset::Last6Hours => 100,
            RangePreset::LastDay => 200,
            RangePreset::LastWeek => 300,
            RangePreset::Last30Days => 400,
            RangePreset::Last90Days => 500,
            RangePreset::Last180Days => 600,
            RangePreset::LastYear => 700,
            RangePreset::Last2Years => 750,
            RangePreset::Last5Years => 800,
            RangePreset::Last10Years => 800,
        }
    }

    fn from_duration(duration: Duration) -> Option<Self> {
        Self::all().into_iter().find(|p| p.duration() == duration)
    }
}

/// Window a series is fetched and reduced for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeWindow {
    Preset(RangePreset),
    Lookback(Duration),
    Custom {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

impl Default for TimeWindow {
    fn default() -> Self {
        TimeWindow::Preset(RangePreset::LastHour)
    }
}

impl TimeWindow {
    /// Explicit range; rejects `start > end`
    pub fn custom(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, WindowError> {
        if start > end {
            return Err(WindowError::Degenerate { start, end });
        }
        Ok(TimeWindow::Custom { start, end })
    }

    /// Relative lookback, promoted to a preset when one matches
    pub fn lookback(duration: Duration) -> Self {
        match RangePreset::from_duration(duration) {
            Some(preset) => TimeWindow::Preset(preset),
            None => TimeWindow::Lookback(duration),
        }
    }

    /// Absolute `[start, end]` for a query issued at `now`
    ///
    /// A lookback reaching past the earliest representable instant starts there.
    pub fn bounds(&self, now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
        let since = |duration: Duration| {
            now.checked_sub_signed(duration)
                .unwrap_or(DateTime::<Utc>::MIN_UTC)
        };
        match self {
            TimeWindow::Preset(preset) => (since(preset.duration()), now),
            TimeWindow::Lookback(duration) => (since(*duration), now),
            TimeWindow::Custom { start, end } => (*start, *end),
        }
    }

    /// Upper bound on points handed to the renderer
    ///
    /// Wider windows get larger budgets. Custom ranges are bucketed by their
    /// length in days.
    pub fn render_budget(&self) -> usize {
        match self {
            TimeWindow::Preset(preset) => preset.render_budget(),
            TimeWindow::Lookback(_) => DEFAULT_RENDER_BUDGET,
            TimeWindow::Custom { start, end } => {
                let days = (*end - *start).num_milliseconds() as f64 / 86_400_000.0;
                if days <= 1.0 {
                    200
                } else if days <= 7.0 {
                    300
                } else if days <= 30.0 {
                    400
                } else if days <= 90.0 {
                    500
                } else if days <= 365.0 {
                    600
                } else {
                    800
                }
            }
        }
    }
}

impl FromStr for TimeWindow {
    type Err = WindowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || WindowError::InvalidRange(s.to_string());

        let body = s.trim().strip_prefix('-').ok_or_else(invalid)?;
        let split = body
            .find(|c: char| !c.is_ascii_digit())
            .ok_or_else(invalid)?;
        let (amount, unit) = body.split_at(split);
        let amount: i64 = amount.parse().map_err(|_| invalid())?;
        if amount <= 0 {
            return Err(invalid());
        }

        let duration = match unit {
            "s" => Duration::try_seconds(amount),
            "m" => Duration::try_minutes(amount),
            "h" => Duration::try_hours(amount),
            "d" => Duration::try_days(amount),
            "w" => Duration::try_weeks(amount),
            _ => None,
        }
        .ok_or_else(invalid)?;

        Ok(TimeWindow::lookback(duration))
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeWindow::Preset(preset) => f.write_str(preset.as_str()),
            TimeWindow::Lookback(duration) => {
                let secs = duration.num_seconds();
                if secs % 86_400 == 0 {
                    write!(f, "-{}d", secs / 86_400)
                } else if secs % 3_600 == 0 {
                    write!(f, "-{}h", secs / 3_600)
                } else if secs % 60 == 0 {
                    write!(f, "-{}m", secs / 60)
                } else {
                    write!(f, "-{}s", secs)
                }
            }
            TimeWindow::Custom { start, end } => {
                write!(f, "{}..{}", start.to_rfc3339(), end.to_rfc3339())
            }
        }
    }
}
