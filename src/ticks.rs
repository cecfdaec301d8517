//! # Axis Tick Planner Module
//!
//! Picks evenly spaced x-axis ticks and the label granularity for them.
//!
//! Ticks are spread in index space rather than time space, so dense and
//! sparse stretches of a series get comparable tick density. Label
//! granularity depends on the span of the whole series, never on a single
//! tick.

use crate::range_config::{DAY_MS, HOUR_MS};
use crate::timeseries::Reading;
use chrono::{DateTime, FixedOffset, Offset, Utc};

/// Choose up to `tick_count` timestamps from `points`
///
/// The result is strictly increasing and, for a non-empty input with
/// `tick_count >= 2`, always starts at the first timestamp and ends at the
/// last.
pub fn plan_ticks(points: &[Reading], tick_count: usize) -> Vec<DateTime<Utc>> {
    let n = points.len();
    if n == 0 || tick_count == 0 {
        return Vec::new();
    }

    let mut ticks: Vec<DateTime<Utc>> = Vec::with_capacity(tick_count.min(n));
    let mut push = |t: DateTime<Utc>| {
        if ticks.last().map_or(true, |last| *last < t) {
            ticks.push(t);
        }
    };

    if n <= tick_count {
        points.iter().for_each(|p| push(p.time));
    } else if tick_count == 1 {
        push(points[0].time);
    } else {
        let step = (n - 1) as f64 / (tick_count - 1) as f64;
        for i in 0..tick_count {
            let index = ((i as f64 * step).round() as usize).min(n - 1);
            push(points[index].time);
        }
    }

    ticks
}

/// Label granularity for the x-axis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelFormat {
    /// `14:05`
    HourMinute,
    /// `3 Mar 14:05`
    DayHourMinute,
    /// `3 Mar`
    DayMonth,
    /// `Mar 24`
    MonthShortYear,
    /// `Mar 2024`
    MonthFullYear,
}

impl LabelFormat {
    /// Granularity for a series spanning `span_ms`
    pub fn for_span(span_ms: i64) -> Self {
        if span_ms <= 6 * HOUR_MS {
            LabelFormat::HourMinute
        } else if span_ms <= 2 * DAY_MS {
            LabelFormat::DayHourMinute
        } else if span_ms <= 30 * DAY_MS {
            LabelFormat::DayMonth
        } else if span_ms <= 365 * DAY_MS {
            LabelFormat::MonthShortYear
        } else {
            LabelFormat::MonthFullYear
        }
    }

    fn pattern(&self) -> &'static str {
        match self {
            LabelFormat::HourMinute => "%H:%M",
            LabelFormat::DayHourMinute => "%-d %b %H:%M",
            LabelFormat::DayMonth => "%-d %b",
            LabelFormat::MonthShortYear => "%b %y",
            LabelFormat::MonthFullYear => "%b %Y",
        }
    }
}

/// Formats tick timestamps at a fixed granularity and display offset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelFormatter {
    pub format: LabelFormat,
    pub offset: FixedOffset,
}

impl LabelFormatter {
    pub fn new(format: LabelFormat, offset: FixedOffset) -> Self {
        Self { format, offset }
    }

    pub fn for_span(span_ms: i64, offset: FixedOffset) -> Self {
        Self::new(LabelFormat::for_span(span_ms), offset)
    }

    pub fn format(&self, time: DateTime<Utc>) -> String {
        time.with_timezone(&self.offset)
            .format(self.format.pattern())
            .to_string()
    }
}

/// `FixedOffset` from minutes east of UTC, falling back to UTC when out of range
pub fn display_offset(minutes: i32) -> FixedOffset {
    minutes
        .checked_mul(60)
        .and_then(FixedOffset::east_opt)
        .unwrap_or_else(|| {
            log::warn!("Display offset of {} minutes is out of range, using UTC", minutes);
            Utc.fix()
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn points(n: i64) -> Vec<Reading> {
        let start = Utc.with_ymd_and_hms(2024, 3, 3, 14, 5, 0).unwrap();
        (0..n)
            .map(|i| Reading::new(start + chrono::Duration::minutes(i)))
            .collect()
    }

    #[test]
    fn test_short_series_uses_every_point() {
        let data = points(5);
        let ticks = plan_ticks(&data, 12);
        assert_eq!(ticks.len(), 5);
        assert_eq!(ticks[0], data[0].time);
    }

    #[test]
    fn test_ticks_include_endpoints() {
        let data = points(1_000);
        let ticks = plan_ticks(&data, 18);
        assert_eq!(ticks.len(), 18);
        assert_eq!(ticks[0], data[0].time);
        assert_eq!(ticks[17], data[999].time);
    }

    #[test]
    fn test_ticks_strictly_increasing_subsequence() {
        let data = points(437);
        let ticks = plan_ticks(&data, 24);
        assert!(ticks.windows(2).all(|w| w[0] < w[1]));
        assert!(ticks.iter().all(|t| data.iter().any(|p| p.time == *t)));
    }

    #[test]
    fn test_duplicate_timestamps_deduplicated() {
        let mut data = points(4);
        data[2].time = data[1].time;
        let ticks = plan_ticks(&data, 12);
        assert_eq!(ticks.len(), 3);
    }

    #[test]
    fn test_empty_and_zero() {
        assert!(plan_ticks(&[], 12).is_empty());
        assert!(plan_ticks(&points(10), 0).is_empty());
    }

    #[test]
    fn test_label_granularity() {
        assert_eq!(LabelFormat::for_span(0), LabelFormat::HourMinute);
        assert_eq!(LabelFormat::for_span(6 * HOUR_MS), LabelFormat::HourMinute);
        assert_eq!(LabelFormat::for_span(6 * HOUR_MS + 1), LabelFormat::DayHourMinute);
        assert_eq!(LabelFormat::for_span(2 * DAY_MS), LabelFormat::DayHourMinute);
        assert_eq!(LabelFormat::for_span(20 * DAY_MS), LabelFormat::DayMonth);
        assert_eq!(LabelFormat::for_span(200 * DAY_MS), LabelFormat::MonthShortYear);
        assert_eq!(LabelFormat::for_span(400 * DAY_MS), LabelFormat::MonthFullYear);
    }

    #[test]
    fn test_label_text() {
        let t = Utc.with_ymd_and_hms(2024, 3, 3, 14, 5, 0).unwrap();
        let utc = display_offset(0);
        assert_eq!(LabelFormatter::new(LabelFormat::HourMinute, utc).format(t), "14:05");
        assert_eq!(LabelFormatter::new(LabelFormat::DayHourMinute, utc).format(t), "3 Mar 14:05");
        assert_eq!(LabelFormatter::new(LabelFormat::DayMonth, utc).format(t), "3 Mar");
        assert_eq!(LabelFormatter::new(LabelFormat::MonthShortYear, utc).format(t), "Mar 24");
        assert_eq!(LabelFormatter::new(LabelFormat::MonthFullYear, utc).format(t), "Mar 2024");
    }

    #[test]
    fn test_label_offset() {
        let t = Utc.with_ymd_and_hms(2024, 3, 3, 20, 30, 0).unwrap();
        let bangkok = display_offset(7 * 60);
        assert_eq!(LabelFormatter::new(LabelFormat::DayHourMinute, bangkok).format(t), "4 Mar 03:30");
    }
}
