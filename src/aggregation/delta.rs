use std::fmt::Write;

use chrono::{DateTime, Utc};
use log::warn;

use super::DisplayFormat;
use crate::models::Observation;

/// Per-field contribution of one observation.
///
/// Whether the session fields are written as absolute values or added to
/// the stored sums is decided by the repository, not here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delta {
    pub contribution: i64,
    pub wait_time_minutes: i64,
    pub glove: i64,
    pub mask: i64,
    pub distance: i64,
    pub is_open: bool,
    pub stock_level: String,
    /// Unix epoch seconds.
    pub timestamp: i64,
    pub display_date: String,
    pub display_time: String,
}

pub fn to_delta(observation: &Observation, now: DateTime<Utc>, display: &DisplayFormat) -> Delta {
    let local = now.with_timezone(&display.offset());

    Delta {
        contribution: 1,
        wait_time_minutes: i64::from(observation.wait_time_minutes),
        glove: flag(observation.wears_gloves),
        mask: flag(observation.wears_mask),
        distance: flag(observation.respects_distancing),
        is_open: observation.is_open,
        stock_level: observation.stock_level.clone(),
        timestamp: now.timestamp(),
        display_date: render(&local, &display.date_format),
        display_time: render(&local, &display.time_format),
    }
}

fn flag(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

fn render<Tz>(at: &DateTime<Tz>, pattern: &str) -> String
where
    Tz: chrono::TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let mut out = String::new();
    if write!(out, "{}", at.format(pattern)).is_err() {
        warn!("Cannot render timestamp with pattern {pattern:?}");
        out.clear();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn observation() -> Observation {
        Observation {
            location_key: "node/7".into(),
            wait_time_minutes: 12,
            is_open: true,
            wears_gloves: false,
            wears_mask: true,
            respects_distancing: true,
            stock_level: "half".into(),
        }
    }

    #[test]
    fn booleans_become_unit_counts() {
        let now = Utc.with_ymd_and_hms(2020, 4, 2, 10, 0, 0).unwrap();
        let delta = to_delta(&observation(), now, &DisplayFormat::default());

        assert_eq!(delta.contribution, 1);
        assert_eq!(delta.wait_time_minutes, 12);
        assert_eq!(delta.glove, 0);
        assert_eq!(delta.mask, 1);
        assert_eq!(delta.distance, 1);
        assert!(delta.is_open);
        assert_eq!(delta.stock_level, "half");
        assert_eq!(delta.timestamp, now.timestamp());
    }

    #[test]
    fn display_copies_use_configured_offset() {
        let now = Utc.with_ymd_and_hms(2020, 4, 2, 23, 30, 5).unwrap();
        let delta = to_delta(&observation(), now, &DisplayFormat::default());

        assert_eq!(delta.display_date, "03-04-2020");
        assert_eq!(delta.display_time, "00:30:05");
    }

    #[test]
    fn broken_pattern_renders_empty() {
        let now = Utc.with_ymd_and_hms(2020, 4, 2, 23, 30, 5).unwrap();
        let display = DisplayFormat {
            time_format: "%Q".into(),
            ..Default::default()
        };
        let delta = to_delta(&observation(), now, &display);
        assert_eq!(delta.display_time, "");
        assert_eq!(delta.display_date, "03-04-2020");
    }
}
