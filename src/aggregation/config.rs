use anyhow::{bail, Result};
use chrono::{
    format::{Item, StrftimeItems},
    FixedOffset, Offset, Utc,
};
use serde::{Deserialize, Serialize};

const MAX_OFFSET_MINUTES: i32 = 24 * 60;

/// How contribution timestamps are rendered for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayFormat {
    /// Fixed offset from UTC used for the display copies, in minutes.
    #[serde(default = "default_utc_offset_minutes")]
    pub utc_offset_minutes: i32,

    /// strftime pattern for `lastContributionDate`.
    #[serde(default = "default_date_format")]
    pub date_format: String,

    /// strftime pattern for `lastContributionTime`.
    #[serde(default = "default_time_format")]
    pub time_format: String,
}

impl Default for DisplayFormat {
    fn default() -> Self {
        Self {
            utc_offset_minutes: default_utc_offset_minutes(),
            date_format: default_date_format(),
            time_format: default_time_format(),
        }
    }
}

fn default_utc_offset_minutes() -> i32 {
    60
}

fn default_date_format() -> String {
    "%d-%m-%Y".to_string()
}

fn default_time_format() -> String {
    "%H:%M:%S".to_string()
}

impl DisplayFormat {
    pub fn offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_minutes * 60).unwrap_or_else(|| Utc.fix())
    }

    pub fn validate(&self) -> Result<()> {
        if self.utc_offset_minutes.abs() >= MAX_OFFSET_MINUTES {
            bail!(
                "utcOffsetMinutes must be within ±{} (got {})",
                MAX_OFFSET_MINUTES - 1,
                self.utc_offset_minutes
            );
        }
        validate_pattern("dateFormat", &self.date_format)?;
        validate_pattern("timeFormat", &self.time_format)?;
        Ok(())
    }
}

fn validate_pattern(name: &str, pattern: &str) -> Result<()> {
    if pattern.is_empty() {
        bail!("{name} must not be empty");
    }
    if StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error)) {
        bail!("{name} is not a valid strftime pattern: {pattern:?}");
    }
    Ok(())
}
