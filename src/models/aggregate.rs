//! Persisted per-location aggregate.
//!
//! Fields split into two groups that are never mixed:
//! - `SessionTotals` accumulate while a session is live and reset on rollover
//! - `LatestValues` are overwritten by every accepted observation
//!
//! `lifetime_contribution_count` sits outside both: it is incremented by
//! every accepted observation and never reset.

use thiserror::Error;

use crate::store::{AttributeValue, Item};

/// Attribute names used in stored items.
pub mod attributes {
    pub const LIFETIME_CONTRIBUTION_COUNT: &str = "lifetimeContributionCount";
    pub const SESSION_CONTRIBUTION_COUNT: &str = "sessionContributionCount";
    pub const SESSION_WAIT_TIME_SUM: &str = "sessionWaitTimeSum";
    pub const SESSION_GLOVE_COUNT: &str = "sessionGloveCount";
    pub const SESSION_MASK_COUNT: &str = "sessionMaskCount";
    pub const SESSION_DISTANCE_COUNT: &str = "sessionDistanceCount";
    pub const IS_OPEN: &str = "isOpen";
    pub const STOCK_LEVEL: &str = "stockLevel";
    pub const LAST_CONTRIBUTION_TIMESTAMP: &str = "lastContributionTimestamp";
    pub const LAST_CONTRIBUTION_DATE: &str = "lastContributionDate";
    pub const LAST_CONTRIBUTION_TIME: &str = "lastContributionTime";
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionTotals {
    pub contribution_count: i64,
    pub wait_time_sum: i64,
    pub glove_count: i64,
    pub mask_count: i64,
    pub distance_count: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LatestValues {
    pub is_open: bool,
    pub stock_level: String,
    /// Unix epoch seconds.
    pub last_contribution_timestamp: i64,
    pub last_contribution_date: String,
    pub last_contribution_time: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Aggregate {
    pub location_key: String,
    pub lifetime_contribution_count: i64,
    pub session: SessionTotals,
    pub latest: LatestValues,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("corrupt aggregate for `{location_key}`: {field} {reason}")]
pub struct CorruptAggregate {
    pub location_key: String,
    pub field: &'static str,
    pub reason: String,
}

impl Aggregate {
    /// Decode a stored item. Missing attributes take their zero value;
    /// attributes of the wrong type are reported as corruption.
    pub fn from_item(location_key: &str, item: &Item) -> Result<Self, CorruptAggregate> {
        let reader = ItemReader { location_key, item };

        Ok(Self {
            location_key: location_key.to_string(),
            lifetime_contribution_count: reader.number(attributes::LIFETIME_CONTRIBUTION_COUNT)?,
            session: SessionTotals {
                contribution_count: reader.number(attributes::SESSION_CONTRIBUTION_COUNT)?,
                wait_time_sum: reader.number(attributes::SESSION_WAIT_TIME_SUM)?,
                glove_count: reader.number(attributes::SESSION_GLOVE_COUNT)?,
                mask_count: reader.number(attributes::SESSION_MASK_COUNT)?,
                distance_count: reader.number(attributes::SESSION_DISTANCE_COUNT)?,
            },
            latest: LatestValues {
                is_open: reader.boolean(attributes::IS_OPEN)?,
                stock_level: reader.text(attributes::STOCK_LEVEL)?,
                last_contribution_timestamp: reader
                    .number(attributes::LAST_CONTRIBUTION_TIMESTAMP)?,
                last_contribution_date: reader.text(attributes::LAST_CONTRIBUTION_DATE)?,
                last_contribution_time: reader.text(attributes::LAST_CONTRIBUTION_TIME)?,
            },
        })
    }

    /// Reject values no sequence of accepted observations can produce.
    pub fn check_consistency(&self) -> Result<(), CorruptAggregate> {
        let corrupt = |field: &'static str, reason: String| CorruptAggregate {
            location_key: self.location_key.clone(),
            field,
            reason,
        };
        let session = &self.session;

        let counters = [
            (attributes::LIFETIME_CONTRIBUTION_COUNT, self.lifetime_contribution_count),
            (attributes::SESSION_CONTRIBUTION_COUNT, session.contribution_count),
            (attributes::SESSION_WAIT_TIME_SUM, session.wait_time_sum),
            (attributes::SESSION_GLOVE_COUNT, session.glove_count),
            (attributes::SESSION_MASK_COUNT, session.mask_count),
            (attributes::SESSION_DISTANCE_COUNT, session.distance_count),
        ];
        for (field, value) in counters {
            if value < 0 {
                return Err(corrupt(field, format!("is negative ({value})")));
            }
        }

        if session.contribution_count == 0 {
            let has_sums = session.wait_time_sum != 0
                || session.glove_count != 0
                || session.mask_count != 0
                || session.distance_count != 0;
            if has_sums {
                return Err(corrupt(
                    attributes::SESSION_CONTRIBUTION_COUNT,
                    "is zero while session sums are not".into(),
                ));
            }
        }

        let compliance = [
            (attributes::SESSION_GLOVE_COUNT, session.glove_count),
            (attributes::SESSION_MASK_COUNT, session.mask_count),
            (attributes::SESSION_DISTANCE_COUNT, session.distance_count),
        ];
        for (field, value) in compliance {
            if value > session.contribution_count {
                return Err(corrupt(
                    field,
                    format!(
                        "({value}) exceeds the session contribution count ({})",
                        session.contribution_count
                    ),
                ));
            }
        }

        if session.contribution_count > self.lifetime_contribution_count {
            return Err(corrupt(
                attributes::SESSION_CONTRIBUTION_COUNT,
                format!(
                    "({}) exceeds the lifetime contribution count ({})",
                    session.contribution_count, self.lifetime_contribution_count
                ),
            ));
        }

        Ok(())
    }
}

struct ItemReader<'a> {
    location_key: &'a str,
    item: &'a Item,
}

impl ItemReader<'_> {
    fn number(&self, field: &'static str) -> Result<i64, CorruptAggregate> {
        match self.item.get(field) {
            None => Ok(0),
            Some(AttributeValue::Number(n)) => Ok(*n),
            Some(other) => Err(self.wrong_type(field, "number", other)),
        }
    }

    fn boolean(&self, field: &'static str) -> Result<bool, CorruptAggregate> {
        match self.item.get(field) {
            None => Ok(false),
            Some(AttributeValue::Bool(b)) => Ok(*b),
            Some(other) => Err(self.wrong_type(field, "bool", other)),
        }
    }

    fn text(&self, field: &'static str) -> Result<String, CorruptAggregate> {
        match self.item.get(field) {
            None => Ok(String::new()),
            Some(AttributeValue::Text(s)) => Ok(s.clone()),
            Some(other) => Err(self.wrong_type(field, "text", other)),
        }
    }

    fn wrong_type(
        &self,
        field: &'static str,
        expected: &str,
        found: &AttributeValue,
    ) -> CorruptAggregate {
        CorruptAggregate {
            location_key: self.location_key.to_string(),
            field,
            reason: format!("should be a {expected}, found {found:?}"),
        }
    }
}
