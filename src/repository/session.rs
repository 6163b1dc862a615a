//! Session window policy and the two transitions a write can take.

use serde::{Deserialize, Serialize};

use crate::{
    aggregation::Delta,
    models::{attributes, Aggregate},
    store::{Condition, Mutation},
};

/// Bounds of one aggregation session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionPolicy {
    /// Contributions a session may hold before the next write rolls it over.
    #[serde(default = "default_max_size")]
    pub max_size: i64,

    /// Seconds after the last contribution at which a session goes stale.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: i64,
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self {
            max_size: default_max_size(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_max_size() -> i64 {
    20
}

fn default_timeout_secs() -> i64 {
    3600
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Live,
    Stale,
    Full,
}

impl SessionPolicy {
    /// Latest contribution timestamp that still counts as stale at `now`.
    ///
    /// A session is live while `now - last < timeout_secs`, so it is stale
    /// once `last <= now - timeout_secs`.
    pub fn stale_at_or_before(&self, now: i64) -> i64 {
        now.saturating_sub(self.timeout_secs)
    }

    pub fn state_of(&self, aggregate: &Aggregate, now: i64) -> SessionState {
        if aggregate.session.contribution_count >= self.max_size {
            SessionState::Full
        } else if aggregate.latest.last_contribution_timestamp <= self.stale_at_or_before(now) {
            SessionState::Stale
        } else {
            SessionState::Live
        }
    }
}

/// The two ways one observation can be folded into an aggregate.
///
/// Each transition is a single conditional store update; the store, not the
/// caller, decides which one applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionTransition {
    /// Start a new session seeded by this observation. Also initializes an
    /// aggregate that does not exist yet.
    ResetSession,
    /// Fold this observation into the live session.
    AppendToSession,
}

impl SessionTransition {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionTransition::ResetSession => "reset",
            SessionTransition::AppendToSession => "append",
        }
    }

    /// Guard under which the store may apply this transition at `now`.
    ///
    /// `AppendToSession` is unconditional: it only runs after the reset guard
    /// was rejected, meaning a live session existed at that instant. A writer
    /// racing a concurrent reset can therefore push a session one or more
    /// contributions past `max_size`; the next write then rolls it over.
    pub fn condition(&self, policy: &SessionPolicy, now: i64) -> Condition {
        match self {
            SessionTransition::ResetSession => Condition::Or(vec![
                Condition::less_than(
                    attributes::LAST_CONTRIBUTION_TIMESTAMP,
                    policy.stale_at_or_before(now).saturating_add(1),
                ),
                Condition::at_least(attributes::SESSION_CONTRIBUTION_COUNT, policy.max_size),
            ]),
            SessionTransition::AppendToSession => Condition::Always,
        }
    }

    pub fn mutation(&self, delta: &Delta) -> Mutation {
        let mutation = Mutation::new().add(attributes::LIFETIME_CONTRIBUTION_COUNT, delta.contribution);

        let mutation = match self {
            SessionTransition::ResetSession => mutation
                .set(attributes::SESSION_CONTRIBUTION_COUNT, delta.contribution)
                .set(attributes::SESSION_WAIT_TIME_SUM, delta.wait_time_minutes)
                .set(attributes::SESSION_GLOVE_COUNT, delta.glove)
                .set(attributes::SESSION_MASK_COUNT, delta.mask)
                .set(attributes::SESSION_DISTANCE_COUNT, delta.distance),
            SessionTransition::AppendToSession => mutation
                .add(attributes::SESSION_CONTRIBUTION_COUNT, delta.contribution)
                .add(attributes::SESSION_WAIT_TIME_SUM, delta.wait_time_minutes)
                .add(attributes::SESSION_GLOVE_COUNT, delta.glove)
                .add(attributes::SESSION_MASK_COUNT, delta.mask)
                .add(attributes::SESSION_DISTANCE_COUNT, delta.distance),
        };

        with_latest_values(mutation, delta)
    }
}

// Latest-write-wins fields are overwritten by both transitions.
fn with_latest_values(mutation: Mutation, delta: &Delta) -> Mutation {
    mutation
        .set(attributes::IS_OPEN, delta.is_open)
        .set(attributes::STOCK_LEVEL, delta.stock_level.as_str())
        .set(attributes::LAST_CONTRIBUTION_TIMESTAMP, delta.timestamp)
        .set(attributes::LAST_CONTRIBUTION_DATE, delta.display_date.as_str())
        .set(attributes::LAST_CONTRIBUTION_TIME, delta.display_time.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::{LatestValues, SessionTotals},
        store::{AttributeValue, FieldUpdate, Item},
    };

    fn delta() -> Delta {
        Delta {
            contribution: 1,
            wait_time_minutes: 15,
            glove: 1,
            mask: 0,
            distance: 1,
            is_open: true,
            stock_level: "low".into(),
            timestamp: 10_000,
            display_date: "01-01-1970".into(),
            display_time: "03:46:40".into(),
        }
    }

    fn stored(last: i64, count: i64) -> Item {
        let mut item = Item::new();
        item.insert(
            attributes::LAST_CONTRIBUTION_TIMESTAMP.into(),
            AttributeValue::Number(last),
        );
        item.insert(
            attributes::SESSION_CONTRIBUTION_COUNT.into(),
            AttributeValue::Number(count),
        );
        item
    }

    #[test]
    fn reset_overwrites_session_fields() {
        let mutation = SessionTransition::ResetSession.mutation(&delta());

        assert_eq!(
            mutation.update_for(attributes::LIFETIME_CONTRIBUTION_COUNT),
            Some(&FieldUpdate::Add(1))
        );
        assert_eq!(
            mutation.update_for(attributes::SESSION_CONTRIBUTION_COUNT),
            Some(&FieldUpdate::Set(AttributeValue::Number(1)))
        );
        assert_eq!(
            mutation.update_for(attributes::SESSION_WAIT_TIME_SUM),
            Some(&FieldUpdate::Set(AttributeValue::Number(15)))
        );
        assert_eq!(
            mutation.update_for(attributes::IS_OPEN),
            Some(&FieldUpdate::Set(AttributeValue::Bool(true)))
        );
    }

    #[test]
    fn append_adds_session_fields_and_overwrites_latest_values() {
        let mutation = SessionTransition::AppendToSession.mutation(&delta());

        for field in [
            attributes::LIFETIME_CONTRIBUTION_COUNT,
            attributes::SESSION_CONTRIBUTION_COUNT,
            attributes::SESSION_GLOVE_COUNT,
            attributes::SESSION_MASK_COUNT,
            attributes::SESSION_DISTANCE_COUNT,
        ] {
            assert!(matches!(mutation.update_for(field), Some(FieldUpdate::Add(_))), "{field}");
        }
        for field in [
            attributes::IS_OPEN,
            attributes::STOCK_LEVEL,
            attributes::LAST_CONTRIBUTION_TIMESTAMP,
            attributes::LAST_CONTRIBUTION_DATE,
            attributes::LAST_CONTRIBUTION_TIME,
        ] {
            assert!(matches!(mutation.update_for(field), Some(FieldUpdate::Set(_))), "{field}");
        }
    }

    #[test]
    fn reset_guard_passes_for_missing_aggregate() {
        let policy = SessionPolicy::default();
        let guard = SessionTransition::ResetSession.condition(&policy, 1_600_000_000);
        assert!(guard.evaluate(&Item::new()));
    }

    #[test]
    fn reset_guard_tracks_session_bounds() {
        let policy = SessionPolicy {
            max_size: 20,
            timeout_secs: 3600,
        };
        let now = 1_600_000_000;
        let guard = SessionTransition::ResetSession.condition(&policy, now);

        assert!(!guard.evaluate(&stored(now - 10, 5)), "live session");
        assert!(!guard.evaluate(&stored(now - 3599, 19)), "live, one below max");
        assert!(guard.evaluate(&stored(now - 3600, 5)), "stale at exactly the timeout");
        assert!(guard.evaluate(&stored(now - 10, 20)), "full");
    }

    #[test]
    fn append_guard_always_holds() {
        let guard = SessionTransition::AppendToSession.condition(&SessionPolicy::default(), 0);
        assert!(guard.evaluate(&stored(i64::MAX, i64::MAX)));
    }

    #[test]
    fn state_of_agrees_with_reset_guard() {
        let policy = SessionPolicy::default();
        let now = 1_600_000_000;
        let aggregate = |last: i64, count: i64| Aggregate {
            location_key: "shop".into(),
            lifetime_contribution_count: count,
            session: SessionTotals {
                contribution_count: count,
                ..Default::default()
            },
            latest: LatestValues {
                last_contribution_timestamp: last,
                ..Default::default()
            },
        };

        assert_eq!(policy.state_of(&aggregate(now - 5, 3), now), SessionState::Live);
        assert_eq!(policy.state_of(&aggregate(now - 3600, 3), now), SessionState::Stale);
        assert_eq!(policy.state_of(&aggregate(now - 5, 20), now), SessionState::Full);
    }
}
