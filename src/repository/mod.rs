//! Aggregate repository: folds observations into per-location aggregates.
//!
//! A write never reads first. It issues the `ResetSession` update under a
//! guard that only holds when the stored session is stale or full (or absent),
//! and falls back to `AppendToSession` when the store rejects that guard.
//! Concurrent writers to the same key are serialized by the store alone.

pub mod error;
pub mod session;

use chrono::{DateTime, Utc};
use log::{debug, error, info};

use crate::{
    aggregation::{to_consensus, to_delta, DisplayFormat},
    models::{Aggregate, ConsensusLookup, Observation, ValidationError},
    store::{KeyValueStore, UpdateOutcome},
};

pub use error::RepositoryError;
pub use session::{SessionPolicy, SessionState, SessionTransition};

pub struct AggregateRepository<S> {
    store: S,
    policy: SessionPolicy,
    display: DisplayFormat,
}

impl<S: KeyValueStore> AggregateRepository<S> {
    pub fn new(store: S, policy: SessionPolicy, display: DisplayFormat) -> Self {
        Self {
            store,
            policy,
            display,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn policy(&self) -> &SessionPolicy {
        &self.policy
    }

    /// Fold one accepted observation into the aggregate for `location_key`.
    ///
    /// `now` is the time the observation was received; it becomes the
    /// aggregate's last contribution timestamp.
    pub async fn record_observation(
        &self,
        location_key: &str,
        observation: &Observation,
        now: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        if location_key.trim().is_empty() {
            return Err(ValidationError::EmptyLocationKey.into());
        }

        let delta = to_delta(observation, now, &self.display);
        let now_secs = delta.timestamp;

        let reset = SessionTransition::ResetSession;
        let outcome = self
            .store
            .conditional_update(
                location_key,
                &reset.mutation(&delta),
                &reset.condition(&self.policy, now_secs),
            )
            .await
            .map_err(|err| RepositoryError::from_store(location_key, err))?;

        if outcome == UpdateOutcome::Applied {
            info!("Started new session for {location_key}");
            return Ok(());
        }

        debug!("Session for {location_key} is live; appending");

        let append = SessionTransition::AppendToSession;
        let outcome = self
            .store
            .conditional_update(
                location_key,
                &append.mutation(&delta),
                &append.condition(&self.policy, now_secs),
            )
            .await
            .map_err(|err| RepositoryError::from_store(location_key, err))?;

        match outcome {
            UpdateOutcome::Applied => Ok(()),
            UpdateOutcome::ConditionFailed => {
                error!("Append rejected for {location_key}; observation dropped");
                Err(RepositoryError::InvariantViolation {
                    location_key: location_key.to_string(),
                    detail: format!(
                        "{} update rejected after {} was rejected",
                        append.as_str(),
                        reset.as_str()
                    ),
                })
            }
        }
    }

    /// Current consensus for `location_key`, or `NotFound` if it was never observed.
    pub async fn get_consensus(&self, location_key: &str) -> Result<ConsensusLookup, RepositoryError> {
        match self.get_aggregate(location_key).await? {
            Some(aggregate) => Ok(ConsensusLookup::Found(to_consensus(&aggregate))),
            None => Ok(ConsensusLookup::NotFound),
        }
    }

    /// Raw stored aggregate, checked for consistency.
    pub async fn get_aggregate(&self, location_key: &str) -> Result<Option<Aggregate>, RepositoryError> {
        let item = self
            .store
            .get_item(location_key)
            .await
            .map_err(|err| RepositoryError::from_store(location_key, err))?;

        let Some(item) = item else {
            return Ok(None);
        };

        let aggregate = Aggregate::from_item(location_key, &item)?;
        if let Err(err) = aggregate.check_consistency() {
            error!("{err}");
            return Err(err.into());
        }

        Ok(Some(aggregate))
    }

    /// Session state of the stored aggregate as seen at `now`.
    pub async fn session_state(
        &self,
        location_key: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<SessionState>, RepositoryError> {
        let aggregate = self.get_aggregate(location_key).await?;
        Ok(aggregate.map(|aggregate| self.policy.state_of(&aggregate, now.timestamp())))
    }
}
