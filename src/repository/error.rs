use thiserror::Error;

use crate::{
    models::{CorruptAggregate, ValidationError},
    store::StoreError,
};

#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The observation was rejected before any store call.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Transient store failure; the caller may retry the whole operation.
    #[error("store unavailable for `{location_key}`: {message}")]
    StoreUnavailable {
        location_key: String,
        message: String,
    },

    /// The store refused an append, or holds values no accepted sequence of
    /// observations can produce. Retrying would not help.
    #[error("invariant violated for `{location_key}`: {detail}")]
    InvariantViolation {
        location_key: String,
        detail: String,
    },
}

impl RepositoryError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, RepositoryError::StoreUnavailable { .. })
    }

    pub(crate) fn from_store(location_key: &str, err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(message) => RepositoryError::StoreUnavailable {
                location_key: location_key.to_string(),
                message,
            },
            invalid @ (StoreError::InvalidMutation { .. } | StoreError::CorruptItem { .. }) => RepositoryError::InvariantViolation {
                location_key: location_key.to_string(),
                detail: invalid.to_string(),
            },
        }
    }
}

impl From<CorruptAggregate> for RepositoryError {
    fn from(err: CorruptAggregate) -> Self {
        RepositoryError::InvariantViolation {
            location_key: err.location_key.clone(),
            detail: err.to_string(),
        }
    }
}
