//! Key-value store capability consumed by the aggregate repository.
//!
//! Implementations:
//! - [`MemoryStore`]: in-process map, used by tests
//! - [`crate::db::Database`]: SQLite on a dedicated worker thread

pub mod expression;
pub mod memory;

use async_trait::async_trait;
use thiserror::Error;

pub use expression::{AttributeValue, Condition, FieldUpdate, Item, Mutation};
pub use memory::MemoryStore;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The store could not be reached or failed while serving the call.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The store refused the mutation itself, independent of the condition.
    #[error("invalid mutation of `{field}`: {reason}")]
    InvalidMutation { field: String, reason: String },

    /// A stored item could not be decoded.
    #[error("stored item `{key}` is unreadable: {reason}")]
    CorruptItem { key: String, reason: String },
}

impl From<anyhow::Error> for StoreError {
    fn from(err: anyhow::Error) -> Self {
        StoreError::Unavailable(format!("{err:#}"))
    }
}

/// Result of a conditional update that reached the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    Applied,
    ConditionFailed,
}

/// Point reads and atomic conditional updates, linearizable per key.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Fetch the item stored under `key`, or `None` when it was never written.
    async fn get_item(&self, key: &str) -> Result<Option<Item>, StoreError>;

    /// Apply `mutation` to the item under `key` only if `condition` holds.
    ///
    /// The condition is evaluated against an empty item when the key is
    /// unknown; a successful update then creates it.
    async fn conditional_update(
        &self,
        key: &str,
        mutation: &Mutation,
        condition: &Condition,
    ) -> Result<UpdateOutcome, StoreError>;
}
