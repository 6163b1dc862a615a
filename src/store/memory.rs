use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
};

use async_trait::async_trait;
use log::error;

use super::{Condition, Item, KeyValueStore, Mutation, StoreError, UpdateOutcome};

/// In-memory store. Each call holds the map lock for its whole
/// check-and-apply, which gives the same per-key atomicity as a real store.
#[derive(Clone, Default)]
pub struct MemoryStore {
    items: Arc<Mutex<HashMap<String, Item>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the item stored under `key`, bypassing conditions.
    pub fn insert(&self, key: &str, item: Item) {
        self.lock().insert(key.to_string(), item);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Item>> {
        match self.items.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                error!("Memory store lock poisoned; continuing with inner state");
                poisoned.into_inner()
            }
        }
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get_item(&self, key: &str) -> Result<Option<Item>, StoreError> {
        Ok(self.lock().get(key).cloned())
    }

    async fn conditional_update(
        &self,
        key: &str,
        mutation: &Mutation,
        condition: &Condition,
    ) -> Result<UpdateOutcome, StoreError> {
        let mut items = self.lock();
        let empty = Item::new();
        let current = items.get(key).unwrap_or(&empty);

        if !condition.evaluate(current) {
            return Ok(UpdateOutcome::ConditionFailed);
        }

        let next = mutation.apply_to(current)?;
        items.insert(key.to_string(), next);
        Ok(UpdateOutcome::Applied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::AttributeValue;

    #[tokio::test]
    async fn unknown_key_reads_as_none() {
        let store = MemoryStore::new();
        assert!(store.get_item("nowhere").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn rejected_condition_does_not_create_item() {
        let store = MemoryStore::new();
        let outcome = store
            .conditional_update(
                "shop",
                &Mutation::new().add("count", 1),
                &Condition::at_least("count", 5),
            )
            .await
            .unwrap();

        assert_eq!(outcome, UpdateOutcome::ConditionFailed);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn applied_update_creates_item() {
        let store = MemoryStore::new();
        let outcome = store
            .conditional_update(
                "shop",
                &Mutation::new().add("count", 1).set("open", true),
                &Condition::Always,
            )
            .await
            .unwrap();

        assert_eq!(outcome, UpdateOutcome::Applied);
        let item = store.get_item("shop").await.unwrap().unwrap();
        assert_eq!(item.get("count"), Some(&AttributeValue::Number(1)));
        assert_eq!(item.get("open"), Some(&AttributeValue::Bool(true)));
    }
}
