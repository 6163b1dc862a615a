use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};

use crate::{
    db::{
        helpers::{decode_item, encode_item},
        Database,
    },
    store::{Condition, Item, KeyValueStore, Mutation, StoreError, UpdateOutcome},
};

fn read_attributes(conn: &Connection, key: &str) -> rusqlite::Result<Option<String>> {
    conn.query_row(
        "SELECT attributes FROM items WHERE item_key = ?1",
        params![key],
        |row| row.get(0),
    )
    .optional()
}

#[async_trait]
impl KeyValueStore for Database {
    async fn get_item(&self, key: &str) -> Result<Option<Item>, StoreError> {
        let key = key.to_string();
        let raw = self
            .execute(move |conn| {
                let raw = read_attributes(conn, &key)?;
                Ok(raw.map(|raw| (key, raw)))
            })
            .await?;

        raw.map(|(key, raw)| decode_item(&key, &raw)).transpose()
    }

    /// Check and write inside one IMMEDIATE transaction, so the write lock is
    /// held from the read of the current item until the commit.
    async fn conditional_update(
        &self,
        key: &str,
        mutation: &Mutation,
        condition: &Condition,
    ) -> Result<UpdateOutcome, StoreError> {
        let key = key.to_string();
        let mutation = mutation.clone();
        let condition = condition.clone();

        self.execute(move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            let current = match read_attributes(&tx, &key)? {
                Some(raw) => match decode_item(&key, &raw) {
                    Ok(item) => item,
                    Err(err) => return Ok(Err(err)),
                },
                None => Item::new(),
            };

            if !condition.evaluate(&current) {
                return Ok(Ok(UpdateOutcome::ConditionFailed));
            }

            let next = match mutation.apply_to(&current).and_then(|next| encode_item(&next)) {
                Ok(encoded) => encoded,
                Err(err) => return Ok(Err(err)),
            };

            let now = Utc::now().to_rfc3339();
            tx.execute(
                "INSERT INTO items (item_key, attributes, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?3)
                 ON CONFLICT(item_key) DO UPDATE SET
                     attributes = excluded.attributes,
                     updated_at = excluded.updated_at",
                params![key, next, now],
            )?;
            tx.commit()?;

            Ok(Ok(UpdateOutcome::Applied))
        })
        .await?
    }
}
