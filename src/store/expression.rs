//! Attribute values, update expressions and conditions understood by every store.
//!
//! A store evaluates a [`Condition`] against the item currently held for a key
//! (an empty item when the key is unknown) and, only when it holds, applies a
//! [`Mutation`] as a single unit.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use super::StoreError;

/// A single stored attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Bool(bool),
    Number(i64),
    Text(String),
}

impl AttributeValue {
    pub fn as_number(&self) -> Option<i64> {
        match self {
            AttributeValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttributeValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttributeValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    fn type_name(&self) -> &'static str {
        match self {
            AttributeValue::Bool(_) => "bool",
            AttributeValue::Number(_) => "number",
            AttributeValue::Text(_) => "text",
        }
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        AttributeValue::Bool(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        AttributeValue::Number(value)
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::Text(value)
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::Text(value.to_string())
    }
}

/// Attributes of one stored item, keyed by attribute name.
pub type Item = BTreeMap<String, AttributeValue>;

/// How one attribute changes when a mutation is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldUpdate {
    /// Overwrite with an absolute value.
    Set(AttributeValue),
    /// Add to the stored number, treating a missing attribute as zero.
    Add(i64),
}

/// An ordered set of per-attribute updates applied all-or-nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Mutation {
    updates: Vec<(String, FieldUpdate)>,
}

impl Mutation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, field: &str, value: impl Into<AttributeValue>) -> Self {
        self.updates
            .push((field.to_string(), FieldUpdate::Set(value.into())));
        self
    }

    pub fn add(mut self, field: &str, amount: i64) -> Self {
        self.updates.push((field.to_string(), FieldUpdate::Add(amount)));
        self
    }

    pub fn updates(&self) -> &[(String, FieldUpdate)] {
        &self.updates
    }

    pub fn update_for(&self, field: &str) -> Option<&FieldUpdate> {
        self.updates
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, update)| update)
    }

    /// Produce the item that results from applying every update to `current`.
    ///
    /// `current` is left untouched, so a failure part way through never
    /// leaves a partially mutated item behind.
    pub fn apply_to(&self, current: &Item) -> Result<Item, StoreError> {
        let mut seen = HashSet::new();
        let mut next = current.clone();

        for (field, update) in &self.updates {
            if !seen.insert(field.as_str()) {
                return Err(StoreError::InvalidMutation {
                    field: field.clone(),
                    reason: "attribute updated more than once".into(),
                });
            }

            match update {
                FieldUpdate::Set(value) => {
                    next.insert(field.clone(), value.clone());
                }
                FieldUpdate::Add(amount) => {
                    let base = match next.get(field) {
                        None => 0,
                        Some(AttributeValue::Number(n)) => *n,
                        Some(other) => {
                            return Err(StoreError::InvalidMutation {
                                field: field.clone(),
                                reason: format!("cannot add to a {} attribute", other.type_name()),
                            })
                        }
                    };
                    let total = base.checked_add(*amount).ok_or_else(|| {
                        StoreError::InvalidMutation {
                            field: field.clone(),
                            reason: "numeric overflow".into(),
                        }
                    })?;
                    next.insert(field.clone(), AttributeValue::Number(total));
                }
            }
        }

        Ok(next)
    }
}

/// A predicate over the stored item, evaluated atomically with the update.
///
/// Numeric comparisons treat a missing attribute as zero and are false for
/// attributes holding a non-numeric value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    Always,
    LessThan { field: String, value: i64 },
    AtLeast { field: String, value: i64 },
    Or(Vec<Condition>),
}

impl Condition {
    pub fn less_than(field: &str, value: i64) -> Self {
        Condition::LessThan {
            field: field.to_string(),
            value,
        }
    }

    pub fn at_least(field: &str, value: i64) -> Self {
        Condition::AtLeast {
            field: field.to_string(),
            value,
        }
    }

    pub fn evaluate(&self, item: &Item) -> bool {
        match self {
            Condition::Always => true,
            Condition::LessThan { field, value } => {
                number_or_zero(item, field).map_or(false, |stored| stored < *value)
            }
            Condition::AtLeast { field, value } => {
                number_or_zero(item, field).map_or(false, |stored| stored >= *value)
            }
            Condition::Or(branches) => branches.iter().any(|branch| branch.evaluate(item)),
        }
    }
}

fn number_or_zero(item: &Item, field: &str) -> Option<i64> {
    match item.get(field) {
        None => Some(0),
        Some(value) => value.as_number(),
    }
}
