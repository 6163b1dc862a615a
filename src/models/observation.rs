//! Observation data models.
//!
//! An `Observation` is one contributor's report about a shop. It only ever
//! exists on the way into the aggregate store; the store keeps sums, not
//! individual observations.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Observation {
    pub location_key: String,
    pub wait_time_minutes: u32,
    pub is_open: bool,
    pub wears_gloves: bool,
    pub wears_mask: bool,
    pub respects_distancing: bool,
    pub stock_level: String,
}

/// Inbound payload as decoded from a transport, before validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObservationPayload {
    #[serde(alias = "osmNodeId")]
    pub location_key: String,
    #[serde(default)]
    pub wait_time_minutes: i64,
    #[serde(default)]
    pub is_open: bool,
    #[serde(default)]
    pub wears_gloves: bool,
    #[serde(default)]
    pub wears_mask: bool,
    #[serde(default)]
    pub respects_distancing: bool,
    #[serde(default)]
    pub stock_level: Option<String>,
}

impl ObservationPayload {
    pub fn from_json(body: &str) -> Result<Self, validation::ValidationError> {
        serde_json::from_str(body)
            .map_err(|err| validation::ValidationError::Malformed(err.to_string()))
    }

    pub fn validate(
        self,
        limits: &validation::ValidationLimits,
    ) -> Result<Observation, validation::ValidationError> {
        let location_key = validation::validate_location_key(&self.location_key, limits)?;
        let wait_time_minutes = validation::validate_wait_time(self.wait_time_minutes, limits)?;
        let stock_level = validation::validate_stock_level(self.stock_level, limits)?;

        Ok(Observation {
            location_key,
            wait_time_minutes,
            is_open: self.is_open,
            wears_gloves: self.wears_gloves,
            wears_mask: self.wears_mask,
            respects_distancing: self.respects_distancing,
            stock_level,
        })
    }
}

/// Validation functions for inbound observations
pub mod validation {
    use serde::{Deserialize, Serialize};
    use thiserror::Error;

    #[derive(Debug, Clone, PartialEq, Eq, Error)]
    pub enum ValidationError {
        #[error("malformed observation: {0}")]
        Malformed(String),
        #[error("location key is required")]
        EmptyLocationKey,
        #[error("location key too long ({len} chars, max {max})")]
        LocationKeyTooLong { len: usize, max: usize },
        #[error("wait time cannot be negative (got {0})")]
        NegativeWaitTime(i64),
        #[error("wait time of {value} minutes exceeds the {max} minute limit")]
        WaitTimeTooLong { value: i64, max: u32 },
        #[error("stock level too long ({len} chars, max {max})")]
        StockLevelTooLong { len: usize, max: usize },
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ValidationLimits {
        #[serde(default = "default_max_wait_time_minutes")]
        pub max_wait_time_minutes: u32,
        #[serde(default = "default_max_location_key_len")]
        pub max_location_key_len: usize,
        #[serde(default = "default_max_stock_level_len")]
        pub max_stock_level_len: usize,
    }

    impl Default for ValidationLimits {
        fn default() -> Self {
            Self {
                max_wait_time_minutes: default_max_wait_time_minutes(),
                max_location_key_len: default_max_location_key_len(),
                max_stock_level_len: default_max_stock_level_len(),
            }
        }
    }

    fn default_max_wait_time_minutes() -> u32 {
        600
    }

    fn default_max_location_key_len() -> usize {
        128
    }

    fn default_max_stock_level_len() -> usize {
        64
    }

    pub fn validate_location_key(
        raw: &str,
        limits: &ValidationLimits,
    ) -> Result<String, ValidationError> {
        let key = raw.trim();
        if key.is_empty() {
            return Err(ValidationError::EmptyLocationKey);
        }

        let len = key.chars().count();
        if len > limits.max_location_key_len {
            return Err(ValidationError::LocationKeyTooLong {
                len,
                max: limits.max_location_key_len,
            });
        }

        Ok(key.to_string())
    }

    pub fn validate_wait_time(value: i64, limits: &ValidationLimits) -> Result<u32, ValidationError> {
        if value < 0 {
            return Err(ValidationError::NegativeWaitTime(value));
        }
        if value > i64::from(limits.max_wait_time_minutes) {
            return Err(ValidationError::WaitTimeTooLong {
                value,
                max: limits.max_wait_time_minutes,
            });
        }
        // Bounded by max_wait_time_minutes above.
        Ok(value as u32)
    }

    pub fn validate_stock_level(
        raw: Option<String>,
        limits: &ValidationLimits,
    ) -> Result<String, ValidationError> {
        let level = raw.map(|s| s.trim().to_string()).unwrap_or_default();
        let len = level.chars().count();
        if len > limits.max_stock_level_len {
            return Err(ValidationError::StockLevelTooLong {
                len,
                max: limits.max_stock_level_len,
            });
        }
        Ok(level)
    }
}

#[cfg(test)]
mod tests {
    use super::validation::{ValidationError, ValidationLimits};
    use super::*;

    #[test]
    fn decodes_camel_case_payload() {
        let body = r#"{
            "locationKey": "node/42",
            "waitTimeMinutes": 15,
            "isOpen": true,
            "wearsMask": true,
            "stockLevel": " low "
        }"#;

        let observation = ObservationPayload::from_json(body)
            .unwrap()
            .validate(&ValidationLimits::default())
            .unwrap();

        assert_eq!(observation.location_key, "node/42");
        assert_eq!(observation.wait_time_minutes, 15);
        assert!(observation.is_open);
        assert!(observation.wears_mask);
        assert!(!observation.wears_gloves);
        assert_eq!(observation.stock_level, "low");
    }

    #[test]
    fn accepts_osm_node_id_alias() {
        let payload = ObservationPayload::from_json(r#"{"osmNodeId": "123"}"#).unwrap();
        assert_eq!(payload.location_key, "123");
    }

    #[test]
    fn rejects_malformed_json() {
        let err = ObservationPayload::from_json("{not json").unwrap_err();
        assert!(matches!(err, ValidationError::Malformed(_)));
    }

    #[test]
    fn rejects_blank_location_key() {
        let payload = ObservationPayload {
            location_key: "   ".into(),
            ..Default::default()
        };
        assert_eq!(
            payload.validate(&ValidationLimits::default()).unwrap_err(),
            ValidationError::EmptyLocationKey
        );
    }

    #[test]
    fn rejects_negative_and_excessive_wait_times() {
        let limits = ValidationLimits::default();
        let negative = ObservationPayload {
            location_key: "a".into(),
            wait_time_minutes: -1,
            ..Default::default()
        };
        assert_eq!(
            negative.validate(&limits).unwrap_err(),
            ValidationError::NegativeWaitTime(-1)
        );

        let excessive = ObservationPayload {
            location_key: "a".into(),
            wait_time_minutes: 601,
            ..Default::default()
        };
        assert!(matches!(
            excessive.validate(&limits).unwrap_err(),
            ValidationError::WaitTimeTooLong { value: 601, max: 600 }
        ));
    }

    #[test]
    fn rejects_oversized_fields() {
        let limits = ValidationLimits {
            max_location_key_len: 4,
            max_stock_level_len: 3,
            ..Default::default()
        };

        let long_key = ObservationPayload {
            location_key: "abcde".into(),
            ..Default::default()
        };
        assert!(matches!(
            long_key.validate(&limits).unwrap_err(),
            ValidationError::LocationKeyTooLong { len: 5, max: 4 }
        ));

        let long_stock = ObservationPayload {
            location_key: "abc".into(),
            stock_level: Some("plenty".into()),
            ..Default::default()
        };
        assert!(matches!(
            long_stock.validate(&limits).unwrap_err(),
            ValidationError::StockLevelTooLong { len: 6, max: 3 }
        ));
    }
}
