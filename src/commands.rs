use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use log::{debug, warn};

use crate::{
    cli::RecordArgs,
    models::{ConsensusLookup, ValidationLimits},
    repository::AggregateRepository,
    store::KeyValueStore,
};

/// Decode, validate and record one submission received at `now`.
pub async fn record<S: KeyValueStore>(
    repository: &AggregateRepository<S>,
    limits: &ValidationLimits,
    args: RecordArgs,
    now: DateTime<Utc>,
) -> Result<()> {
    let observation = args
        .into_payload()
        .and_then(|payload| payload.validate(limits))
        .context("observation rejected")?;

    debug!("Recording observation for {}", observation.location_key);

    repository
        .record_observation(&observation.location_key, &observation, now)
        .await
        .map_err(|err| {
            if err.is_retryable() {
                warn!("Retryable failure recording {}: {err}", observation.location_key);
            }
            err
        })
        .with_context(|| format!("failed to record observation for {}", observation.location_key))
}

/// Consensus for `location` as a JSON document; `{}` for an unknown location.
pub async fn consensus_json<S: KeyValueStore>(
    repository: &AggregateRepository<S>,
    location: &str,
) -> Result<String> {
    let lookup = repository
        .get_consensus(location.trim())
        .await
        .with_context(|| format!("failed to read consensus for {location}"))?;

    match lookup {
        ConsensusLookup::Found(consensus) => Ok(serde_json::to_string_pretty(&consensus)?),
        ConsensusLookup::NotFound => Ok("{}".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::{
        aggregation::DisplayFormat,
        models::Consensus,
        repository::SessionPolicy,
        store::MemoryStore,
    };

    fn repository() -> AggregateRepository<MemoryStore> {
        AggregateRepository::new(
            MemoryStore::new(),
            SessionPolicy::default(),
            DisplayFormat::default(),
        )
    }

    fn args(location: &str, wait: i64) -> RecordArgs {
        RecordArgs {
            json: None,
            location: Some(location.to_string()),
            wait,
            open: true,
            gloves: false,
            mask: true,
            distancing: false,
            stock: Some("low".into()),
        }
    }

    #[tokio::test]
    async fn records_then_reports_consensus() {
        let repo = repository();
        let now = Utc.with_ymd_and_hms(2020, 4, 2, 9, 0, 0).unwrap();
        let limits = ValidationLimits::default();

        record(&repo, &limits, args("node/5", 10), now).await.unwrap();
        record(&repo, &limits, args(" node/5 ", 20), now).await.unwrap();

        let json = consensus_json(&repo, "node/5").await.unwrap();
        let consensus: Consensus = serde_json::from_str(&json).unwrap();
        assert_eq!(consensus.wait_time_minutes, 15);
        assert_eq!(consensus.session_contribution_count, 2);
        assert!(consensus.wears_mask);
        assert!(json.contains("\"waitTimeMinutes\""));
    }

    #[tokio::test]
    async fn unknown_location_prints_empty_object() {
        let repo = repository();
        assert_eq!(consensus_json(&repo, "nowhere").await.unwrap(), "{}");
    }

    #[tokio::test]
    async fn invalid_submission_never_reaches_store() {
        let repo = repository();
        let now = Utc.with_ymd_and_hms(2020, 4, 2, 9, 0, 0).unwrap();

        let err = record(&repo, &ValidationLimits::default(), args("node/5", -3), now)
            .await
            .unwrap_err();
        assert!(format!("{err:#}").contains("negative"));
        assert!(repo.store().is_empty());
    }
}
