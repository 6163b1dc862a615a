use anyhow::{bail, Context, Result};
use log::info;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::{aggregation::DisplayFormat, models::ValidationLimits, repository::SessionPolicy};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseSettings {
    #[serde(default = "default_database_path")]
    pub path: PathBuf,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            path: default_database_path(),
        }
    }
}

fn default_database_path() -> PathBuf {
    PathBuf::from("shoppulse.sqlite3")
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default)]
    pub session: SessionPolicy,
    #[serde(default)]
    pub display: DisplayFormat,
    #[serde(default)]
    pub validation: ValidationLimits,
    #[serde(default)]
    pub database: DatabaseSettings,
}

impl Settings {
    /// Read settings from `path`, falling back to defaults when it does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        let settings = if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            let settings: Settings = serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse settings in {}", path.display()))?;
            info!("Loaded settings from {}", path.display());
            settings
        } else {
            Settings::default()
        };

        settings
            .validate()
            .with_context(|| format!("Invalid settings in {}", path.display()))?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.session.max_size < 1 {
            bail!("session.maxSize must be at least 1 (got {})", self.session.max_size);
        }
        if self.session.timeout_secs < 1 {
            bail!(
                "session.timeoutSecs must be at least 1 (got {})",
                self.session.timeout_secs
            );
        }
        if self.validation.max_location_key_len == 0 {
            bail!("validation.maxLocationKeyLen must be at least 1");
        }
        self.display.validate()
    }

    pub fn persist(&self, path: &Path) -> Result<()> {
        let serialized = serde_json::to_string_pretty(self)?;
        fs::write(path, serialized)
            .with_context(|| format!("Failed to write settings to {}", path.display()))
    }
}
