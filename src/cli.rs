//! Command-line interface argument parsing.
//!
//! The binary stands in for the transport layer: it decodes a submission
//! into an observation, stamps it with the current time, and prints the
//! consensus as JSON.

use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

use crate::models::{ObservationPayload, ValidationError};

/// shoppulse - crowd-sourced shop status aggregates
///
/// Examples:
///   shoppulse record --location node/42 --wait 15 --open --mask
///   shoppulse record --json '{"locationKey":"node/42","waitTimeMinutes":15}'
///   shoppulse consensus --location node/42
///   shoppulse init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Path to the JSON settings file
    #[arg(
        long,
        value_name = "FILE",
        default_value = "shoppulse.json",
        env = "SHOPPULSE_SETTINGS"
    )]
    pub settings: PathBuf,

    /// SQLite database path (overrides the settings file)
    #[arg(long, value_name = "FILE", env = "SHOPPULSE_DATABASE")]
    pub database: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Record one observation for a location
    Record(RecordArgs),

    /// Print the current consensus for a location
    Consensus {
        /// Location key, e.g. an OpenStreetMap node id
        #[arg(long, value_name = "KEY")]
        location: String,
    },

    /// Write a settings file with default values
    InitConfig,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct RecordArgs {
    /// Full observation as a camelCase JSON object
    #[arg(long, value_name = "JSON", conflicts_with = "location")]
    pub json: Option<String>,

    /// Location key, e.g. an OpenStreetMap node id
    #[arg(long, value_name = "KEY", required_unless_present = "json")]
    pub location: Option<String>,

    /// Estimated wait time in minutes
    #[arg(long, value_name = "MINUTES", default_value = "0", allow_negative_numbers = true)]
    pub wait: i64,

    /// The shop is open
    #[arg(long)]
    pub open: bool,

    /// Staff wear gloves
    #[arg(long)]
    pub gloves: bool,

    /// Staff and customers wear masks
    #[arg(long)]
    pub mask: bool,

    /// Distancing is respected
    #[arg(long)]
    pub distancing: bool,

    /// Free-form stock level, e.g. "low"
    #[arg(long, value_name = "LEVEL")]
    pub stock: Option<String>,
}

impl RecordArgs {
    pub fn into_payload(self) -> Result<ObservationPayload, ValidationError> {
        if let Some(body) = self.json {
            return ObservationPayload::from_json(&body);
        }

        Ok(ObservationPayload {
            location_key: self.location.unwrap_or_default(),
            wait_time_minutes: self.wait,
            is_open: self.open,
            wears_gloves: self.gloves,
            wears_mask: self.mask,
            respects_distancing: self.distancing,
            stock_level: self.stock,
        })
    }
}
