mod ingest;
mod report;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use self::{ingest::IngestArgs, report::ReportArgs};
use crate::{config::Config, core::pipeline::InvalidReadingPolicy, prelude::*};

#[derive(Parser)]
#[command(author, version, about, propagate_version = true)]
#[must_use]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Main command: fetch the readings, price them, and push the points to InfluxDB.
    #[clap(name = "ingest")]
    Ingest(Box<IngestArgs>),

    /// Price the readings from a JSON file and print the report.
    #[clap(name = "report")]
    Report(Box<ReportArgs>),
}

#[derive(Parser)]
pub struct PricingArgs {
    /// Configuration file with the provider, Enedis, and InfluxDB sections.
    #[clap(long = "config", env = "CONFIG_PATH", default_value = "enedis-influx.toml")]
    pub config_path: PathBuf,

    /// What to do with negative or non-finite readings.
    #[clap(
        long = "invalid-readings",
        env = "INVALID_READINGS",
        value_enum,
        default_value_t = InvalidReadingPolicy::Abort,
    )]
    pub invalid_readings: InvalidReadingPolicy,
}

impl PricingArgs {
    pub fn read_config(&self) -> Result<Config> {
        let config = Config::read_from(&self.config_path)
            .with_context(|| format!("failed to load `{}`", self.config_path.display()))?;
        info!(
            provider = %config.provider.name,
            peak_offpeak_enabled = config.provider.peak_offpeak_enabled,
            n_offpeak_periods = config.enedis.offpeak_periods.len(),
            "loaded the configuration"
        );
        Ok(config)
    }
}
