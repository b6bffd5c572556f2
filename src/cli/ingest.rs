use std::path::PathBuf;

use chrono::{Local, Timelike};
use clap::Parser;

use crate::{
    api::{enedis, file::JsonFile, influx, meter_source::MeterSource},
    cli::PricingArgs,
    config::Config,
    core::{interval::Interval, pipeline::Pipeline},
    prelude::*,
    tables::{build_points_table, build_summary_table, build_tariff_table},
};

#[derive(Parser)]
pub struct IngestArgs {
    #[clap(flatten)]
    pricing: PricingArgs,

    /// Number of days to fetch, until now.
    #[clap(long, env = "DAYS", default_value = "1")]
    days: u32,

    /// Do not push the points to InfluxDB (dry run).
    #[clap(long)]
    scout: bool,

    /// Read the readings from a JSON file instead of Enedis.
    #[clap(long = "readings-file", env = "READINGS_FILE")]
    readings_file: Option<PathBuf>,

    /// Overrides `enedis.access_token` of the configuration.
    #[clap(long = "enedis-access-token", env = "ENEDIS_ACCESS_TOKEN")]
    enedis_access_token: Option<String>,

    /// Overrides `influx.password` of the configuration.
    #[clap(long = "influx-password", env = "INFLUX_PASSWORD")]
    influx_password: Option<String>,
}

impl IngestArgs {
    #[instrument(skip_all, fields(days = self.days, scout = self.scout))]
    pub async fn run(self) -> Result {
        let mut config = self.pricing.read_config()?;
        if let Some(password) = self.influx_password.clone() {
            config.influx.password = Some(password);
        }

        // Sink configuration errors must surface before any reading is fetched:
        let sink = if self.scout { None } else { Some(influx::Client::new(&config.influx)?) };

        let now = Local::now();
        let interval = Interval::days_until(self.days, now.with_nanosecond(0).unwrap_or(now));
        let readings = self.meter_source(&config)?.get_readings(interval).await?;
        info!(n_readings = readings.len(), ?interval, "fetched the readings");

        println!("{}", build_tariff_table(&config.provider, &config.enedis.offpeak_periods));
        let output = Pipeline::builder()
            .tariff(&config.provider)
            .periods(&config.enedis.offpeak_periods)
            .measurement(&config.influx.measurement)
            .invalid_readings(self.pricing.invalid_readings)
            .build()
            .run(&readings)
            .context("failed to price the readings")?;
        println!("{}", build_points_table(&output.points));
        println!("{}", build_summary_table(&output, &config.provider));

        if let Some(sink) = sink {
            sink.write(&output.points).await?;
        }
        Ok(())
    }

    fn meter_source(&self, config: &Config) -> Result<Box<dyn MeterSource>> {
        if let Some(path) = &self.readings_file {
            return Ok(Box::new(JsonFile(path.clone())));
        }
        let access_token = self
            .enedis_access_token
            .as_deref()
            .or(config.enedis.access_token.as_deref())
            .context("Enedis access token is not configured")?;
        let usage_point_id = config
            .enedis
            .usage_point_id
            .clone()
            .context("Enedis usage point ID is not configured")?;
        let base_url = config.enedis.base_url.as_deref().unwrap_or(enedis::Api::DEFAULT_BASE_URL);
        Ok(Box::new(enedis::Api::try_new(base_url, access_token, usage_point_id)?))
    }
}
