use std::path::PathBuf;

use clap::Parser;

use crate::{
    api::file::JsonFile,
    cli::PricingArgs,
    core::pipeline::Pipeline,
    prelude::*,
    tables::{build_points_table, build_summary_table, build_tariff_table},
};

#[derive(Parser)]
pub struct ReportArgs {
    #[clap(flatten)]
    pricing: PricingArgs,

    /// JSON array of `{"timestamp": "…", "energy_kwh": …}` readings.
    readings_file: PathBuf,
}

impl ReportArgs {
    #[instrument(skip_all, fields(path = %self.readings_file.display()))]
    pub fn run(&self) -> Result {
        let config = self.pricing.read_config()?;
        let readings = JsonFile(self.readings_file.clone()).read_all()?;
        let output = Pipeline::builder()
            .tariff(&config.provider)
            .periods(&config.enedis.offpeak_periods)
            .measurement(&config.influx.measurement)
            .invalid_readings(self.pricing.invalid_readings)
            .build()
            .run(&readings)
            .context("failed to price the readings")?;
        println!("{}", build_tariff_table(&config.provider, &config.enedis.offpeak_periods));
        println!("{}", build_points_table(&output.points));
        println!("{}", build_summary_table(&output, &config.provider));
        Ok(())
    }
}
