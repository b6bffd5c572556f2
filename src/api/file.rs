use std::path::PathBuf;

use async_trait::async_trait;
use itertools::Itertools;

use crate::{
    api::meter_source::MeterSource,
    core::{interval::Interval, reading::MeterReading},
    prelude::*,
};

/// JSON array of readings, for offline pricing.
pub struct JsonFile(pub PathBuf);

impl JsonFile {
    #[instrument(skip_all, fields(path = %self.0.display()))]
    pub fn read_all(&self) -> Result<Vec<MeterReading>> {
        let contents = std::fs::read_to_string(&self.0)
            .with_context(|| format!("failed to read `{}`", self.0.display()))?;
        let readings: Vec<MeterReading> = serde_json::from_str(&contents)
            .with_context(|| format!("failed to deserialize `{}`", self.0.display()))?;
        info!(n_readings = readings.len(), "loaded");
        Ok(readings)
    }
}

#[async_trait]
impl MeterSource for JsonFile {
    async fn get_readings(&self, interval: Interval) -> Result<Vec<MeterReading>> {
        Ok(self
            .read_all()?
            .into_iter()
            .filter(|reading| interval.contains(reading.timestamp))
            .sorted_by_key(|reading| reading.timestamp)
            .collect())
    }
}
