//! TOML configuration, loaded once per run.

use std::path::Path;

use serde::Deserialize;

use crate::core::{error::PricingError, offpeak::OffPeakPeriods, tariff::ProviderTariff};

#[must_use]
#[derive(Deserialize)]
pub struct Config {
    pub provider: ProviderTariff,

    #[serde(default)]
    pub enedis: EnedisConfig,

    #[serde(default)]
    pub influx: InfluxConfig,
}

impl Config {
    pub fn read_from(path: &Path) -> Result<Self, PricingError> {
        let contents = std::fs::read_to_string(path).map_err(|error| {
            PricingError::Configuration(format!("failed to read `{}`: {error}", path.display()))
        })?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, PricingError> {
        let this: Self = toml::from_str(contents)
            .map_err(|error| PricingError::Configuration(error.to_string()))?;
        this.validate()?;
        Ok(this)
    }

    pub fn validate(&self) -> Result<(), PricingError> {
        self.provider.validate()?;
        if let Some(period) = self.enedis.offpeak_periods.iter().find(|period| period.is_empty()) {
            return Err(PricingError::Configuration(format!(
                "off-peak period `{period}` is empty"
            )));
        }
        if self.provider.peak_offpeak_enabled && self.enedis.offpeak_periods.is_empty() {
            return Err(PricingError::Configuration(
                "peak and off-peak pricing is enabled, but no off-peak periods are configured"
                    .to_string(),
            ));
        }
        Ok(())
    }
}

#[must_use]
#[derive(Default, Deserialize)]
pub struct EnedisConfig {
    pub usage_point_id: Option<String>,

    pub access_token: Option<String>,

    pub base_url: Option<String>,

    #[serde(default)]
    pub offpeak_periods: OffPeakPeriods,
}

#[must_use]
#[derive(Deserialize)]
pub struct InfluxConfig {
    #[serde(default = "InfluxConfig::default_url")]
    pub url: String,

    pub user: Option<String>,

    pub password: Option<String>,

    #[serde(default = "InfluxConfig::default_database")]
    pub database: String,

    /// Measurement name of the written points.
    #[serde(default = "InfluxConfig::default_measurement", alias = "measure")]
    pub measurement: String,
}

impl InfluxConfig {
    fn default_url() -> String {
        "http://localhost:8086".to_string()
    }

    fn default_database() -> String {
        "enedis".to_string()
    }

    fn default_measurement() -> String {
        "consumption".to_string()
    }
}

impl Default for InfluxConfig {
    fn default() -> Self {
        Self {
            url: Self::default_url(),
            user: None,
            password: None,
            database: Self::default_database(),
            measurement: Self::default_measurement(),
        }
    }
}
