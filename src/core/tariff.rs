use serde::{Deserialize, Serialize};

use crate::{
    core::error::PricingError,
    quantity::{cost::Cost, energy::KilowattHours, rate::KilowattHourRate},
};

/// Energy provider subscription.
#[must_use]
#[derive(Clone, Debug, Serialize, Deserialize, bon::Builder)]
pub struct ProviderTariff {
    #[serde(default)]
    #[builder(into, default)]
    pub name: String,

    /// Subscription price per year, reported only.
    #[serde(default)]
    #[builder(default)]
    pub annual_fee: Cost,

    /// Subscribed power in kVA, reported only.
    #[serde(default)]
    #[builder(default)]
    pub max_power: u32,

    /// Enables the peak and off-peak rates instead of the flat one.
    #[serde(default)]
    #[builder(default)]
    pub peak_offpeak_enabled: bool,

    /// Flat rate.
    #[serde(default)]
    #[builder(default)]
    pub price_per_kwh: KilowattHourRate,

    /// «Heures pleines» rate.
    #[serde(default)]
    #[builder(default)]
    pub price_per_kwh_peak: KilowattHourRate,

    /// «Heures creuses» rate.
    #[serde(default)]
    #[builder(default)]
    pub price_per_kwh_offpeak: KilowattHourRate,
}

impl ProviderTariff {
    /// Rate applied to energy consumed in the specified window.
    pub const fn applicable_rate(&self, is_offpeak: bool) -> KilowattHourRate {
        match (self.peak_offpeak_enabled, is_offpeak) {
            (false, _) => self.price_per_kwh,
            (true, true) => self.price_per_kwh_offpeak,
            (true, false) => self.price_per_kwh_peak,
        }
    }

    pub fn price(&self, energy: KilowattHours, is_offpeak: bool) -> Result<Cost, PricingError> {
        if !energy.is_finite() || energy.is_negative() {
            return Err(PricingError::InvalidReading { energy });
        }
        Ok(energy * self.applicable_rate(is_offpeak))
    }

    pub fn validate(&self) -> Result<(), PricingError> {
        if !self.annual_fee.is_finite() || self.annual_fee.is_negative() {
            return Err(PricingError::Configuration(format!(
                "annual fee must be finite and non-negative, got `{:?}`",
                self.annual_fee,
            )));
        }
        for (name, rate) in [
            ("price_per_kwh", self.price_per_kwh),
            ("price_per_kwh_peak", self.price_per_kwh_peak),
            ("price_per_kwh_offpeak", self.price_per_kwh_offpeak),
        ] {
            if !rate.is_finite() || rate.is_negative() {
                return Err(PricingError::Configuration(format!(
                    "`{name}` must be finite and non-negative, got `{rate:?}`"
                )));
            }
        }
        Ok(())
    }
}
