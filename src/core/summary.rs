use crate::{
    core::{error::PricingError, reading::PricedReading, tariff::ProviderTariff},
    quantity::{cost::Cost, energy::KilowattHours},
};

/// Period totals.
///
/// Partial summaries merge with `+`, so that a batch may be split and reduced in any order.
#[must_use]
#[derive(
    Copy,
    Clone,
    Debug,
    Default,
    PartialEq,
    derive_more::Add,
    derive_more::AddAssign,
    derive_more::Sum,
)]
pub struct PeriodSummary {
    pub total_energy: KilowattHours,

    /// «Heures pleines» energy, only tracked with peak and off-peak pricing.
    pub total_energy_peak: KilowattHours,

    /// «Heures creuses» energy, only tracked with peak and off-peak pricing.
    pub total_energy_offpeak: KilowattHours,

    pub total_price: Cost,
}

impl PeriodSummary {
    pub fn accumulate(
        mut self,
        reading: &PricedReading,
        peak_offpeak_enabled: bool,
    ) -> Result<Self, PricingError> {
        self.total_energy += reading.energy;
        self.total_price += reading.cost;
        if peak_offpeak_enabled {
            if reading.is_offpeak {
                self.total_energy_offpeak += reading.energy;
            } else {
                self.total_energy_peak += reading.energy;
            }
        }
        self.ensure_finite()?;
        Ok(self)
    }

    pub fn ensure_finite(&self) -> Result<(), PricingError> {
        if self.total_energy.is_finite()
            && self.total_energy_peak.is_finite()
            && self.total_energy_offpeak.is_finite()
            && self.total_price.is_finite()
        {
            Ok(())
        } else {
            Err(PricingError::Aggregation(format!("non-finite totals: {self:?}")))
        }
    }

    /// Price of the total energy, should it be billed at the flat rate.
    pub fn flat_price(&self, tariff: &ProviderTariff) -> Cost {
        self.total_energy * tariff.price_per_kwh
    }

    /// Price of the peak and off-peak energy at the respective rates.
    pub fn peak_offpeak_price(&self, tariff: &ProviderTariff) -> Cost {
        self.total_energy_peak * tariff.price_per_kwh_peak
            + self.total_energy_offpeak * tariff.price_per_kwh_offpeak
    }
}
