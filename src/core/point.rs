use chrono::{DateTime, Local};

use crate::core::{error::PricingError, reading::PricedReading};

/// Time-series point as stored by the sink.
#[must_use]
#[derive(Clone, Debug, PartialEq)]
pub struct OutputPoint {
    pub measurement: String,
    pub period: TariffPeriod,
    pub fields: Fields,
    pub timestamp: DateTime<Local>,
}

impl OutputPoint {
    pub fn try_build(
        measurement: &str,
        reading: &PricedReading,
        has_offpeak_periods: bool,
    ) -> Result<Self, PricingError> {
        if measurement.is_empty() {
            return Err(PricingError::PointConstruction("empty measurement name".to_string()));
        }
        if measurement.contains(['\n', '\r']) {
            return Err(PricingError::PointConstruction(format!(
                "measurement name `{}` contains a line break",
                measurement.escape_debug(),
            )));
        }
        let fields = Fields { power: reading.energy.as_watt_hours(), price: reading.cost.0 };
        if !fields.power.is_finite() || !fields.price.is_finite() {
            return Err(PricingError::PointConstruction(format!(
                "non-finite fields at {}: {fields:?}",
                reading.timestamp,
            )));
        }
        Ok(Self {
            measurement: measurement.to_string(),
            period: TariffPeriod::classify(reading.is_offpeak, has_offpeak_periods),
            fields,
            timestamp: reading.timestamp,
        })
    }

    /// Tag set, exactly one of the tags is `"1"`.
    #[must_use]
    pub const fn tags(&self) -> [(&'static str, &'static str); 3] {
        self.period.tags()
    }
}

#[must_use]
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Fields {
    /// Consumed energy, in watt-hours.
    pub power: f64,

    pub price: f64,
}

#[must_use]
#[derive(Copy, Clone, Debug, Eq, PartialEq, derive_more::Display)]
pub enum TariffPeriod {
    /// «Heures creuses».
    #[display("HC")]
    OffPeak,

    /// «Heures pleines».
    #[display("HP")]
    Peak,

    /// No off-peak windows configured.
    #[display("HN")]
    Normal,
}

impl TariffPeriod {
    pub const fn classify(is_offpeak: bool, has_offpeak_periods: bool) -> Self {
        match (has_offpeak_periods, is_offpeak) {
            (false, _) => Self::Normal,
            (true, true) => Self::OffPeak,
            (true, false) => Self::Peak,
        }
    }

    #[must_use]
    pub const fn tags(self) -> [(&'static str, &'static str); 3] {
        const fn flag(is_set: bool) -> &'static str {
            if is_set { "1" } else { "0" }
        }
        [
            ("heures_creuses", flag(matches!(self, Self::OffPeak))),
            ("heures_pleines", flag(matches!(self, Self::Peak))),
            ("heures_normales", flag(matches!(self, Self::Normal))),
        ]
    }
}
