use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::quantity::{cost::Cost, energy::KilowattHours};

/// Energy consumed over a single metering interval.
#[must_use]
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize, derive_more::Constructor)]
pub struct MeterReading {
    pub timestamp: DateTime<Local>,

    #[serde(rename = "energy_kwh")]
    pub energy: KilowattHours,
}

/// Meter reading annotated with its off-peak classification and cost.
#[must_use]
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PricedReading {
    pub timestamp: DateTime<Local>,
    pub energy: KilowattHours,
    pub is_offpeak: bool,
    pub cost: Cost,
}
