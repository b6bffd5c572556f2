use async_trait::async_trait;

use crate::{
    core::{interval::Interval, reading::MeterReading},
    prelude::*,
};

/// Source of the consumption readings.
#[async_trait]
pub trait MeterSource: Sync {
    /// Get the readings within the interval, in chronological order.
    async fn get_readings(&self, interval: Interval) -> Result<Vec<MeterReading>>;
}
