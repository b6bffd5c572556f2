use crate::quantity::energy::KilowattHours;

/// Pricing engine failure.
///
/// Configuration and aggregation errors abort the run. An invalid reading aborts the run
/// unless the pipeline is told to skip such readings, and a point construction error only
/// drops the offending reading.
#[derive(Debug, thiserror::Error)]
pub enum PricingError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("invalid reading: energy `{energy:?}` must be finite and non-negative")]
    InvalidReading { energy: KilowattHours },

    #[error("failed to construct the point: {0}")]
    PointConstruction(String),

    #[error("aggregation error: {0}")]
    Aggregation(String),
}
