//! Tariff classification and pricing engine.

pub mod error;
pub mod interval;
pub mod offpeak;
pub mod pipeline;
pub mod point;
pub mod reading;
pub mod summary;
pub mod tariff;
