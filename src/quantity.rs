pub mod cost;
pub mod energy;
pub mod power;
pub mod rate;

use serde::{Deserialize, Serialize};

/// Dimensioned `f64` quantity.
///
/// The const parameters are the exponents of power, time and cost, so that the compiler
/// rejects, for example, adding a cost to an energy.
#[derive(
    Clone,
    Copy,
    Default,
    Deserialize,
    PartialEq,
    PartialOrd,
    Serialize,
    derive_more::Add,
    derive_more::AddAssign,
    derive_more::From,
    derive_more::FromStr,
    derive_more::Sub,
    derive_more::Sum,
)]
#[must_use]
pub struct Quantity<const POWER: isize, const TIME: isize, const COST: isize>(pub f64);

impl<const POWER: isize, const TIME: isize, const COST: isize> Quantity<POWER, TIME, COST> {
    #[cfg(test)]
    pub const ZERO: Self = Self(0.0);

    #[must_use]
    pub const fn is_finite(self) -> bool {
        self.0.is_finite()
    }

    #[must_use]
    pub const fn is_negative(self) -> bool {
        self.0 < 0.0
    }
}
