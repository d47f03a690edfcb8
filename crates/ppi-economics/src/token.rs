// crates/ppi-economics/src/token.rs
//
// PPI token amount type and unit constants.
//
// The smallest unit of PPI is 10^-18 PPI. All internal accounting uses base
// units to avoid floating-point precision issues in reward calculations.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};

use ppi_core::Amount;

/// Number of base units in one PPI.
pub const UNIT: Amount = 1_000_000_000_000_000_000;

/// A PPI (or vePPI) amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Ppi {
    /// Amount in base units (1 PPI = 10^18 units).
    pub units: Amount,
}

impl Ppi {
    /// Create an amount from whole tokens.
    ///
    /// # Example
    /// ```
    /// use ppi_economics::token::Ppi;
    /// let amount = Ppi::from_whole(3);
    /// assert_eq!(amount.units, 3_000_000_000_000_000_000);
    /// ```
    pub fn from_whole(tokens: u128) -> Self {
        Self {
            units: tokens.saturating_mul(UNIT),
        }
    }

    /// Create an amount from base units.
    pub fn from_units(units: Amount) -> Self {
        Self { units }
    }

    /// Returns zero PPI.
    pub fn zero() -> Self {
        Self { units: 0 }
    }
}

impl Add for Ppi {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            units: self.units.saturating_add(rhs.units),
        }
    }
}

impl Sub for Ppi {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            units: self.units.saturating_sub(rhs.units),
        }
    }
}

impl fmt::Display for Ppi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.units / UNIT;
        let frac = self.units % UNIT;
        if frac == 0 {
            write!(f, "{} PPI", whole)
        } else {
            // Up to 18 decimal places, trailing zeros trimmed
            let frac_str = format!("{:018}", frac);
            let trimmed = frac_str.trim_end_matches('0');
            write!(f, "{}.{} PPI", whole, trimmed)
        }
    }
}
