//! Fare amounts in the base currency.

use std::fmt;
use std::iter::Sum;
use std::ops::Add;

use serde::{Deserialize, Serialize};

/// Error returned when a fare amount cannot be represented.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("invalid cost {amount}: {reason}")]
pub struct InvalidCost {
    amount: f64,
    reason: &'static str,
}

/// A non-negative amount in the base currency, held in hundredths.
///
/// Feeds hand out floating point prices; they are rounded to two decimal
/// places on the way in so that sums of costs along a chain are exact.
///
/// # Examples
///
/// ```
/// use flight_chains::domain::Cost;
///
/// let cost = Cost::from_amount(40.499).unwrap();
/// assert_eq!(cost.cents(), 4050);
/// assert_eq!(cost.to_string(), "40.50");
/// assert!(Cost::from_amount(-1.0).is_err());
/// ```
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Cost(u64);

impl Cost {
    pub const ZERO: Cost = Cost(0);

    /// Create a cost from a whole number of hundredths.
    pub const fn from_cents(cents: u64) -> Self {
        Cost(cents)
    }

    /// Create a cost from a currency amount, rounding to two decimals.
    pub fn from_amount(amount: f64) -> Result<Self, InvalidCost> {
        if !amount.is_finite() {
            return Err(InvalidCost {
                amount,
                reason: "must be finite",
            });
        }
        if amount < 0.0 {
            return Err(InvalidCost {
                amount,
                reason: "must not be negative",
            });
        }
        let cents = (amount * 100.0).round();
        if cents > u64::MAX as f64 {
            return Err(InvalidCost {
                amount,
                reason: "too large",
            });
        }
        Ok(Cost(cents as u64))
    }

    /// Returns the amount in hundredths.
    pub fn cents(&self) -> u64 {
        self.0
    }

    /// Returns the amount as a currency value.
    pub fn as_amount(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Subtract, returning `None` if the result would be negative.
    pub fn checked_sub(self, other: Cost) -> Option<Cost> {
        self.0.checked_sub(other.0).map(Cost)
    }

    pub fn saturating_sub(self, other: Cost) -> Cost {
        Cost(self.0.saturating_sub(other.0))
    }

    pub fn checked_add(self, other: Cost) -> Option<Cost> {
        self.0.checked_add(other.0).map(Cost)
    }
}

impl Add for Cost {
    type Output = Cost;

    fn add(self, rhs: Cost) -> Cost {
        Cost(self.0.saturating_add(rhs.0))
    }
}

impl Sum for Cost {
    fn sum<I: Iterator<Item = Cost>>(iter: I) -> Cost {
        iter.fold(Cost::ZERO, Add::add)
    }
}

impl fmt::Display for Cost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}
