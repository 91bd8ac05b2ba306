//! Chain invariant violations.
//!
//! Normal search never produces these: the graph store only hands out
//! admissible candidates. Seeing one means the store broke its contract.

use chrono::NaiveDate;

use super::ChainId;
use crate::domain::{AirportCode, Cost};

/// An attempted chain extension that would break a chain invariant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConstraintViolation {
    #[error("flight departs {to} but the chain is at {from}")]
    Discontinuous { from: AirportCode, to: AirportCode },

    #[error("flight on {next} is outside the connection window after {previous}")]
    OutsideWindow { previous: NaiveDate, next: NaiveDate },

    #[error("chain cost {cost} exceeds budget {budget}")]
    OverBudget { cost: Cost, budget: Cost },

    #[error("recorded chain cost {recorded} differs from flight total {actual}")]
    CostMismatch { recorded: Cost, actual: Cost },

    #[error("no chain with id {0:?}")]
    UnknownChain(ChainId),

    #[error("grafted tree has a different origin or anchor date")]
    RootMismatch,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ConstraintViolation::Discontinuous {
            from: AirportCode::parse("WAW").unwrap(),
            to: AirportCode::parse("VIE").unwrap(),
        };
        assert_eq!(err.to_string(), "flight departs VIE but the chain is at WAW");

        let err = ConstraintViolation::OverBudget {
            cost: Cost::from_cents(12001),
            budget: Cost::from_cents(12000),
        };
        assert_eq!(err.to_string(), "chain cost 120.01 exceeds budget 120.00");

        let err = ConstraintViolation::UnknownChain(ChainId(9));
        assert_eq!(err.to_string(), "no chain with id ChainId(9)");
    }
}
