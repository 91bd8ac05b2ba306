//! Domain error types.
//!
//! These errors represent validation failures when raw feed values are
//! turned into domain types. They are distinct from I/O errors.

use super::{InvalidAirportCode, InvalidCost, InvalidCountryCode};

/// Domain-level errors for validation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DomainError {
    #[error(transparent)]
    AirportCode(#[from] InvalidAirportCode),

    #[error(transparent)]
    CountryCode(#[from] InvalidCountryCode),

    #[error(transparent)]
    Cost(#[from] InvalidCost),

    /// Latitude or longitude outside the valid range
    #[error("invalid coordinates: ({latitude}, {longitude})")]
    InvalidCoordinates { latitude: f64, longitude: f64 },

    /// Connection window offsets invalid or wider than the limit
    #[error("invalid connection window: [{min_days}, {max_days}] days")]
    InvalidWindow { min_days: i64, max_days: i64 },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AirportCode, Cost};

    #[test]
    fn error_display() {
        let err: DomainError = AirportCode::parse("W").unwrap_err().into();
        assert_eq!(
            err.to_string(),
            "invalid airport code: must be exactly 3 characters"
        );

        let err: DomainError = Cost::from_amount(-2.0).unwrap_err().into();
        assert_eq!(err.to_string(), "invalid cost -2: must not be negative");

        let err = DomainError::InvalidCoordinates {
            latitude: 91.0,
            longitude: 0.0,
        };
        assert_eq!(err.to_string(), "invalid coordinates: (91, 0)");

        let err = DomainError::InvalidWindow {
            min_days: 4,
            max_days: 2,
        };
        assert_eq!(err.to_string(), "invalid connection window: [4, 2] days");
    }
}
