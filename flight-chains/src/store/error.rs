//! Graph store error types.

use crate::domain::AirportCode;

/// Errors from graph store lookups.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The airport code is not in the store
    #[error("airport {0} not found")]
    AirportNotFound(AirportCode),

    /// Distances have not been computed for this pair
    #[error("no distance recorded between {0} and {1}")]
    DistanceUnavailable(AirportCode, AirportCode),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let waw = AirportCode::parse("WAW").unwrap();
        let vie = AirportCode::parse("VIE").unwrap();

        assert_eq!(
            StoreError::AirportNotFound(waw).to_string(),
            "airport WAW not found"
        );
        assert_eq!(
            StoreError::DistanceUnavailable(waw, vie).to_string(),
            "no distance recorded between WAW and VIE"
        );
    }
}
