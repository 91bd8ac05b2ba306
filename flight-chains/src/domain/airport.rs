//! Airport and country code types.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::DomainError;

/// Error returned when parsing an invalid IATA airport code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid airport code: {reason}")]
pub struct InvalidAirportCode {
    reason: &'static str,
}

/// Error returned when parsing an invalid ISO country code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid country code: {reason}")]
pub struct InvalidCountryCode {
    reason: &'static str,
}

fn parse_upper<const N: usize>(s: &str) -> Result<[u8; N], &'static str> {
    let bytes = s.as_bytes();

    if bytes.len() != N {
        return Err(if N == 3 {
            "must be exactly 3 characters"
        } else {
            "must be exactly 2 characters"
        });
    }

    let mut out = [0u8; N];
    for (slot, &b) in out.iter_mut().zip(bytes) {
        if !b.is_ascii_uppercase() {
            return Err("must be uppercase ASCII letters A-Z");
        }
        *slot = b;
    }

    Ok(out)
}

/// A valid 3-letter IATA airport code.
///
/// Codes are always 3 uppercase ASCII letters. Ordering is the
/// lexicographic order of the code text, which the graph store relies
/// on for deterministic candidate ordering.
///
/// # Examples
///
/// ```
/// use flight_chains::domain::AirportCode;
///
/// let waw = AirportCode::parse("WAW").unwrap();
/// assert_eq!(waw.as_str(), "WAW");
///
/// assert!(AirportCode::parse("waw").is_err());
/// assert!(AirportCode::parse("WA").is_err());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AirportCode([u8; 3]);

impl AirportCode {
    /// Parse an airport code from a string.
    pub fn parse(s: &str) -> Result<Self, InvalidAirportCode> {
        parse_upper::<3>(s)
            .map(AirportCode)
            .map_err(|reason| InvalidAirportCode { reason })
    }

    /// Returns the code as a string slice.
    pub fn as_str(&self) -> &str {
        // Only uppercase ASCII is ever stored.
        std::str::from_utf8(&self.0).unwrap_or("???")
    }
}

impl TryFrom<String> for AirportCode {
    type Error = InvalidAirportCode;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<AirportCode> for String {
    fn from(code: AirportCode) -> Self {
        code.as_str().to_string()
    }
}

impl fmt::Debug for AirportCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AirportCode({})", self.as_str())
    }
}

impl fmt::Display for AirportCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A valid 2-letter ISO 3166 country code.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CountryCode([u8; 2]);

impl CountryCode {
    /// Parse a country code from a string.
    pub fn parse(s: &str) -> Result<Self, InvalidCountryCode> {
        parse_upper::<2>(s)
            .map(CountryCode)
            .map_err(|reason| InvalidCountryCode { reason })
    }

    /// Returns the code as a string slice.
    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.0).unwrap_or("??")
    }
}

impl TryFrom<String> for CountryCode {
    type Error = InvalidCountryCode;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CountryCode> for String {
    fn from(code: CountryCode) -> Self {
        code.as_str().to_string()
    }
}

impl fmt::Debug for CountryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CountryCode({})", self.as_str())
    }
}

impl fmt::Display for CountryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An airport in the flight graph.
///
/// Immutable once ingested; keyed by `code`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Airport {
    pub code: AirportCode,
    pub country: CountryCode,
    pub latitude: f64,
    pub longitude: f64,
}

impl Airport {
    pub fn new(code: AirportCode, country: CountryCode, latitude: f64, longitude: f64) -> Self {
        Self {
            code,
            country,
            latitude,
            longitude,
        }
    }

    /// Create an airport, rejecting coordinates outside the valid range.
    pub fn try_new(
        code: AirportCode,
        country: CountryCode,
        latitude: f64,
        longitude: f64,
    ) -> Result<Self, DomainError> {
        let valid = (-90.0..=90.0).contains(&latitude) && (-180.0..=180.0).contains(&longitude);
        if !valid {
            return Err(DomainError::InvalidCoordinates {
                latitude,
                longitude,
            });
        }
        Ok(Self::new(code, country, latitude, longitude))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_valid_codes() {
        assert!(AirportCode::parse("WAW").is_ok());
        assert!(AirportCode::parse("VIE").is_ok());
        assert!(CountryCode::parse("PL").is_ok());
    }

    #[test]
    fn reject_lowercase() {
        assert!(AirportCode::parse("waw").is_err());
        assert!(AirportCode::parse("Waw").is_err());
        assert!(CountryCode::parse("pl").is_err());
    }

    #[test]
    fn reject_wrong_length() {
        assert!(AirportCode::parse("").is_err());
        assert!(AirportCode::parse("WA").is_err());
        assert!(AirportCode::parse("WAWA").is_err());
        assert!(CountryCode::parse("POL").is_err());
    }

    #[test]
    fn reject_non_letters() {
        assert!(AirportCode::parse("W1W").is_err());
        assert!(AirportCode::parse("W W").is_err());
        assert!(AirportCode::parse("WÖ").is_err());
    }

    #[test]
    fn error_messages() {
        let err = AirportCode::parse("WA").unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid airport code: must be exactly 3 characters"
        );
        let err = CountryCode::parse("p1").unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid country code: must be uppercase ASCII letters A-Z"
        );
    }

    #[test]
    fn ordering_matches_text() {
        let mut codes: Vec<_> = ["VIE", "ATH", "WAW", "BRU"]
            .iter()
            .map(|s| AirportCode::parse(s).unwrap())
            .collect();
        codes.sort();
        let text: Vec<_> = codes.iter().map(|c| c.as_str()).collect();
        assert_eq!(text, vec!["ATH", "BRU", "VIE", "WAW"]);
    }

    #[test]
    fn display_and_debug() {
        let code = AirportCode::parse("SOF").unwrap();
        assert_eq!(format!("{code}"), "SOF");
        assert_eq!(format!("{code:?}"), "AirportCode(SOF)");
    }

    #[test]
    fn airport_rejects_bad_coordinates() {
        let code = AirportCode::parse("WAW").unwrap();
        let country = CountryCode::parse("PL").unwrap();
        assert!(Airport::try_new(code, country, 52.17, 20.97).is_ok());
        assert!(Airport::try_new(code, country, 95.0, 20.97).is_err());
        assert!(Airport::try_new(code, country, 52.17, f64::NAN).is_err());
    }

    #[test]
    fn serde_as_string() {
        let code = AirportCode::parse("WAW").unwrap();
        let json = serde_json::to_string(&code).unwrap();
        assert_eq!(json, "\"WAW\"");

        let bad: Result<AirportCode, _> = serde_json::from_str("\"waw\"");
        assert!(bad.is_err());
    }
}
