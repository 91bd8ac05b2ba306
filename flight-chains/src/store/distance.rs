//! Great-circle distances between airports.
//!
//! Distances are computed once per unordered airport pair and looked up
//! by either ordering.

use std::collections::HashMap;

use crate::domain::{Airport, AirportCode};

/// Mean Earth radius in kilometres.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two coordinates, in kilometres.
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_KM * c
}

/// Symmetric table of pairwise airport distances.
#[derive(Debug, Clone, Default)]
pub struct DistanceTable {
    /// Keyed by (smaller code, larger code).
    pairs: HashMap<(AirportCode, AirportCode), f64>,
}

fn pair_key(a: AirportCode, b: AirportCode) -> (AirportCode, AirportCode) {
    if a <= b { (a, b) } else { (b, a) }
}

impl DistanceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compute distances for every unordered pair of `airports`.
    pub fn compute<'a>(airports: impl IntoIterator<Item = &'a Airport>) -> Self {
        let airports: Vec<&Airport> = airports.into_iter().collect();
        let mut pairs = HashMap::with_capacity(airports.len() * (airports.len() + 1) / 2);

        for (i, a) in airports.iter().enumerate() {
            for b in &airports[i..] {
                let km = if a.code == b.code {
                    0.0
                } else {
                    haversine_km(a.latitude, a.longitude, b.latitude, b.longitude)
                };
                pairs.insert(pair_key(a.code, b.code), km);
            }
        }

        Self { pairs }
    }

    /// Distance in kilometres, by either ordering of the pair.
    pub fn get(&self, a: AirportCode, b: AirportCode) -> Option<f64> {
        self.pairs.get(&pair_key(a, b)).copied()
    }

    /// All airports within `radius_km` of `from`, including `from` itself.
    pub fn within(&self, from: AirportCode, radius_km: f64) -> Vec<AirportCode> {
        let mut codes: Vec<AirportCode> = self
            .pairs
            .iter()
            .filter(|(_, km)| **km <= radius_km)
            .filter_map(|((a, b), _)| {
                if *a == from {
                    Some(*b)
                } else if *b == from {
                    Some(*a)
                } else {
                    None
                }
            })
            .collect();
        codes.sort();
        codes.dedup();
        codes
    }

    /// Number of unordered pairs recorded (including self pairs).
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}
