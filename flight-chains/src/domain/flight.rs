//! Flight edges of the graph.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{AirportCode, Cost};

/// Stable identity of a flight within a graph store.
///
/// This is the flight's index in the store's flight table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlightId(pub u32);

impl FlightId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A directed, dated, priced edge between two airports.
///
/// Dates have calendar-day granularity; there is no time of day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Flight {
    pub id: FlightId,
    pub source: AirportCode,
    pub destination: AirportCode,
    pub date: NaiveDate,
    pub cost: Cost,
}

impl Flight {
    /// The (date, destination, cost) key flights are ordered by.
    ///
    /// Candidate order in the search depends on this, so output is
    /// reproducible across runs.
    pub fn order_key(&self) -> (NaiveDate, AirportCode, Cost) {
        (self.date, self.destination, self.cost)
    }

    /// The (source, destination, date) triple that identifies a fare.
    pub fn dedup_key(&self) -> (AirportCode, AirportCode, NaiveDate) {
        (self.source, self.destination, self.date)
    }
}

impl fmt::Display for Flight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}->{} {} ({})",
            self.source, self.destination, self.date, self.cost
        )
    }
}

/// A flight as offered by a feed, before it has been admitted to a store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightRecord {
    pub source: AirportCode,
    pub destination: AirportCode,
    pub date: NaiveDate,
    /// Price in the base currency, not yet rounded.
    pub cost: f64,
}

impl FlightRecord {
    pub fn new(source: AirportCode, destination: AirportCode, date: NaiveDate, cost: f64) -> Self {
        Self {
            source,
            destination,
            date,
            cost,
        }
    }
}
