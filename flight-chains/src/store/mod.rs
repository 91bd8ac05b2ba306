//! Graph store for airports, flights and distances.
//!
//! The store holds the normalized flight graph and answers the constrained
//! lookups the chain search needs. It is built once by ingestion and then
//! shared read-only by every search branch, so all lookups take `&self`.

mod distance;
mod error;
pub mod snapshot;

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::domain::{Airport, AirportCode, Cost, Flight, FlightId, FlightRecord};

pub use distance::{DistanceTable, haversine_km};
pub use error::StoreError;

/// Outcome counters of one `ingest_flights` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// New flights admitted
    pub inserted: usize,
    /// Existing flights displaced by a cheaper fare on the same day
    pub replaced: usize,
    /// Records dropped because an equal or cheaper fare was already held
    pub duplicates: usize,
    /// Records naming an airport the store does not know
    pub unknown_airport: usize,
    /// Records with a negative or non-finite cost
    pub invalid: usize,
}

impl IngestReport {
    /// Number of records that were skipped rather than stored.
    pub fn skipped(&self) -> usize {
        self.duplicates + self.unknown_airport + self.invalid
    }
}

/// Serializable contents of a store. Indexes are rebuilt on load.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreData {
    pub airports: Vec<Airport>,
    pub flights: Vec<Flight>,
}

type DedupKey = (AirportCode, AirportCode, NaiveDate);

/// In-memory flight graph.
#[derive(Debug, Clone, Default)]
pub struct GraphStore {
    airports: BTreeMap<AirportCode, Airport>,
    flights: Vec<Flight>,
    by_fare: HashMap<DedupKey, FlightId>,
    /// Departures per airport, sorted by `Flight::order_key`.
    departures: HashMap<AirportCode, Vec<FlightId>>,
    distances: DistanceTable,
}

impl GraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a store from snapshot contents.
    ///
    /// Flight ids are kept as stored. Distances are recomputed.
    pub fn from_data(data: StoreData) -> Self {
        let mut store = Self::new();
        store.insert_airports(data.airports);

        let mut flights = data.flights;
        flights.sort_by_key(|f| f.id);
        for (index, mut flight) in flights.into_iter().enumerate() {
            flight.id = FlightId(index as u32);
            store.by_fare.insert(flight.dedup_key(), flight.id);
            store
                .departures
                .entry(flight.source)
                .or_default()
                .push(flight.id);
            store.flights.push(flight);
        }

        store.sort_departures();
        store.compute_distances();
        store
    }

    /// Snapshot contents of this store.
    pub fn to_data(&self) -> StoreData {
        StoreData {
            airports: self.airports.values().copied().collect(),
            flights: self.flights.clone(),
        }
    }

    /// Insert airports. An airport whose code is already held is ignored.
    ///
    /// Returns the number of airports added.
    pub fn insert_airports(&mut self, airports: impl IntoIterator<Item = Airport>) -> usize {
        let mut added = 0;
        for airport in airports {
            if self.airports.contains_key(&airport.code) {
                trace!(code = %airport.code, "airport already present");
                continue;
            }
            self.airports.insert(airport.code, airport);
            added += 1;
        }
        added
    }

    /// Compute the pairwise distance table from all held airports.
    pub fn compute_distances(&mut self) {
        self.distances = DistanceTable::compute(self.airports.values());
        debug!(pairs = self.distances.len(), "computed airport distances");
    }

    /// Admit flight records.
    ///
    /// Records naming an unknown airport or carrying an invalid cost are
    /// skipped. Of several fares for the same (source, destination, date)
    /// the cheapest is kept; on a tie the first one wins. Ingesting the
    /// same records again changes nothing.
    pub fn ingest_flights(&mut self, records: impl IntoIterator<Item = FlightRecord>) -> IngestReport {
        let mut report = IngestReport::default();

        for record in records {
            if !self.airports.contains_key(&record.source)
                || !self.airports.contains_key(&record.destination)
            {
                trace!(
                    source = %record.source,
                    destination = %record.destination,
                    "skipping flight with unknown airport"
                );
                report.unknown_airport += 1;
                continue;
            }

            let cost = match Cost::from_amount(record.cost) {
                Ok(cost) => cost,
                Err(e) => {
                    trace!(error = %e, "skipping flight with invalid cost");
                    report.invalid += 1;
                    continue;
                }
            };

            let key = (record.source, record.destination, record.date);
            match self.by_fare.get(&key) {
                Some(id) => {
                    let existing = &mut self.flights[id.index()];
                    if cost < existing.cost {
                        existing.cost = cost;
                        report.replaced += 1;
                    } else {
                        report.duplicates += 1;
                    }
                }
                None => {
                    let id = FlightId(self.flights.len() as u32);
                    self.flights.push(Flight {
                        id,
                        source: record.source,
                        destination: record.destination,
                        date: record.date,
                        cost,
                    });
                    self.by_fare.insert(key, id);
                    self.departures.entry(record.source).or_default().push(id);
                    report.inserted += 1;
                }
            }
        }

        self.sort_departures();
        debug!(
            inserted = report.inserted,
            replaced = report.replaced,
            skipped = report.skipped(),
            "ingested flights"
        );
        report
    }

    fn sort_departures(&mut self) {
        let flights = &self.flights;
        for ids in self.departures.values_mut() {
            ids.sort_by_key(|id| flights[id.index()].order_key());
        }
    }

    /// Flights departing `airport` with `cost <= max_cost` and a date in
    /// `[date_lower, date_upper]`.
    ///
    /// Results are ordered by date, then destination code, then cost.
    pub fn matching_flights(
        &self,
        airport: AirportCode,
        max_cost: Cost,
        date_lower: NaiveDate,
        date_upper: NaiveDate,
    ) -> Result<Vec<Flight>, StoreError> {
        if !self.airports.contains_key(&airport) {
            return Err(StoreError::AirportNotFound(airport));
        }

        let Some(ids) = self.departures.get(&airport) else {
            return Ok(Vec::new());
        };

        let start = ids.partition_point(|id| self.flights[id.index()].date < date_lower);
        Ok(ids[start..]
            .iter()
            .map(|id| self.flights[id.index()])
            .take_while(|f| f.date <= date_upper)
            .filter(|f| f.cost <= max_cost)
            .collect())
    }

    /// Like `matching_flights`, but departing any airport within
    /// `radius_km` of `airport` (including `airport` itself).
    ///
    /// Results are ordered by date, then source, then destination, then cost.
    pub fn matching_flights_near(
        &self,
        airport: AirportCode,
        radius_km: f64,
        max_cost: Cost,
        date_lower: NaiveDate,
        date_upper: NaiveDate,
    ) -> Result<Vec<Flight>, StoreError> {
        let mut flights = Vec::new();
        for source in self.nearby_airports(airport, radius_km)? {
            flights.extend(self.matching_flights(source, max_cost, date_lower, date_upper)?);
        }
        flights.sort_by_key(|f| (f.date, f.source, f.destination, f.cost));
        Ok(flights)
    }

    /// Look up an airport by code.
    pub fn airport(&self, code: AirportCode) -> Result<&Airport, StoreError> {
        self.airports
            .get(&code)
            .ok_or(StoreError::AirportNotFound(code))
    }

    /// Great-circle distance in kilometres, by either ordering.
    pub fn distance(&self, a: AirportCode, b: AirportCode) -> Result<f64, StoreError> {
        self.airport(a)?;
        self.airport(b)?;
        self.distances
            .get(a, b)
            .ok_or(StoreError::DistanceUnavailable(a, b))
    }

    /// The airport itself plus every airport within `radius_km`, by code.
    pub fn nearby_airports(
        &self,
        code: AirportCode,
        radius_km: f64,
    ) -> Result<Vec<AirportCode>, StoreError> {
        self.airport(code)?;
        let mut near = self.distances.within(code, radius_km);
        if !near.contains(&code) {
            near.push(code);
            near.sort();
        }
        Ok(near)
    }

    /// Look up a flight by id.
    pub fn flight(&self, id: FlightId) -> Option<&Flight> {
        self.flights.get(id.index())
    }

    /// Whether any admitted flight is free.
    pub fn has_zero_cost_flights(&self) -> bool {
        self.flights.iter().any(|f| f.cost.is_zero())
    }

    pub fn airports(&self) -> impl Iterator<Item = &Airport> {
        self.airports.values()
    }

    pub fn flights(&self) -> &[Flight] {
        &self.flights
    }

    pub fn airport_count(&self) -> usize {
        self.airports.len()
    }

    pub fn flight_count(&self) -> usize {
        self.flights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flights.is_empty()
    }
}
