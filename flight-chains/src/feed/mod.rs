//! External data feeds.
//!
//! Ingestion reads the flight graph from two kinds of collaborator: a
//! connectivity feed for routes and fares, and a geo feed for airport
//! locations. Each is a trait so new providers plug in without touching
//! the store or the planner.

mod cache;
mod error;
mod fixture;

use std::future::Future;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{AirportCode, CountryCode};

pub use cache::{CacheConfig, CachedFeed};
pub use error::FeedError;
pub use fixture::FixtureFeed;

/// A directed route an airline flies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Route {
    pub source: AirportCode,
    pub destination: AirportCode,
}

impl Route {
    pub fn new(source: AirportCode, destination: AirportCode) -> Self {
        Self {
            source,
            destination,
        }
    }
}

/// Lowest fare on a route for one day, already in the base currency.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Fare {
    pub date: NaiveDate,
    pub cost: f64,
}

/// Reference data for one airport.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AirportInfo {
    pub country: CountryCode,
    pub latitude: f64,
    pub longitude: f64,
}

/// Source of routes and fare calendars.
pub trait ConnectivityFeed: Send + Sync {
    /// Every route the feed knows about.
    fn list_routes(&self) -> impl Future<Output = Result<Vec<Route>, FeedError>> + Send;

    /// Fares for `source -> destination` departing between the dates,
    /// inclusive.
    fn fare_calendar(
        &self,
        source: AirportCode,
        destination: AirportCode,
        date_from: NaiveDate,
        date_to: NaiveDate,
    ) -> impl Future<Output = Result<Vec<Fare>, FeedError>> + Send;
}

/// Source of airport locations and countries.
pub trait GeoFeed: Send + Sync {
    /// Look up one airport. Unknown codes yield `FeedError::NotFound`.
    fn airport_info(
        &self,
        code: AirportCode,
    ) -> impl Future<Output = Result<AirportInfo, FeedError>> + Send;
}
