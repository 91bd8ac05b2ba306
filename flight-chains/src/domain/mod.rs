//! Domain types for the flight chain planner.
//!
//! This module contains the core domain model types: airports, fares and
//! flights. All types enforce their invariants at construction time, so
//! code that receives these types can trust their validity.

mod airport;
mod cost;
mod error;
mod flight;
mod window;

pub use airport::{Airport, AirportCode, CountryCode, InvalidAirportCode, InvalidCountryCode};
pub use cost::{Cost, InvalidCost};
pub use error::DomainError;
pub use flight::{Flight, FlightId, FlightRecord};
pub use window::{ConnectionWindow, MAX_WINDOW_DAYS};
