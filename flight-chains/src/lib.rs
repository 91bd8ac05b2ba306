//! Budget-bounded flight itinerary search.
//!
//! Answers: "starting from this airport with this much money, which chains
//! of flights visit the most places?"

pub mod chain;
pub mod domain;
pub mod feed;
pub mod ingest;
pub mod planner;
pub mod store;
