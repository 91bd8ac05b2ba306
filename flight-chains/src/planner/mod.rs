//! Chain planner using budget-bounded exhaustive search.
//!
//! This module answers: "starting from this airport with this much money,
//! which itineraries visit the most places?"
//!
//! The search explores every chain of flights that fits the budget and the
//! connection window, then ranks the reportable chains by distinct airports
//! (or countries) visited.

mod config;
mod explore;
mod rank;
mod report;
mod search;


pub use config::SearchConfig;
pub use rank::{RankOptions, RankedChain, ScoreBy, rank_chains, route_string, score};
pub use report::render_table;
pub use search::{FlightGraph, Planner, SearchError, SearchRequest, SearchResult};
