//! Chain ranking for search results.
//!
//! Ranks reportable chains by how many distinct places they visit so the
//! most varied itineraries come first.

use std::collections::BTreeSet;

use crate::chain::{ChainId, ChainTree};
use crate::domain::{AirportCode, Cost};
use crate::store::StoreError;

use super::search::FlightGraph;

/// What a chain's score counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ScoreBy {
    /// Distinct airports, the start airport included.
    #[default]
    Airports,
    /// Distinct countries of those airports.
    Countries,
}

/// Options for ranking.
#[derive(Debug, Clone)]
pub struct RankOptions {
    /// Start airport of the search; round trips must end here.
    pub start: AirportCode,

    /// When false, only chains ending at `start` are ranked.
    pub one_way: bool,

    pub score_by: ScoreBy,

    /// Maximum number of chains returned.
    pub limit: usize,
}

/// A reportable chain with its score.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedChain {
    pub chain: ChainId,
    pub score: usize,
    pub cost: Cost,
    /// Airports in visiting order, joined with " -> ".
    pub route: String,
}

/// Score a sequence of airports.
pub fn score<G: FlightGraph + ?Sized>(
    airports: &[AirportCode],
    score_by: ScoreBy,
    graph: &G,
) -> Result<usize, StoreError> {
    match score_by {
        ScoreBy::Airports => Ok(airports.iter().collect::<BTreeSet<_>>().len()),
        ScoreBy::Countries => {
            let mut countries = BTreeSet::new();
            for code in airports {
                countries.insert(graph.airport(*code)?.country);
            }
            Ok(countries.len())
        }
    }
}

/// Format airports as a route string.
pub fn route_string(airports: &[AirportCode]) -> String {
    airports
        .iter()
        .map(AirportCode::as_str)
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// Rank candidate chains, best first.
///
/// Chains without flights are skipped. Without `one_way`, a chain is only
/// ranked if it ends at the start airport. Ties on score are broken by
/// route string so the output is stable.
pub fn rank_chains<G: FlightGraph + ?Sized>(
    tree: &ChainTree,
    candidates: &[ChainId],
    graph: &G,
    options: &RankOptions,
) -> Result<Vec<RankedChain>, StoreError> {
    let mut ranked = Vec::new();

    for &id in candidates {
        let Some(node) = tree.get(id) else {
            continue;
        };
        if node.depth() == 0 {
            continue;
        }
        if !options.one_way && node.airport() != options.start {
            continue;
        }

        let airports = tree.airports(id);
        ranked.push(RankedChain {
            chain: id,
            score: score(&airports, options.score_by, graph)?,
            cost: node.cost(),
            route: route_string(&airports),
        });
    }

    ranked.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.route.cmp(&b.route)));
    ranked.truncate(options.limit);

    Ok(ranked)
}
