//! Sequential subtree exploration.
//!
//! Explores every chain reachable from one first flight, depth first. Each
//! chain popped off the stack costs one graph query; its admissible next
//! flights all become children before the search descends into the first.

use tokio_util::sync::CancellationToken;
use tracing::trace;

use crate::chain::{ChainId, ChainLimits, ChainNode, ChainTree};
use crate::domain::Flight;

use super::search::{FlightGraph, SearchError, SearchRequest};

/// Outcome of exploring one subtree.
#[derive(Debug)]
pub(super) struct Exploration {
    /// The subtree, rooted at the start airport.
    pub tree: ChainTree,

    /// Chains with no admissible extension.
    pub leaves: Vec<ChainId>,

    /// Chains built but never expanded because the search was cancelled.
    pub frontier: Vec<ChainId>,

    /// Graph queries made.
    pub steps: usize,

    pub cancelled: bool,
}

pub(super) struct Explorer<'a, G: FlightGraph + ?Sized> {
    graph: &'a G,
    request: &'a SearchRequest,
    limits: ChainLimits,
    token: &'a CancellationToken,
}

impl<'a, G: FlightGraph + ?Sized> Explorer<'a, G> {
    pub fn new(graph: &'a G, request: &'a SearchRequest, token: &'a CancellationToken) -> Self {
        Self {
            graph,
            request,
            limits: request.limits(),
            token,
        }
    }

    /// Admissible next flights for a chain.
    pub fn candidates(&self, node: &ChainNode) -> Result<Vec<Flight>, SearchError> {
        if let Some(max) = self.request.max_legs
            && node.depth() >= max
        {
            return Ok(Vec::new());
        }

        let remaining = self.limits.budget.saturating_sub(node.cost());
        let (lower, upper) = self.limits.window.bounds(node.date());

        let flights = match self.request.nearby_radius_km {
            Some(km) => self
                .graph
                .matching_flights_near(node.airport(), km, remaining, lower, upper)?,
            None => self
                .graph
                .matching_flights(node.airport(), remaining, lower, upper)?,
        };
        Ok(flights)
    }

    /// Explore every chain that starts with `first`.
    pub fn explore_from(&self, first: Flight) -> Result<Exploration, SearchError> {
        let mut tree = ChainTree::new(self.request.start, self.request.anchor_date);
        let root = tree.root_node().clone();
        let transfer = self.transfer_km(&root, &first)?;
        let head = tree.extend(tree.root(), first, &self.limits, transfer)?;

        let mut stack = vec![head];
        let mut leaves = Vec::new();
        let mut steps = 0;

        while let Some(id) = stack.pop() {
            if self.token.is_cancelled() {
                stack.push(id);
                trace!(pending = stack.len(), "exploration cancelled");
                return Ok(Exploration {
                    tree,
                    leaves,
                    frontier: stack,
                    steps,
                    cancelled: true,
                });
            }

            let Some(node) = tree.get(id).cloned() else {
                continue;
            };
            let flights = self.candidates(&node)?;
            steps += 1;

            if flights.is_empty() {
                leaves.push(id);
                continue;
            }

            let mut children = Vec::with_capacity(flights.len());
            for flight in flights {
                let transfer = self.transfer_km(&node, &flight)?;
                children.push(tree.extend(id, flight, &self.limits, transfer)?);
            }
            // Reversed so the first candidate is explored first.
            stack.extend(children.into_iter().rev());
        }

        Ok(Exploration {
            tree,
            leaves,
            frontier: Vec::new(),
            steps,
            cancelled: false,
        })
    }

    fn transfer_km(&self, node: &ChainNode, flight: &Flight) -> Result<Option<f64>, SearchError> {
        if flight.source == node.airport() {
            return Ok(None);
        }
        Ok(Some(self.graph.distance(node.airport(), flight.source)?))
    }
}
