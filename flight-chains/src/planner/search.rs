//! Parallel chain search.
//!
//! The search is an exhaustive tree exploration bounded by the budget. The
//! root step runs once; each flight it yields becomes an independent
//! subtree job on the blocking pool, explored sequentially into its own
//! chain tree. The trees are grafted into the session tree in root
//! candidate order, so results are reproducible when nothing times out.

use std::sync::Arc;

use chrono::NaiveDate;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::chain::{ChainId, ChainLimits, ChainTree, ConstraintViolation};
use crate::domain::{Airport, AirportCode, ConnectionWindow, Cost, Flight};
use crate::store::{GraphStore, StoreError};

use super::config::SearchConfig;
use super::explore::{Exploration, Explorer};

/// Error from chain search.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SearchError {
    /// Invalid search request
    #[error("invalid search request: {0}")]
    InvalidRequest(String),

    /// Graph store lookup failed mid-search
    #[error("graph lookup failed: {0}")]
    Store(#[from] StoreError),

    /// A chain extension broke an invariant; the graph returned an
    /// inadmissible candidate
    #[error("internal invariant failure: {0}")]
    Invariant(#[from] ConstraintViolation),

    /// A worker task panicked or was lost
    #[error("search worker failed: {0}")]
    Worker(String),
}

/// Read access to the flight graph.
///
/// The planner shares one graph across all workers without locking, so
/// implementations must be safe to query concurrently.
pub trait FlightGraph: Send + Sync {
    /// Flights departing `airport` within the cost and date bounds, in
    /// (date, destination, cost) order.
    fn matching_flights(
        &self,
        airport: AirportCode,
        max_cost: Cost,
        date_lower: NaiveDate,
        date_upper: NaiveDate,
    ) -> Result<Vec<Flight>, StoreError>;

    /// Flights departing any airport within `radius_km` of `airport`, in
    /// (date, source, destination, cost) order.
    fn matching_flights_near(
        &self,
        airport: AirportCode,
        radius_km: f64,
        max_cost: Cost,
        date_lower: NaiveDate,
        date_upper: NaiveDate,
    ) -> Result<Vec<Flight>, StoreError>;

    fn airport(&self, code: AirportCode) -> Result<Airport, StoreError>;

    fn distance(&self, a: AirportCode, b: AirportCode) -> Result<f64, StoreError>;

    fn has_zero_cost_flights(&self) -> bool;
}

impl FlightGraph for GraphStore {
    fn matching_flights(
        &self,
        airport: AirportCode,
        max_cost: Cost,
        date_lower: NaiveDate,
        date_upper: NaiveDate,
    ) -> Result<Vec<Flight>, StoreError> {
        GraphStore::matching_flights(self, airport, max_cost, date_lower, date_upper)
    }

    fn matching_flights_near(
        &self,
        airport: AirportCode,
        radius_km: f64,
        max_cost: Cost,
        date_lower: NaiveDate,
        date_upper: NaiveDate,
    ) -> Result<Vec<Flight>, StoreError> {
        GraphStore::matching_flights_near(self, airport, radius_km, max_cost, date_lower, date_upper)
    }

    fn airport(&self, code: AirportCode) -> Result<Airport, StoreError> {
        GraphStore::airport(self, code).copied()
    }

    fn distance(&self, a: AirportCode, b: AirportCode) -> Result<f64, StoreError> {
        GraphStore::distance(self, a, b)
    }

    fn has_zero_cost_flights(&self) -> bool {
        GraphStore::has_zero_cost_flights(self)
    }
}

/// Request for chain search.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    /// Airport every chain starts from.
    pub start: AirportCode,

    /// Date the first flight's window is measured from.
    pub anchor_date: NaiveDate,

    /// Total budget for a chain.
    pub budget: Cost,

    /// Allowed days between consecutive flights.
    pub window: ConnectionWindow,

    /// When false, only chains ending back at `start` are reportable.
    pub one_way: bool,

    /// Allow departing from airports within this radius of the arrival.
    pub nearby_radius_km: Option<f64>,

    /// Maximum flights per chain.
    pub max_legs: Option<usize>,
}

impl SearchRequest {
    /// Create a new round-trip search request.
    pub fn new(
        start: AirportCode,
        anchor_date: NaiveDate,
        budget: Cost,
        window: ConnectionWindow,
    ) -> Self {
        Self {
            start,
            anchor_date,
            budget,
            window,
            one_way: false,
            nearby_radius_km: None,
            max_legs: None,
        }
    }

    pub fn with_one_way(mut self, one_way: bool) -> Self {
        self.one_way = one_way;
        self
    }

    pub fn with_nearby_radius_km(mut self, km: f64) -> Self {
        self.nearby_radius_km = Some(km);
        self
    }

    pub fn with_max_legs(mut self, max_legs: usize) -> Self {
        self.max_legs = Some(max_legs);
        self
    }

    /// The limits every chain of this search must respect.
    pub fn limits(&self) -> ChainLimits {
        let limits = ChainLimits::new(self.budget, self.window);
        match self.nearby_radius_km {
            Some(km) => limits.with_max_transfer_km(km),
            None => limits,
        }
    }

    /// Validate the search request against a graph.
    pub fn validate<G: FlightGraph + ?Sized>(&self, graph: &G) -> Result<(), SearchError> {
        match graph.airport(self.start) {
            Ok(_) => {}
            Err(StoreError::AirportNotFound(code)) => {
                return Err(SearchError::InvalidRequest(format!(
                    "unknown start airport {code}"
                )));
            }
            Err(e) => return Err(e.into()),
        }

        if let Some(km) = self.nearby_radius_km
            && !(km.is_finite() && km >= 0.0)
        {
            return Err(SearchError::InvalidRequest(format!(
                "nearby radius must be a non-negative distance, got {km}"
            )));
        }

        // Free flights would let a branch extend forever.
        if self.max_legs.is_none() && graph.has_zero_cost_flights() {
            return Err(SearchError::InvalidRequest(
                "graph contains zero-cost flights; a leg limit is required".to_string(),
            ));
        }

        Ok(())
    }
}

/// Result of chain search.
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// Every chain constructed, rooted at the start airport.
    pub tree: ChainTree,

    /// Chains that could not be extended further.
    pub leaves: Vec<ChainId>,

    /// Chains eligible for ranking under the configured report scope.
    pub candidates: Vec<ChainId>,

    /// Number of graph queries made.
    pub steps: usize,

    /// True if the deadline or a cancellation cut the search short.
    pub timed_out: bool,
}

impl SearchResult {
    /// Create an empty result.
    pub fn empty(request: &SearchRequest) -> Self {
        Self {
            tree: ChainTree::new(request.start, request.anchor_date),
            leaves: Vec::new(),
            candidates: Vec::new(),
            steps: 0,
            timed_out: false,
        }
    }

    /// Number of chains constructed, excluding the root.
    pub fn chains_explored(&self) -> usize {
        self.tree.len() - 1
    }
}

/// Chain planner over a shared flight graph.
pub struct Planner<G: FlightGraph + 'static> {
    graph: Arc<G>,
    config: SearchConfig,
}

impl<G: FlightGraph + 'static> Planner<G> {
    /// Create a new planner.
    pub fn new(graph: Arc<G>, config: SearchConfig) -> Self {
        Self { graph, config }
    }

    pub fn graph(&self) -> &G {
        &self.graph
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Search for chains, honouring the configured timeout.
    pub async fn search(&self, request: &SearchRequest) -> Result<SearchResult, SearchError> {
        self.search_with_cancel(request, CancellationToken::new())
            .await
    }

    /// Search for chains until done, timed out, or `cancel` fires.
    ///
    /// On cancellation, subtrees not yet started are skipped and running
    /// ones stop at their next step. Chains already found to be leaves are
    /// kept; chains cut short are dropped unless best effort is configured.
    pub async fn search_with_cancel(
        &self,
        request: &SearchRequest,
        cancel: CancellationToken,
    ) -> Result<SearchResult, SearchError> {
        request.validate(&*self.graph)?;

        let token = cancel.child_token();
        let timer = self.config.timeout().map(|limit| {
            let token = token.clone();
            tokio::spawn(async move {
                tokio::time::sleep(limit).await;
                warn!(secs = limit.as_secs(), "search deadline reached");
                token.cancel();
            })
        });

        let outcome = self.run(request, &token).await;

        if let Some(timer) = timer {
            timer.abort();
        }
        let mut result = outcome?;
        result.timed_out |= token.is_cancelled();

        info!(
            chains = result.chains_explored(),
            leaves = result.leaves.len(),
            candidates = result.candidates.len(),
            steps = result.steps,
            timed_out = result.timed_out,
            "search finished"
        );
        Ok(result)
    }

    async fn run(
        &self,
        request: &SearchRequest,
        token: &CancellationToken,
    ) -> Result<SearchResult, SearchError> {
        let first_flights = self.root_candidates(request, token).await?;

        debug!(
            start = %request.start,
            subtrees = first_flights.len(),
            "starting subtree exploration"
        );

        let mut result = SearchResult::empty(request);
        result.steps = 1;
        if first_flights.is_empty() {
            return Ok(result);
        }

        let outcome = self.fan_out(first_flights, request, token, &mut result).await;
        if outcome.is_err() {
            // Abandon subtrees still being explored
            token.cancel();
        }
        outcome.map(|()| result)
    }

    /// Query the root step on the blocking pool, like every other step.
    async fn root_candidates(
        &self,
        request: &SearchRequest,
        token: &CancellationToken,
    ) -> Result<Vec<Flight>, SearchError> {
        let graph = Arc::clone(&self.graph);
        let request = request.clone();
        let token = token.clone();
        tokio::task::spawn_blocking(move || {
            let root = ChainTree::new(request.start, request.anchor_date);
            Explorer::new(&*graph, &request, &token).candidates(root.root_node())
        })
        .await
        .map_err(|e| SearchError::Worker(e.to_string()))?
    }

    async fn fan_out(
        &self,
        first_flights: Vec<Flight>,
        request: &SearchRequest,
        token: &CancellationToken,
        result: &mut SearchResult,
    ) -> Result<(), SearchError> {
        let semaphore = Arc::new(tokio::sync::Semaphore::new(self.config.worker_count()));
        let mut handles = Vec::with_capacity(first_flights.len());

        for flight in first_flights {
            let permit = tokio::select! {
                permit = semaphore.clone().acquire_owned() => permit
                    .map_err(|_| SearchError::Worker("worker pool closed".to_string()))?,
                _ = token.cancelled() => break,
            };

            let graph = Arc::clone(&self.graph);
            let request = request.clone();
            let token = token.clone();
            handles.push(tokio::task::spawn_blocking(move || {
                let _permit = permit;
                Explorer::new(&*graph, &request, &token).explore_from(flight)
            }));
        }

        for handle in handles {
            let exploration = handle
                .await
                .map_err(|e| SearchError::Worker(e.to_string()))??;
            self.merge(result, exploration)?;
        }

        Ok(())
    }

    fn merge(
        &self,
        result: &mut SearchResult,
        exploration: Exploration,
    ) -> Result<(), SearchError> {
        let Exploration {
            tree,
            leaves,
            frontier,
            steps,
            cancelled,
        } = exploration;

        let first_new = result.tree.len();
        let map = result.tree.graft(tree)?;
        let translate = |ids: Vec<ChainId>| -> Vec<ChainId> {
            ids.into_iter().filter_map(|id| map.get(id)).collect()
        };

        let leaves = translate(leaves);
        let frontier = translate(frontier);
        let keep_partial = self.config.best_effort;
        result.steps += steps;
        result.timed_out |= cancelled;

        if self.config.report_intermediate {
            let new_ids = (first_new..result.tree.len()).map(|i| ChainId(i as u32));
            result
                .candidates
                .extend(new_ids.filter(|id| keep_partial || !frontier.contains(id)));
        } else {
            result.candidates.extend(leaves.iter().copied());
            if keep_partial {
                result.candidates.extend(frontier);
            }
        }
        result.leaves.extend(leaves);

        Ok(())
    }
}
