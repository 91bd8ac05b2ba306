//! Search configuration for the chain planner.

use std::time::Duration;

use super::rank::ScoreBy;

/// Configuration parameters for chain search and reporting.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Maximum number of subtrees explored at the same time.
    pub workers: usize,

    /// Maximum number of itineraries to report.
    pub max_results: usize,

    /// Give up after this many seconds, keeping what was completed.
    pub timeout_secs: Option<u64>,

    /// On timeout, also report chains whose exploration was cut short.
    pub best_effort: bool,

    /// Report every chain, not only those that cannot be extended.
    pub report_intermediate: bool,

    /// What the ranking counts.
    pub score_by: ScoreBy,
}

impl SearchConfig {
    /// Create a new configuration with the given parameters.
    pub fn new(workers: usize, max_results: usize, timeout_secs: Option<u64>) -> Self {
        Self {
            workers,
            max_results,
            timeout_secs,
            ..Self::default()
        }
    }

    pub fn with_best_effort(mut self, best_effort: bool) -> Self {
        self.best_effort = best_effort;
        self
    }

    pub fn with_report_intermediate(mut self, report_intermediate: bool) -> Self {
        self.report_intermediate = report_intermediate;
        self
    }

    pub fn with_score_by(mut self, score_by: ScoreBy) -> Self {
        self.score_by = score_by;
        self
    }

    /// Returns the timeout as a Duration.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// Worker count, never below one.
    pub fn worker_count(&self) -> usize {
        self.workers.max(1)
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            workers: 8,
            max_results: 10,
            timeout_secs: None,
            best_effort: false,
            report_intermediate: false,
            score_by: ScoreBy::Airports,
        }
    }
}
