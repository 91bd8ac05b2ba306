//! Ingestion error types.

use chrono::NaiveDate;

use crate::feed::FeedError;

/// Fatal ingestion failures. Per-record failures are skipped, not raised.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// No data could be fetched from the feeds at all
    #[error("feeds unavailable: {0}")]
    FeedsUnavailable(#[source] FeedError),

    /// Every fare calendar request failed
    #[error("no fare calendar could be fetched ({failed} routes failed)")]
    NoFares { failed: usize },

    /// None of the requested airports could be resolved
    #[error("no airport could be resolved by the geo feed")]
    NoAirports,

    #[error("invalid date range: {from} is after {to}")]
    InvalidRange { from: NaiveDate, to: NaiveDate },
}
