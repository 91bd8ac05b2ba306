//! Caching layer for fare calendars.
//!
//! Fare calendars are the expensive call: one request per route and date
//! range. Repeated ingestions over the same configuration hit the cache
//! instead of the feed.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use moka::future::Cache as MokaCache;
use tracing::trace;

use crate::domain::AirportCode;

use super::{AirportInfo, ConnectivityFeed, Fare, FeedError, GeoFeed, Route};

/// Cache key for fare calendars: (source, destination, from, to).
type FareKey = (AirportCode, AirportCode, NaiveDate, NaiveDate);

/// Cached fare calendar entry.
type FareEntry = Arc<Vec<Fare>>;

/// Configuration for the cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// TTL for cached entries.
    pub ttl: Duration,

    /// Maximum number of cached entries.
    pub max_capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(60 * 60),
            max_capacity: 10_000,
        }
    }
}

/// Connectivity feed with caching.
///
/// Wraps any feed and caches its fare calendars. Failed lookups are not
/// cached. Routes and geo lookups pass straight through.
pub struct CachedFeed<F> {
    feed: F,
    fares: MokaCache<FareKey, FareEntry>,
}

impl<F> CachedFeed<F> {
    /// Create a new cached feed.
    pub fn new(feed: F, config: &CacheConfig) -> Self {
        let fares = MokaCache::builder()
            .time_to_live(config.ttl)
            .max_capacity(config.max_capacity)
            .build();

        Self { feed, fares }
    }

    /// Access the underlying feed for operations that bypass the cache.
    pub fn inner(&self) -> &F {
        &self.feed
    }

    /// Get cache statistics.
    pub fn cache_entry_count(&self) -> u64 {
        self.fares.entry_count()
    }

    /// Invalidate all cached entries.
    pub fn invalidate_cache(&self) {
        self.fares.invalidate_all();
    }
}

impl<F: ConnectivityFeed> ConnectivityFeed for CachedFeed<F> {
    async fn list_routes(&self) -> Result<Vec<Route>, FeedError> {
        self.feed.list_routes().await
    }

    async fn fare_calendar(
        &self,
        source: AirportCode,
        destination: AirportCode,
        date_from: NaiveDate,
        date_to: NaiveDate,
    ) -> Result<Vec<Fare>, FeedError> {
        let key = (source, destination, date_from, date_to);

        if let Some(cached) = self.fares.get(&key).await {
            trace!(%source, %destination, "fare calendar cache hit");
            return Ok(cached.as_ref().clone());
        }

        let fares = self
            .feed
            .fare_calendar(source, destination, date_from, date_to)
            .await?;
        self.fares.insert(key, Arc::new(fares.clone())).await;

        Ok(fares)
    }
}

impl<F: GeoFeed> GeoFeed for CachedFeed<F> {
    async fn airport_info(&self, code: AirportCode) -> Result<AirportInfo, FeedError> {
        self.feed.airport_info(code).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    /// Feed that counts calendar requests and fails for one route.
    struct CountingFeed {
        calls: Mutex<usize>,
        failing: Route,
    }

    impl CountingFeed {
        fn new() -> Self {
            Self {
                calls: Mutex::new(0),
                failing: Route::new(code("VIE"), code("SOF")),
            }
        }

        fn calls(&self) -> usize {
            *self.calls.lock().unwrap()
        }
    }

    impl ConnectivityFeed for CountingFeed {
        async fn list_routes(&self) -> Result<Vec<Route>, FeedError> {
            Ok(vec![self.failing])
        }

        async fn fare_calendar(
            &self,
            source: AirportCode,
            destination: AirportCode,
            date_from: NaiveDate,
            _date_to: NaiveDate,
        ) -> Result<Vec<Fare>, FeedError> {
            *self.calls.lock().unwrap() += 1;
            if Route::new(source, destination) == self.failing {
                return Err(FeedError::Unavailable("timeout".into()));
            }
            Ok(vec![Fare {
                date: date_from,
                cost: 40.0,
            }])
        }
    }

    fn code(s: &str) -> AirportCode {
        AirportCode::parse(s).unwrap()
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 2, d).unwrap()
    }

    #[tokio::test]
    async fn repeated_calendar_hits_cache() {
        let cached = CachedFeed::new(CountingFeed::new(), &CacheConfig::default());

        let first = cached
            .fare_calendar(code("WAW"), code("VIE"), day(1), day(29))
            .await
            .unwrap();
        let second = cached
            .fare_calendar(code("WAW"), code("VIE"), day(1), day(29))
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(cached.inner().calls(), 1);
    }

    #[tokio::test]
    async fn different_range_is_a_different_entry() {
        let cached = CachedFeed::new(CountingFeed::new(), &CacheConfig::default());

        cached
            .fare_calendar(code("WAW"), code("VIE"), day(1), day(29))
            .await
            .unwrap();
        cached
            .fare_calendar(code("WAW"), code("VIE"), day(2), day(29))
            .await
            .unwrap();

        assert_eq!(cached.inner().calls(), 2);
    }

    #[tokio::test]
    async fn errors_are_not_cached() {
        let cached = CachedFeed::new(CountingFeed::new(), &CacheConfig::default());

        for _ in 0..2 {
            assert!(
                cached
                    .fare_calendar(code("VIE"), code("SOF"), day(1), day(29))
                    .await
                    .is_err()
            );
        }

        assert_eq!(cached.inner().calls(), 2);
    }

    #[test]
    fn default_config() {
        let config = CacheConfig::default();
        assert_eq!(config.ttl, Duration::from_secs(3600));
        assert_eq!(config.max_capacity, 10_000);
    }

    #[test]
    fn cache_creation() {
        let cached = CachedFeed::new(CountingFeed::new(), &CacheConfig::default());
        assert_eq!(cached.cache_entry_count(), 0);
    }
}
