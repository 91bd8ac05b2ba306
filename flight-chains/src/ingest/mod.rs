//! Feed to graph store ingestion.
//!
//! Pulls routes, airports and fare calendars from the feeds and loads them
//! into a fresh `GraphStore`. A failed airport lookup or fare calendar
//! skips that record; only total feed unavailability is fatal.

mod error;

use std::collections::BTreeSet;

use chrono::NaiveDate;
use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use crate::domain::{Airport, AirportCode, FlightRecord};
use crate::feed::{ConnectivityFeed, FeedError, GeoFeed, Route};
use crate::store::{GraphStore, IngestReport};

pub use error::IngestError;

/// Configuration for one ingestion run.
#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// First departure date to fetch, inclusive.
    pub date_from: NaiveDate,

    /// Last departure date to fetch, inclusive.
    pub date_to: NaiveDate,

    /// Restrict ingestion to routes between these airports.
    pub airports: Option<BTreeSet<AirportCode>>,

    /// Maximum feed requests in flight at once.
    pub max_concurrent: usize,
}

impl IngestConfig {
    pub fn new(date_from: NaiveDate, date_to: NaiveDate) -> Self {
        Self {
            date_from,
            date_to,
            airports: None,
            max_concurrent: 8,
        }
    }

    pub fn with_airports(mut self, airports: impl IntoIterator<Item = AirportCode>) -> Self {
        self.airports = Some(airports.into_iter().collect());
        self
    }

    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent;
        self
    }

    fn admits(&self, route: &Route) -> bool {
        match &self.airports {
            Some(set) => set.contains(&route.source) && set.contains(&route.destination),
            None => true,
        }
    }

    fn concurrency(&self) -> usize {
        self.max_concurrent.max(1)
    }
}

/// What an ingestion run loaded and skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestSummary {
    /// Routes selected for fare fetching
    pub routes: usize,
    /// Airports resolved by the geo feed
    pub airports: usize,
    /// Airports the geo feed could not resolve
    pub missing_airports: usize,
    /// Routes whose fare calendar could not be fetched
    pub failed_routes: usize,
    /// Flight-level counters from the store
    pub flights: IngestReport,
}

/// Build a graph store from the feeds.
pub async fn ingest<C, G>(
    connectivity: &C,
    geo: &G,
    config: &IngestConfig,
) -> Result<(GraphStore, IngestSummary), IngestError>
where
    C: ConnectivityFeed,
    G: GeoFeed,
{
    if config.date_from > config.date_to {
        return Err(IngestError::InvalidRange {
            from: config.date_from,
            to: config.date_to,
        });
    }

    let routes: Vec<Route> = connectivity
        .list_routes()
        .await
        .map_err(IngestError::FeedsUnavailable)?
        .into_iter()
        .filter(|route| config.admits(route))
        .collect();

    let mut summary = IngestSummary {
        routes: routes.len(),
        ..IngestSummary::default()
    };

    let codes: BTreeSet<AirportCode> = match &config.airports {
        Some(set) => set.clone(),
        None => routes
            .iter()
            .flat_map(|route| [route.source, route.destination])
            .collect(),
    };

    let airports = resolve_airports(geo, &codes, config.concurrency()).await;
    summary.airports = airports.len();
    summary.missing_airports = codes.len() - airports.len();
    if airports.is_empty() {
        return Err(IngestError::NoAirports);
    }

    let mut store = GraphStore::new();
    store.insert_airports(airports);
    store.compute_distances();

    let calendars: Vec<(Route, Result<Vec<_>, FeedError>)> = stream::iter(routes)
        .map(|route| async move {
            let fares = connectivity
                .fare_calendar(route.source, route.destination, config.date_from, config.date_to)
                .await;
            (route, fares)
        })
        .buffered(config.concurrency())
        .collect()
        .await;

    let mut records = Vec::new();
    for (route, fares) in calendars {
        match fares {
            Ok(fares) => records.extend(
                fares
                    .into_iter()
                    .filter(|fare| (config.date_from..=config.date_to).contains(&fare.date))
                    .map(|fare| {
                        FlightRecord::new(route.source, route.destination, fare.date, fare.cost)
                    }),
            ),
            Err(e) => {
                warn!(source = %route.source, destination = %route.destination, error = %e, "skipping route");
                summary.failed_routes += 1;
            }
        }
    }

    if summary.routes > 0 && summary.failed_routes == summary.routes {
        return Err(IngestError::NoFares {
            failed: summary.failed_routes,
        });
    }

    summary.flights = store.ingest_flights(records);

    info!(
        routes = summary.routes,
        airports = summary.airports,
        flights = store.flight_count(),
        skipped = summary.flights.skipped() + summary.failed_routes,
        "ingestion finished"
    );
    Ok((store, summary))
}

async fn resolve_airports<G: GeoFeed>(
    geo: &G,
    codes: &BTreeSet<AirportCode>,
    concurrency: usize,
) -> Vec<Airport> {
    let lookups: Vec<_> = stream::iter(codes.iter().copied())
        .map(|code| async move { (code, geo.airport_info(code).await) })
        .buffered(concurrency)
        .collect()
        .await;

    lookups
        .into_iter()
        .filter_map(|(code, lookup)| match lookup {
            Ok(info) => match Airport::try_new(code, info.country, info.latitude, info.longitude) {
                Ok(airport) => Some(airport),
                Err(e) => {
                    warn!(%code, error = %e, "skipping airport");
                    None
                }
            },
            Err(FeedError::NotFound(_)) => {
                debug!(%code, "airport unknown to geo feed");
                None
            }
            Err(e) => {
                warn!(%code, error = %e, "airport lookup failed");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Cost, CountryCode};
    use crate::feed::{AirportInfo, Fare, FixtureFeed};

    fn code(s: &str) -> AirportCode {
        AirportCode::parse(s).unwrap()
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 2, d).unwrap()
    }

    fn info(country: &str, latitude: f64, longitude: f64) -> AirportInfo {
        AirportInfo {
            country: CountryCode::parse(country).unwrap(),
            latitude,
            longitude,
        }
    }

    fn route(s: &str, d: &str) -> Route {
        Route::new(code(s), code(d))
    }

    fn fare(d: u32, cost: f64) -> Fare {
        Fare { date: day(d), cost }
    }

    fn fixture() -> FixtureFeed {
        FixtureFeed::from_parts(
            vec![route("WAW", "VIE"), route("VIE", "SOF"), route("SOF", "WAW"), route("WAW", "ATH")],
            [
                (route("WAW", "VIE"), fare(3, 40.0)),
                (route("WAW", "VIE"), fare(5, 30.0)),
                (route("VIE", "SOF"), fare(6, 50.0)),
                (route("SOF", "WAW"), fare(10, 25.0)),
                (route("WAW", "ATH"), fare(4, 70.0)),
                (route("WAW", "ATH"), fare(20, 70.0)),
            ],
            [
                (code("WAW"), info("PL", 52.1657, 20.9671)),
                (code("VIE"), info("AT", 48.1103, 16.5697)),
                (code("SOF"), info("BG", 42.6967, 23.4114)),
                (code("ATH"), info("GR", 37.9364, 23.9445)),
            ],
        )
    }

    /// Feed whose every request fails.
    struct DownFeed {
        routes: Option<Vec<Route>>,
    }

    impl ConnectivityFeed for DownFeed {
        async fn list_routes(&self) -> Result<Vec<Route>, FeedError> {
            self.routes
                .clone()
                .ok_or_else(|| FeedError::Unavailable("connection refused".into()))
        }

        async fn fare_calendar(
            &self,
            _source: AirportCode,
            _destination: AirportCode,
            _date_from: NaiveDate,
            _date_to: NaiveDate,
        ) -> Result<Vec<Fare>, FeedError> {
            Err(FeedError::Unavailable("connection refused".into()))
        }
    }

    impl GeoFeed for DownFeed {
        async fn airport_info(&self, _code: AirportCode) -> Result<AirportInfo, FeedError> {
            Err(FeedError::Unavailable("connection refused".into()))
        }
    }

    #[tokio::test]
    async fn builds_store_from_feeds() {
        let feed = fixture();
        let config = IngestConfig::new(day(1), day(15));

        let (store, summary) = ingest(&feed, &feed, &config).await.unwrap();

        assert_eq!(summary.routes, 4);
        assert_eq!(summary.airports, 4);
        assert_eq!(summary.failed_routes, 0);
        // The day-20 fare is outside the range.
        assert_eq!(summary.flights.inserted, 5);
        assert_eq!(store.flight_count(), 5);
        assert!(store.distance(code("WAW"), code("SOF")).unwrap() > 1000.0);

        let found = store
            .matching_flights(code("WAW"), Cost::from_cents(5000), day(3), day(5))
            .unwrap();
        assert_eq!(found.len(), 2);
    }

    #[tokio::test]
    async fn airport_set_restricts_routes() {
        let feed = fixture();
        let config = IngestConfig::new(day(1), day(15))
            .with_airports([code("WAW"), code("VIE"), code("SOF")]);

        let (store, summary) = ingest(&feed, &feed, &config).await.unwrap();

        assert_eq!(summary.routes, 3);
        assert_eq!(store.airport_count(), 3);
        assert!(store.airport(code("ATH")).is_err());
    }

    #[tokio::test]
    async fn unresolved_airport_skips_its_flights() {
        let feed = fixture();
        let geo = FixtureFeed::from_parts(
            Vec::new(),
            Vec::<(Route, Fare)>::new(),
            [
                (code("WAW"), info("PL", 52.1657, 20.9671)),
                (code("VIE"), info("AT", 48.1103, 16.5697)),
                (code("SOF"), info("XX", 142.0, 23.4114)),
            ],
        );

        let (store, summary) = ingest(&feed, &geo, &IngestConfig::new(day(1), day(15)))
            .await
            .unwrap();

        assert_eq!(summary.airports, 2);
        assert_eq!(summary.missing_airports, 2);
        assert_eq!(summary.flights.inserted, 2);
        assert_eq!(summary.flights.unknown_airport, 3);
        assert_eq!(store.flight_count(), 2);
    }

    #[tokio::test]
    async fn unreachable_routes_are_fatal() {
        let down = DownFeed { routes: None };
        let err = ingest(&down, &fixture(), &IngestConfig::new(day(1), day(15)))
            .await
            .unwrap_err();
        assert!(matches!(err, IngestError::FeedsUnavailable(_)));
    }

    #[tokio::test]
    async fn all_calendars_failing_is_fatal() {
        let down = DownFeed {
            routes: Some(vec![route("WAW", "VIE")]),
        };
        let err = ingest(&down, &fixture(), &IngestConfig::new(day(1), day(15)))
            .await
            .unwrap_err();
        assert!(matches!(err, IngestError::NoFares { failed: 1 }));
    }

    #[tokio::test]
    async fn unreachable_geo_feed_is_fatal() {
        let down = DownFeed { routes: None };
        let err = ingest(&fixture(), &down, &IngestConfig::new(day(1), day(15)))
            .await
            .unwrap_err();
        assert!(matches!(err, IngestError::NoAirports));
    }

    #[tokio::test]
    async fn reversed_range_is_rejected() {
        let feed = fixture();
        let err = ingest(&feed, &feed, &IngestConfig::new(day(15), day(1)))
            .await
            .unwrap_err();
        assert!(matches!(err, IngestError::InvalidRange { .. }));
    }

    #[tokio::test]
    async fn serial_and_concurrent_runs_agree() {
        let feed = fixture();
        let config = IngestConfig::new(day(1), day(15));

        let (serial, _) = ingest(&feed, &feed, &config.clone().with_max_concurrent(1))
            .await
            .unwrap();
        let (concurrent, _) = ingest(&feed, &feed, &config.with_max_concurrent(16))
            .await
            .unwrap();

        assert_eq!(serial.flights(), concurrent.flights());
    }

    #[tokio::test]
    async fn sample_data_ingests() {
        let feed = FixtureFeed::load("data/sample").unwrap();
        let config = IngestConfig::new(day(1), day(29));

        let (store, summary) = ingest(&feed, &feed, &config).await.unwrap();

        assert_eq!(summary.airports, 10);
        assert_eq!(summary.failed_routes, 0);
        assert_eq!(store.flight_count(), 274);
    }
}
