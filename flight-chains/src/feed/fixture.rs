//! Feed that serves routes, fares and airports from JSON files.
//!
//! Useful for offline runs and tests. A data directory holds:
//!
//! - `routes.json`: `[{"source": "WAW", "destination": "VIE"}, ...]`
//! - `fares.json`: `[{"source": "WAW", "destination": "VIE", "date": "2020-02-03", "cost": 40.0}, ...]`
//! - `airports.json`: `[{"code": "WAW", "country": "PL", "latitude": 52.17, "longitude": 20.97}, ...]`
//!
//! Rows with malformed codes are skipped with a warning.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::domain::{AirportCode, CountryCode};

use super::{AirportInfo, ConnectivityFeed, Fare, FeedError, GeoFeed, Route};

#[derive(Deserialize)]
struct RouteRow {
    source: String,
    destination: String,
}

#[derive(Deserialize)]
struct FareRow {
    source: String,
    destination: String,
    date: NaiveDate,
    cost: f64,
}

#[derive(Deserialize)]
struct AirportRow {
    code: String,
    country: String,
    latitude: f64,
    longitude: f64,
}

/// Feed backed by a directory of JSON files.
#[derive(Debug, Clone, Default)]
pub struct FixtureFeed {
    routes: Arc<Vec<Route>>,
    /// Fares per route, sorted by date.
    fares: Arc<HashMap<Route, Vec<Fare>>>,
    airports: Arc<HashMap<AirportCode, AirportInfo>>,
}

impl FixtureFeed {
    /// Load feed data from `data_dir`.
    pub fn load(data_dir: impl AsRef<Path>) -> Result<Self, FeedError> {
        let data_dir = data_dir.as_ref();

        let routes = read_rows::<RouteRow>(&data_dir.join("routes.json"))?
            .into_iter()
            .filter_map(|row| parse_route(&row.source, &row.destination))
            .collect();

        let fares: Vec<_> = read_rows::<FareRow>(&data_dir.join("fares.json"))?
            .into_iter()
            .filter_map(|row| {
                let route = parse_route(&row.source, &row.destination)?;
                Some((
                    route,
                    Fare {
                        date: row.date,
                        cost: row.cost,
                    },
                ))
            })
            .collect();

        let airports: Vec<_> = read_rows::<AirportRow>(&data_dir.join("airports.json"))?
            .into_iter()
            .filter_map(|row| {
                let code = AirportCode::parse(&row.code).ok()?;
                let Ok(country) = CountryCode::parse(&row.country) else {
                    warn!(code = %code, country = %row.country, "skipping airport with bad country");
                    return None;
                };
                Some((
                    code,
                    AirportInfo {
                        country,
                        latitude: row.latitude,
                        longitude: row.longitude,
                    },
                ))
            })
            .collect();

        let feed = Self::from_parts(routes, fares, airports);
        debug!(
            dir = %data_dir.display(),
            routes = feed.routes.len(),
            airports = feed.airports.len(),
            "loaded fixture feed"
        );
        Ok(feed)
    }

    /// Build a feed from in-memory data.
    pub fn from_parts(
        routes: Vec<Route>,
        fares: impl IntoIterator<Item = (Route, Fare)>,
        airports: impl IntoIterator<Item = (AirportCode, AirportInfo)>,
    ) -> Self {
        let mut by_route: HashMap<Route, Vec<Fare>> = HashMap::new();
        for (route, fare) in fares {
            by_route.entry(route).or_default().push(fare);
        }
        for calendar in by_route.values_mut() {
            calendar.sort_by_key(|fare| fare.date);
        }

        Self {
            routes: Arc::new(routes),
            fares: Arc::new(by_route),
            airports: Arc::new(airports.into_iter().collect()),
        }
    }

    /// Airports the feed can describe.
    pub fn airport_codes(&self) -> Vec<AirportCode> {
        let mut codes: Vec<_> = self.airports.keys().copied().collect();
        codes.sort();
        codes
    }
}

fn read_rows<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, FeedError> {
    let json = std::fs::read_to_string(path).map_err(|source| FeedError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&json).map_err(|source| FeedError::Json {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_route(source: &str, destination: &str) -> Option<Route> {
    match (AirportCode::parse(source), AirportCode::parse(destination)) {
        (Ok(source), Ok(destination)) => Some(Route::new(source, destination)),
        _ => {
            warn!(source, destination, "skipping row with bad airport code");
            None
        }
    }
}

impl ConnectivityFeed for FixtureFeed {
    async fn list_routes(&self) -> Result<Vec<Route>, FeedError> {
        Ok(self.routes.as_ref().clone())
    }

    async fn fare_calendar(
        &self,
        source: AirportCode,
        destination: AirportCode,
        date_from: NaiveDate,
        date_to: NaiveDate,
    ) -> Result<Vec<Fare>, FeedError> {
        let route = Route::new(source, destination);
        Ok(self
            .fares
            .get(&route)
            .map(|calendar| {
                calendar
                    .iter()
                    .filter(|fare| (date_from..=date_to).contains(&fare.date))
                    .copied()
                    .collect()
            })
            .unwrap_or_default())
    }
}

impl GeoFeed for FixtureFeed {
    async fn airport_info(&self, code: AirportCode) -> Result<AirportInfo, FeedError> {
        self.airports
            .get(&code)
            .copied()
            .ok_or_else(|| FeedError::NotFound(format!("airport {code}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code(s: &str) -> AirportCode {
        AirportCode::parse(s).unwrap()
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 2, d).unwrap()
    }

    fn write_fixture(dir: &Path) {
        std::fs::write(
            dir.join("routes.json"),
            r#"[{"source": "WAW", "destination": "VIE"},
                {"source": "VIE", "destination": "SOF"},
                {"source": "waw", "destination": "VIE"}]"#,
        )
        .unwrap();
        std::fs::write(
            dir.join("fares.json"),
            r#"[{"source": "WAW", "destination": "VIE", "date": "2020-02-05", "cost": 40.0},
                {"source": "WAW", "destination": "VIE", "date": "2020-02-03", "cost": 35.5},
                {"source": "VIE", "destination": "SOF", "date": "2020-03-10", "cost": 50.0}]"#,
        )
        .unwrap();
        std::fs::write(
            dir.join("airports.json"),
            r#"[{"code": "WAW", "country": "PL", "latitude": 52.1657, "longitude": 20.9671},
                {"code": "VIE", "country": "AT", "latitude": 48.1103, "longitude": 16.5697}]"#,
        )
        .unwrap();
    }

    #[tokio::test]
    async fn load_fixture_data() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(dir.path());

        let feed = FixtureFeed::load(dir.path()).unwrap();
        let routes = feed.list_routes().await.unwrap();

        assert_eq!(routes.len(), 2);
        assert_eq!(feed.airport_codes(), vec![code("VIE"), code("WAW")]);
    }

    #[tokio::test]
    async fn fare_calendar_filters_dates_in_order() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(dir.path());
        let feed = FixtureFeed::load(dir.path()).unwrap();

        let fares = feed
            .fare_calendar(code("WAW"), code("VIE"), day(1), day(29))
            .await
            .unwrap();
        let dates: Vec<_> = fares.iter().map(|f| f.date).collect();
        assert_eq!(dates, vec![day(3), day(5)]);

        let fares = feed
            .fare_calendar(code("VIE"), code("SOF"), day(1), day(29))
            .await
            .unwrap();
        assert!(fares.is_empty());
    }

    #[tokio::test]
    async fn unknown_airport_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(dir.path());
        let feed = FixtureFeed::load(dir.path()).unwrap();

        assert!(feed.airport_info(code("WAW")).await.is_ok());
        let err = feed.airport_info(code("SOF")).await.unwrap_err();
        assert!(matches!(err, FeedError::NotFound(_)));
    }

    #[test]
    fn missing_directory_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = FixtureFeed::load(dir.path().join("absent")).unwrap_err();
        assert!(matches!(err, FeedError::Io { .. }));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(dir.path());
        std::fs::write(dir.path().join("fares.json"), "{not json").unwrap();

        let err = FixtureFeed::load(dir.path()).unwrap_err();
        assert!(matches!(err, FeedError::Json { .. }));
    }
}
