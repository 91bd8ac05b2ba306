//! Disk snapshots of ingested graph stores.
//!
//! Each distinct (date range, airport set) configuration gets its own file,
//! so repeated searches over the same configuration reuse ingested data
//! instead of fetching it from the feeds again.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use super::{GraphStore, StoreData};
use crate::domain::AirportCode;

/// Default snapshot TTL: 24 hours.
const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Errors from writing snapshots.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("failed to create snapshot directory: {0}")]
    CreateDir(#[source] std::io::Error),

    #[error("failed to serialize snapshot: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to write snapshot file: {0}")]
    Write(#[source] std::io::Error),

    #[error("system time before unix epoch")]
    Clock,
}

/// Identity of an ingestion configuration.
///
/// `source` names where the data came from, so different feeds over the
/// same dates get different keys. The airport set is order-insensitive:
/// the same airports given in a different order produce the same key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SnapshotKey(String);

impl SnapshotKey {
    pub fn new<'a>(
        source: &str,
        date_from: NaiveDate,
        date_to: NaiveDate,
        airports: impl IntoIterator<Item = &'a AirportCode>,
    ) -> Self {
        let airports: BTreeSet<&AirportCode> = airports.into_iter().collect();

        let mut hasher = Sha256::new();
        hasher.update(source.as_bytes());
        hasher.update([0]);
        hasher.update(date_from.to_string().as_bytes());
        hasher.update(date_to.to_string().as_bytes());
        for code in airports {
            hasher.update(code.as_str().as_bytes());
        }
        Self(hex::encode(hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Snapshot file contents with metadata.
#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    /// Unix timestamp when the snapshot was written.
    written_at_secs: u64,
    store: StoreData,
}

/// Configuration for the snapshot cache.
#[derive(Debug, Clone)]
pub struct SnapshotConfig {
    /// Directory holding snapshot files.
    pub dir: PathBuf,
    /// How long a snapshot remains valid.
    pub ttl: Duration,
}

impl SnapshotConfig {
    /// Create a config with the given directory and default TTL (24 hours).
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            ttl: DEFAULT_TTL,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self::new("database_files")
    }
}

/// Keyed snapshot files on disk.
#[derive(Debug, Clone)]
pub struct SnapshotCache {
    config: SnapshotConfig,
}

impl SnapshotCache {
    pub fn new(config: SnapshotConfig) -> Self {
        Self { config }
    }

    /// Path of the snapshot file for `key`.
    pub fn path(&self, key: &SnapshotKey) -> PathBuf {
        self.config.dir.join(format!("{}.json", key.as_str()))
    }

    pub fn dir(&self) -> &Path {
        &self.config.dir
    }

    /// Load the store saved under `key`.
    ///
    /// Returns `None` if the snapshot doesn't exist, is invalid, or has expired.
    pub fn load(&self, key: &SnapshotKey) -> Option<GraphStore> {
        let path = self.path(key);
        let contents = std::fs::read_to_string(&path).ok()?;
        let snapshot: Snapshot = match serde_json::from_str(&contents) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ignoring unreadable snapshot");
                return None;
            }
        };

        let now = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .ok()?
            .as_secs();
        let age_secs = now.saturating_sub(snapshot.written_at_secs);
        if age_secs >= self.config.ttl.as_secs() {
            debug!(path = %path.display(), age_secs, "snapshot expired");
            return None;
        }

        debug!(path = %path.display(), "loaded snapshot");
        Some(GraphStore::from_data(snapshot.store))
    }

    /// Save `store` under `key`, creating the directory if needed.
    pub fn save(&self, key: &SnapshotKey, store: &GraphStore) -> Result<PathBuf, SnapshotError> {
        let now = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .map_err(|_| SnapshotError::Clock)?
            .as_secs();

        let snapshot = Snapshot {
            written_at_secs: now,
            store: store.to_data(),
        };

        if !self.config.dir.as_os_str().is_empty() && !self.config.dir.exists() {
            std::fs::create_dir_all(&self.config.dir).map_err(SnapshotError::CreateDir)?;
        }

        let path = self.path(key);
        let json = serde_json::to_string(&snapshot)?;
        std::fs::write(&path, json).map_err(SnapshotError::Write)?;

        debug!(path = %path.display(), flights = store.flight_count(), "saved snapshot");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Airport, CountryCode, FlightRecord};
    use tempfile::tempdir;

    const SOURCE: &str = "/srv/feeds/sample";

    fn code(s: &str) -> AirportCode {
        AirportCode::parse(s).unwrap()
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 2, d).unwrap()
    }

    fn sample_store() -> GraphStore {
        let mut store = GraphStore::new();
        store.insert_airports([
            Airport::new(code("WAW"), CountryCode::parse("PL").unwrap(), 52.17, 20.97),
            Airport::new(code("VIE"), CountryCode::parse("AT").unwrap(), 48.11, 16.57),
        ]);
        store.compute_distances();
        store.ingest_flights([FlightRecord::new(code("WAW"), code("VIE"), day(3), 40.0)]);
        store
    }

    #[test]
    fn key_ignores_airport_order() {
        let a = SnapshotKey::new(SOURCE, day(1), day(29), &[code("WAW"), code("VIE")]);
        let b = SnapshotKey::new(SOURCE, day(1), day(29), &[code("VIE"), code("WAW"), code("VIE")]);
        assert_eq!(a, b);
        assert_eq!(a.as_str().len(), 64);
    }

    #[test]
    fn key_depends_on_dates() {
        let a = SnapshotKey::new(SOURCE, day(1), day(29), &[code("WAW")]);
        let b = SnapshotKey::new(SOURCE, day(2), day(29), &[code("WAW")]);
        assert_ne!(a, b);
    }

    #[test]
    fn key_depends_on_source() {
        let a = SnapshotKey::new("/srv/feeds/a", day(1), day(29), &[code("WAW")]);
        let b = SnapshotKey::new("/srv/feeds/b", day(1), day(29), &[code("WAW")]);
        assert_ne!(a, b);
    }

    #[test]
    fn save_and_load() {
        let dir = tempdir().unwrap();
        let cache = SnapshotCache::new(SnapshotConfig::new(dir.path().join("db")));
        let key = SnapshotKey::new(SOURCE, day(1), day(29), &[code("WAW"), code("VIE")]);

        let path = cache.save(&key, &sample_store()).unwrap();
        assert!(path.exists());

        let loaded = cache.load(&key).unwrap();
        assert_eq!(loaded.flight_count(), 1);
        assert_eq!(loaded.airport_count(), 2);
    }

    #[test]
    fn expired_snapshot_returns_none() {
        let dir = tempdir().unwrap();
        let config = SnapshotConfig::new(dir.path()).with_ttl(Duration::from_secs(0));
        let cache = SnapshotCache::new(config);
        let key = SnapshotKey::new(SOURCE, day(1), day(29), &[code("WAW")]);

        cache.save(&key, &sample_store()).unwrap();
        assert!(cache.load(&key).is_none());
    }

    #[test]
    fn missing_snapshot_returns_none() {
        let cache = SnapshotCache::new(SnapshotConfig::new("/nonexistent/snapshots"));
        let key = SnapshotKey::new(SOURCE, day(1), day(29), &[code("WAW")]);
        assert!(cache.load(&key).is_none());
    }

    #[test]
    fn corrupt_snapshot_returns_none() {
        let dir = tempdir().unwrap();
        let cache = SnapshotCache::new(SnapshotConfig::new(dir.path()));
        let key = SnapshotKey::new(SOURCE, day(1), day(29), &[code("WAW")]);
        std::fs::write(cache.path(&key), "{not json").unwrap();
        assert!(cache.load(&key).is_none());
    }
}
