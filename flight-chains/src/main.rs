use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use flight_chains::domain::{AirportCode, ConnectionWindow, Cost, InvalidAirportCode};
use flight_chains::feed::{CacheConfig, CachedFeed, FixtureFeed};
use flight_chains::ingest::{IngestConfig, ingest};
use flight_chains::planner::{
    Planner, RankOptions, ScoreBy, SearchConfig, SearchRequest, rank_chains, render_table,
};
use flight_chains::store::GraphStore;
use flight_chains::store::snapshot::{SnapshotCache, SnapshotConfig, SnapshotKey};

#[derive(Parser, Debug)]
#[command(name = "flight-chains")]
#[command(about = "Find multi-leg flight itineraries that fit a budget")]
#[command(version)]
struct Args {
    /// Directory holding routes.json, fares.json and airports.json
    #[arg(long, env = "FLIGHT_CHAINS_DATA")]
    data: PathBuf,

    /// Airport every itinerary starts from
    #[arg(long, value_parser = parse_airport)]
    start: AirportCode,

    /// Total budget in the base currency
    #[arg(long)]
    budget: f64,

    /// First departure date (YYYY-MM-DD)
    #[arg(long)]
    from: NaiveDate,

    /// Last date to fetch fares for (YYYY-MM-DD)
    #[arg(long)]
    to: NaiveDate,

    /// Minimum days between consecutive flights
    #[arg(long, default_value_t = 2)]
    min_days: i64,

    /// Maximum days between consecutive flights
    #[arg(long, default_value_t = 4)]
    max_days: i64,

    /// Report itineraries that do not return to the start airport
    #[arg(long)]
    one_way: bool,

    /// Number of itineraries to print
    #[arg(long, default_value_t = 10)]
    limit: usize,

    /// Only use routes between these airports (comma separated)
    #[arg(long, value_delimiter = ',', value_parser = parse_airport)]
    airports: Vec<AirportCode>,

    /// What the ranking counts
    #[arg(long, value_enum, default_value_t = ScoreBy::Airports)]
    score_by: ScoreBy,

    /// Allow the next flight to depart any airport within this many km
    #[arg(long)]
    nearby_km: Option<f64>,

    /// Maximum flights per itinerary
    #[arg(long)]
    max_legs: Option<usize>,

    /// Stop searching after this many seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// On timeout, also report itineraries whose search was cut short
    #[arg(long)]
    best_effort: bool,

    /// Rank every itinerary found, not only those that cannot be extended
    #[arg(long)]
    report_intermediate: bool,

    /// Parallel search and fetch workers
    #[arg(long, default_value_t = 8)]
    workers: usize,

    /// Directory for ingested store snapshots
    #[arg(long, env = "FLIGHT_CHAINS_SNAPSHOTS", default_value = "database_files")]
    snapshot_dir: PathBuf,

    /// Always ingest from the feeds, ignoring and not writing snapshots
    #[arg(long)]
    no_snapshot: bool,
}

fn parse_airport(s: &str) -> Result<AirportCode, InvalidAirportCode> {
    AirportCode::parse(&s.trim().to_ascii_uppercase())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let window = ConnectionWindow::new(args.min_days, args.max_days)?;
    let budget = Cost::from_amount(args.budget).context("invalid budget")?;

    let store = load_store(&args).await?;
    info!(
        airports = store.airport_count(),
        flights = store.flight_count(),
        "flight graph ready"
    );

    // The first flight may depart on `from` at the earliest
    let anchor = window.anchor_for(args.from);
    let mut request = SearchRequest::new(args.start, anchor, budget, window).with_one_way(args.one_way);
    if let Some(km) = args.nearby_km {
        request = request.with_nearby_radius_km(km);
    }
    if let Some(max_legs) = args.max_legs {
        request = request.with_max_legs(max_legs);
    }

    let config = SearchConfig::new(args.workers, args.limit, args.timeout_secs)
        .with_best_effort(args.best_effort)
        .with_report_intermediate(args.report_intermediate)
        .with_score_by(args.score_by);
    let planner = Planner::new(Arc::new(store), config);

    let result = planner.search(&request).await?;
    if result.timed_out {
        warn!("search stopped early; results are incomplete");
    }

    let options = RankOptions {
        start: args.start,
        one_way: args.one_way,
        score_by: planner.config().score_by,
        limit: planner.config().max_results,
    };
    let ranked = rank_chains(&result.tree, &result.candidates, planner.graph(), &options)?;

    print!("{}", render_table(&ranked));
    Ok(())
}

/// Load the flight graph from a snapshot, or ingest it from the feeds.
async fn load_store(args: &Args) -> Result<GraphStore> {
    let source = std::fs::canonicalize(&args.data).unwrap_or_else(|_| args.data.clone());
    let key = SnapshotKey::new(
        &source.to_string_lossy(),
        args.from,
        args.to,
        &args.airports,
    );
    let snapshots =
        (!args.no_snapshot).then(|| SnapshotCache::new(SnapshotConfig::new(&args.snapshot_dir)));

    if let Some(cache) = &snapshots
        && let Some(store) = cache.load(&key)
    {
        info!(path = %cache.path(&key).display(), "loaded store snapshot");
        return Ok(store);
    }

    let feed = FixtureFeed::load(&args.data)
        .with_context(|| format!("feeds unreachable at {}", args.data.display()))?;
    let connectivity = CachedFeed::new(feed.clone(), &CacheConfig::default());

    let mut config = IngestConfig::new(args.from, args.to).with_max_concurrent(args.workers);
    if !args.airports.is_empty() {
        config = config.with_airports(args.airports.iter().copied());
    }

    let (store, summary) = ingest(&connectivity, &feed, &config)
        .await
        .context("ingestion failed")?;
    info!(
        routes = summary.routes,
        failed_routes = summary.failed_routes,
        missing_airports = summary.missing_airports,
        "ingested feeds"
    );

    if let Some(cache) = &snapshots {
        match cache.save(&key, &store) {
            Ok(path) => info!(path = %path.display(), "saved store snapshot"),
            Err(e) => warn!(error = %e, "failed to save store snapshot"),
        }
    }

    Ok(store)
}
