//! Command-line front end.
//!
//! Reads a delimited table, runs one of the enrichment stages against the
//! Google Maps web services and writes the result table.

mod config;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use geopair::models::{LocationRow, Route, RouteRow};
use geopair::table::{read_rows, write_lines, write_rows};
use geopair::{
    CoordinateCache, DatasetEnricher, GeoClient, GoogleMapsClient, RouteAggregator, TravelMode,
};

use crate::config::Config;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[derive(Parser, Debug)]
#[command(name = "geopair")]
#[command(about = "Enrich address tables with coordinates and travel distances")]
struct Args {
    /// TOML file with client and run settings
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Hide progress bars
    #[arg(long, global = true)]
    no_progress: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fill the Coordinate column of a location table
    Geocode {
        /// Table with an Address column (.csv or .csv.gz)
        #[arg(short, long)]
        input: PathBuf,

        #[arg(short, long)]
        output: PathBuf,

        /// Write addresses that could not be geocoded here, one per line
        #[arg(long)]
        failed_out: Option<PathBuf>,

        /// Concurrent lookups (overrides config)
        #[arg(long)]
        concurrency: Option<usize>,
    },

    /// Total distance and duration of multi-stop routes
    Routes {
        /// Table with route_id and @^-separated stops columns
        #[arg(short, long)]
        input: PathBuf,

        #[arg(short, long)]
        output: PathBuf,

        /// Concurrent routes (overrides config)
        #[arg(long)]
        concurrency: Option<usize>,

        #[arg(long, value_enum)]
        mode: Option<TravelMode>,
    },

    /// Every unordered pair of locations with geodesic and routed distances
    Pairs {
        /// Table with Address, Borough and Coordinate columns
        #[arg(short, long)]
        input: PathBuf,

        #[arg(short, long)]
        output: PathBuf,

        /// Geocode rows whose coordinate is missing or malformed
        #[arg(long)]
        geocode_missing: bool,

        /// Write addresses that could not be geocoded here, one per line
        #[arg(long, requires = "geocode_missing")]
        failed_out: Option<PathBuf>,

        #[arg(long, value_enum)]
        mode: Option<TravelMode>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load_from_file(path)
            .with_context(|| format!("Loading {}", path.display()))?,
        None => Config::default(),
    };

    let google = Arc::new(GoogleMapsClient::from_env(config.client_config())?);
    let client: Arc<dyn GeoClient> = google.clone();
    let show_progress = !args.no_progress;

    match args.command {
        Command::Geocode {
            input,
            output,
            failed_out,
            concurrency,
        } => {
            let concurrency = concurrency.unwrap_or(config.run.concurrency);
            geocode(client, &input, &output, failed_out.as_deref(), concurrency, show_progress)
                .await?;
        }
        Command::Routes {
            input,
            output,
            concurrency,
            mode,
        } => {
            let concurrency = concurrency.unwrap_or(config.run.concurrency);
            let mode = mode.unwrap_or(config.run.mode);
            routes(client, &input, &output, concurrency, mode, show_progress).await?;
        }
        Command::Pairs {
            input,
            output,
            geocode_missing,
            failed_out,
            mode,
        } => {
            let mode = mode.unwrap_or(config.run.mode);
            pairs(
                client,
                &input,
                &output,
                geocode_missing,
                failed_out.as_deref(),
                mode,
                show_progress,
            )
            .await?;
        }
    }

    info!("Done, {} requests sent", google.request_count());
    Ok(())
}

async fn geocode(
    client: Arc<dyn GeoClient>,
    input: &Path,
    output: &Path,
    failed_out: Option<&Path>,
    concurrency: usize,
    show_progress: bool,
) -> Result<()> {
    let mut rows: Vec<LocationRow> = read_rows(input)?;

    let cache = CoordinateCache::new(client).with_progress(show_progress);
    cache
        .resolve_many(rows.iter().map(|r| r.address.as_str()), concurrency)
        .await;

    for row in &mut rows {
        row.coordinate = cache
            .get(&row.address)
            .map(|c| c.to_string())
            .unwrap_or_default();
    }
    write_rows(output, &rows)?;

    report_failures(&cache, failed_out)
}

/// Log the failed lookups of `cache` and optionally write them to `failed_out`.
fn report_failures(cache: &CoordinateCache, failed_out: Option<&Path>) -> Result<()> {
    let failed = cache.failed_addresses();
    if !failed.is_empty() {
        warn!("{} addresses could not be geocoded", failed.len());
    }
    if let Some(path) = failed_out {
        write_lines(path, &failed)?;
    }

    Ok(())
}

async fn routes(
    client: Arc<dyn GeoClient>,
    input: &Path,
    output: &Path,
    concurrency: usize,
    mode: TravelMode,
    show_progress: bool,
) -> Result<()> {
    let rows: Vec<RouteRow> = read_rows(input)?;
    let routes: Vec<Route> = rows.into_iter().map(Route::from).collect();

    let mut aggregator = RouteAggregator::new(client, mode).with_progress(show_progress);
    aggregator.aggregate_many(&routes, concurrency).await;

    write_rows(output, &aggregator.rows(&routes))
}

async fn pairs(
    client: Arc<dyn GeoClient>,
    input: &Path,
    output: &Path,
    geocode_missing: bool,
    failed_out: Option<&Path>,
    mode: TravelMode,
    show_progress: bool,
) -> Result<()> {
    let rows: Vec<LocationRow> = read_rows(input)?;

    let cache = CoordinateCache::new(client.clone());
    let mut enricher = DatasetEnricher::new(client, mode).with_progress(show_progress);
    if geocode_missing {
        enricher = enricher.with_geocoding_fallback(&cache);
    }

    let records = enricher.build_all_pairs(&rows).await;
    write_rows(output, &records)?;

    report_failures(&cache, failed_out)
}
