use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use dobity_geo::geo::{self, Coordinates};
use dobity_geo::{Config, Ingestor, JsonStore, Point, PointId, PointKind, ZoneId, ZoneStore};
use serde::Serialize;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Dobity Geo: geohash zones and duplicate detection for charging
/// locations, RV spots and POIs.
///
/// Examples:
///   dobity geohash 50.08 14.42
///   dobity distance 50.0880 14.4200 49.1951 16.6068
///   dobity ingest --kind poi --name "Kavárna U Lva" --lat 50.088 --lng 14.42
///   dobity match --name "Kavarna U Lva" --lat 50.0881 --lng 14.4201
///   dobity serve --port 8080
#[derive(Parser)]
#[command(name = "dobity", version, about, long_about = None)]
struct Cli {
    /// Store file (default ~/.dobity/store.json, or DOBITY_STORE_PATH).
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Zone geohash precision (1-12).
    #[arg(long, global = true)]
    precision: Option<usize>,

    /// Dedup radius in meters.
    #[arg(long, global = true)]
    radius: Option<f64>,

    /// Minimum name similarity for a proximity match (0-1, exclusive).
    #[arg(long, global = true)]
    min_similarity: Option<f64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Encode coordinates as a geohash, with its cell and neighbours.
    Geohash {
        #[arg(allow_hyphen_values = true)]
        lat: f64,
        #[arg(allow_hyphen_values = true)]
        lng: f64,
    },
    /// Great-circle distance in meters.
    Distance {
        #[arg(allow_hyphen_values = true)]
        lat1: f64,
        #[arg(allow_hyphen_values = true)]
        lng1: f64,
        #[arg(allow_hyphen_values = true)]
        lat2: f64,
        #[arg(allow_hyphen_values = true)]
        lng2: f64,
    },
    /// Name similarity score (0-1).
    Similarity { a: String, b: String },
    /// Add a point unless it duplicates a stored one, then assign its zone.
    Ingest {
        #[command(flatten)]
        point: PointArgs,
    },
    /// Show which stored point a candidate would duplicate, without writing.
    Match {
        #[command(flatten)]
        point: PointArgs,
    },
    /// Update a stored point's name/coordinates and reassign its zone.
    Update {
        id: PointId,
        #[command(flatten)]
        point: PointArgs,
    },
    /// Re-run zone assignment for one point.
    Assign { id: PointId },
    /// Re-run zone assignment for every stored point.
    Backfill,
    /// List zones, or the points of one zone.
    Zones { slug: Option<String> },
    /// Serve the JSON API.
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },
}

#[derive(clap::Args)]
struct PointArgs {
    /// charging_location, rv_spot or poi.
    #[arg(long, default_value = "poi")]
    kind: PointKind,
    #[arg(long)]
    name: String,
    #[arg(long, allow_hyphen_values = true)]
    lat: Option<f64>,
    #[arg(long, allow_hyphen_values = true)]
    lng: Option<f64>,
    /// Upstream id (Google Places, OpenChargeMap...).
    #[arg(long)]
    external_id: Option<String>,
}

impl PointArgs {
    fn into_point(self) -> Point {
        Point::new(self.kind, self.name, self.lat, self.lng, self.external_id)
    }
}

#[derive(Serialize)]
struct GeohashOutput {
    geohash: String,
    precision: usize,
    bbox: geo::BoundingBox,
    neighbors: Vec<String>,
}

#[derive(Serialize)]
struct ZonePoints {
    zone: ZoneId,
    points: Vec<PointId>,
}

fn print_json(value: &impl Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = Config::from_env()?;
    if let Some(ref path) = cli.store {
        config.store_path = path.clone();
    }
    if let Some(p) = cli.precision {
        config.zone_precision = p;
    }
    if let Some(r) = cli.radius {
        config.dedup_radius_m = r;
    }
    if let Some(s) = cli.min_similarity {
        config.min_similarity = s;
    }
    config.validate()?;
    Ok(config)
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    let ingestor = Ingestor::from_config(&config)?;

    match cli.command {
        Command::Geohash { lat, lng } => {
            let hash = geo::encode(lat, lng, config.zone_precision)?;
            print_json(&GeohashOutput {
                bbox: geo::decode_bbox(&hash)?,
                neighbors: geo::neighbors(&hash)?,
                precision: config.zone_precision,
                geohash: hash,
            })
        }
        Command::Distance { lat1, lng1, lat2, lng2 } => {
            let a = Coordinates::new(lat1, lng1)?;
            let b = Coordinates::new(lat2, lng2)?;
            print_json(&serde_json::json!({ "meters": a.distance_to(&b) }))
        }
        Command::Similarity { a, b } => print_json(&serde_json::json!({
            "a": geo::normalize(&a),
            "b": geo::normalize(&b),
            "similarity": geo::similarity(&a, &b),
        })),
        Command::Ingest { point } => {
            let mut store = open_store(&config)?;
            print_json(&ingestor.ingest(point.into_point(), &mut store)?)
        }
        Command::Match { point } => {
            let store = open_store(&config)?;
            let found = ingestor.matcher().find_match(&point.into_point(), &store)?;
            print_json(&serde_json::json!({ "matched": found.is_some(), "match": found }))
        }
        Command::Update { id, point } => {
            let mut store = open_store(&config)?;
            print_json(&ingestor.update(id, point.into_point(), &mut store)?)
        }
        Command::Assign { id } => {
            let mut store = open_store(&config)?;
            print_json(&ingestor.reassign(id, &mut store)?)
        }
        Command::Backfill => {
            let mut store = open_store(&config)?;
            print_json(&ingestor.assigner().backfill(&mut store)?)
        }
        Command::Zones { slug: Some(slug) } => {
            let store = open_store(&config)?;
            let zone = match store.find_zone(&slug)? {
                Some(z) => z,
                None => bail!("No zone '{}'", slug),
            };
            let points = store.points_in_zone(&zone.id)?;
            print_json(&ZonePoints { zone: zone.id, points })
        }
        Command::Zones { slug: None } => {
            let store = open_store(&config)?;
            let zones: Vec<ZonePoints> = store
                .zones()?
                .into_iter()
                .map(|z| {
                    let points = store.points_in_zone(&z.id)?;
                    Ok(ZonePoints { zone: z.id, points })
                })
                .collect::<Result<_>>()?;
            print_json(&zones)
        }
        Command::Serve { host, port } => {
            let host = host.unwrap_or_else(|| config.host.clone());
            let port = port.unwrap_or(config.port);
            let store = open_store(&config)?;
            let runtime = tokio::runtime::Runtime::new().context("starting tokio runtime")?;
            runtime.block_on(dobity_geo::server::start(&host, port, store, ingestor))
        }
    }
}

fn open_store(config: &Config) -> Result<JsonStore> {
    JsonStore::load_from(&config.store_path)
        .with_context(|| format!("opening store {}", config.store_path.display()))
}
