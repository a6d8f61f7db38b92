//! Dobity Geo: geohash zones and duplicate detection for crowd-sourced
//! charging locations, RV spots and points of interest.
//!
//! Distances are in meters throughout.

pub mod config;
pub mod dedup;
pub mod entity;
pub mod error;
pub mod geo;
pub mod ingest;
pub mod server;
pub mod store;
pub mod zone;

pub use config::Config;
pub use dedup::{DedupMatch, DedupMatcher, MatchReason};
pub use entity::{ChargingLocation, Poi, Point, PointEntity, PointId, PointKind, PointRecord, RvSpot};
pub use error::{ConfigError, GeoError, StoreError};
pub use ingest::{IngestOutcome, Ingestor};
pub use store::{JsonStore, MemoryStore, PointStore, ZoneStore};
pub use zone::{BackfillReport, Zone, ZoneAssigner, ZoneAssignment, ZoneId};
