//! Error types shared across the crate.
//!
//! Missing or invalid coordinates during zone assignment are not errors;
//! see [`crate::zone::ZoneAssignment::Skipped`].

use std::path::PathBuf;
use thiserror::Error;

/// Caller errors for the pure geometry functions.
#[derive(Debug, Error, PartialEq)]
pub enum GeoError {
    #[error("invalid coordinates: lat {lat}, lng {lng} (lat -90..90, lng -180..180)")]
    InvalidCoordinates { lat: f64, lng: f64 },

    #[error("geohash precision must be at least 1")]
    InvalidPrecision,

    #[error("invalid geohash character '{0}'")]
    InvalidGeohashChar(char),

    #[error("empty geohash")]
    EmptyGeohash,
}

/// Failures of the point/zone record stores.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("store serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("point not found: {0}")]
    PointNotFound(String),

    #[error("zone not found: {0}")]
    ZoneNotFound(String),

    #[error("point with external id '{0}' already exists")]
    DuplicateExternalId(String),
}

/// Malformed configuration values.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: '{value}' ({reason})")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}
