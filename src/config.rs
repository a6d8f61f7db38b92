//! Runtime configuration, built once at startup and passed down.

use crate::dedup::{DEFAULT_MIN_SIMILARITY, DEFAULT_RADIUS_M};
use crate::error::ConfigError;
use crate::geo::DEFAULT_PRECISION;
use crate::store::JsonStore;
use crate::zone::MAX_PRECISION;
use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Geohash length of a zone.
    pub zone_precision: usize,
    /// Dedup search radius in meters.
    pub dedup_radius_m: f64,
    /// Name similarity a nearby point must exceed to count as a duplicate.
    pub min_similarity: f64,
    pub store_path: PathBuf,
    pub host: String,
    pub port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            zone_precision: DEFAULT_PRECISION,
            dedup_radius_m: DEFAULT_RADIUS_M,
            min_similarity: DEFAULT_MIN_SIMILARITY,
            store_path: JsonStore::default_path(),
            host: "127.0.0.1".into(),
            port: 8080,
        }
    }
}

impl Config {
    /// Defaults overridden by `DOBITY_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`Config::from_env`] with an injectable variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let config = Self {
            zone_precision: parse_var(&lookup, "DOBITY_ZONE_PRECISION", defaults.zone_precision)?,
            dedup_radius_m: parse_var(&lookup, "DOBITY_DEDUP_RADIUS_M", defaults.dedup_radius_m)?,
            min_similarity: parse_var(&lookup, "DOBITY_MIN_SIMILARITY", defaults.min_similarity)?,
            store_path: lookup("DOBITY_STORE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.store_path),
            host: lookup("DOBITY_HOST").unwrap_or(defaults.host),
            port: parse_var(&lookup, "DOBITY_PORT", defaults.port)?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.zone_precision == 0 || self.zone_precision > MAX_PRECISION {
            return Err(invalid(
                "DOBITY_ZONE_PRECISION",
                self.zone_precision,
                format!("must be 1..={}", MAX_PRECISION),
            ));
        }
        if !(self.dedup_radius_m.is_finite() && self.dedup_radius_m > 0.0) {
            return Err(invalid("DOBITY_DEDUP_RADIUS_M", self.dedup_radius_m, "must be > 0"));
        }
        if !(0.0..=1.0).contains(&self.min_similarity) {
            return Err(invalid("DOBITY_MIN_SIMILARITY", self.min_similarity, "must be 0..=1"));
        }
        Ok(())
    }
}

fn invalid(key: &'static str, value: impl Display, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        key,
        value: value.to_string(),
        reason: reason.into(),
    }
}

fn parse_var<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| invalid(key, &raw, e.to_string())),
        None => Ok(default),
    }
}
