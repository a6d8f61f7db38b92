//! Point entities: charging locations, RV spots and POIs.
//!
//! Each kind stores its coordinates under its own field names; callers go
//! through [`PointEntity::coordinates`] and never look at the kind to find
//! them.

use crate::geo::{Coordinates, SkipReason};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Record-store identifier of a point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PointId(pub u64);

impl fmt::Display for PointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PointId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(PointId)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointKind {
    ChargingLocation,
    RvSpot,
    Poi,
}

impl fmt::Display for PointKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ChargingLocation => write!(f, "charging_location"),
            Self::RvSpot => write!(f, "rv_spot"),
            Self::Poi => write!(f, "poi"),
        }
    }
}

impl FromStr for PointKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "charging_location" | "charger" | "charging" => Ok(Self::ChargingLocation),
            "rv_spot" | "rv" => Ok(Self::RvSpot),
            "poi" => Ok(Self::Poi),
            other => Err(format!(
                "Unknown point kind '{}'. Use 'charging_location', 'rv_spot' or 'poi'.",
                other
            )),
        }
    }
}

/// Uniform view over every point kind.
pub trait PointEntity {
    fn kind(&self) -> PointKind;
    fn name(&self) -> &str;
    fn external_id(&self) -> Option<&str>;

    /// Raw stored coordinates, unvalidated.
    fn raw_coordinates(&self) -> (Option<f64>, Option<f64>);

    /// Validated coordinates, or the reason the point has none.
    fn coordinates(&self) -> Result<Coordinates, SkipReason> {
        let (lat, lng) = self.raw_coordinates();
        Coordinates::from_stored(lat, lng)
    }
}

fn non_empty(s: &Option<String>) -> Option<&str> {
    s.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// An EV charging location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChargingLocation {
    pub name: String,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lng: Option<f64>,
    #[serde(default)]
    pub external_id: Option<String>,
    #[serde(default)]
    pub operator: Option<String>,
    #[serde(default)]
    pub connectors: Vec<String>,
}

impl PointEntity for ChargingLocation {
    fn kind(&self) -> PointKind {
        PointKind::ChargingLocation
    }
    fn name(&self) -> &str {
        &self.name
    }
    fn external_id(&self) -> Option<&str> {
        non_empty(&self.external_id)
    }
    fn raw_coordinates(&self) -> (Option<f64>, Option<f64>) {
        (self.lat, self.lng)
    }
}

/// An RV / campervan spot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RvSpot {
    pub name: String,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub external_id: Option<String>,
    #[serde(default)]
    pub capacity: Option<u32>,
}

impl PointEntity for RvSpot {
    fn kind(&self) -> PointKind {
        PointKind::RvSpot
    }
    fn name(&self) -> &str {
        &self.name
    }
    fn external_id(&self) -> Option<&str> {
        non_empty(&self.external_id)
    }
    fn raw_coordinates(&self) -> (Option<f64>, Option<f64>) {
        (self.latitude, self.longitude)
    }
}

/// A generic point of interest (cafe, restaurant, sight...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Poi {
    pub name: String,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lng: Option<f64>,
    #[serde(default)]
    pub external_id: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

impl PointEntity for Poi {
    fn kind(&self) -> PointKind {
        PointKind::Poi
    }
    fn name(&self) -> &str {
        &self.name
    }
    fn external_id(&self) -> Option<&str> {
        non_empty(&self.external_id)
    }
    fn raw_coordinates(&self) -> (Option<f64>, Option<f64>) {
        (self.lat, self.lng)
    }
}

/// Any point kind, tagged by `kind` when serialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Point {
    ChargingLocation(ChargingLocation),
    RvSpot(RvSpot),
    Poi(Poi),
}

impl Point {
    /// Build a point of `kind` from the fields every kind shares.
    pub fn new(
        kind: PointKind,
        name: impl Into<String>,
        lat: Option<f64>,
        lng: Option<f64>,
        external_id: Option<String>,
    ) -> Self {
        let name = name.into();
        match kind {
            PointKind::ChargingLocation => Self::ChargingLocation(ChargingLocation {
                name,
                lat,
                lng,
                external_id,
                operator: None,
                connectors: Vec::new(),
            }),
            PointKind::RvSpot => Self::RvSpot(RvSpot {
                name,
                latitude: lat,
                longitude: lng,
                external_id,
                capacity: None,
            }),
            PointKind::Poi => Self::Poi(Poi {
                name,
                lat,
                lng,
                external_id,
                category: None,
            }),
        }
    }

    fn inner(&self) -> &dyn PointEntity {
        match self {
            Self::ChargingLocation(p) => p,
            Self::RvSpot(p) => p,
            Self::Poi(p) => p,
        }
    }
}

impl PointEntity for Point {
    fn kind(&self) -> PointKind {
        self.inner().kind()
    }
    fn name(&self) -> &str {
        self.inner().name()
    }
    fn external_id(&self) -> Option<&str> {
        self.inner().external_id()
    }
    fn raw_coordinates(&self) -> (Option<f64>, Option<f64>) {
        self.inner().raw_coordinates()
    }
}

/// A stored point with its store-assigned id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointRecord {
    pub id: PointId,
    pub point: Point,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PointEntity for PointRecord {
    fn kind(&self) -> PointKind {
        self.point.kind()
    }
    fn name(&self) -> &str {
        self.point.name()
    }
    fn external_id(&self) -> Option<&str> {
        self.point.external_id()
    }
    fn raw_coordinates(&self) -> (Option<f64>, Option<f64>) {
        self.point.raw_coordinates()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_coordinates_across_kinds() {
        for kind in [PointKind::ChargingLocation, PointKind::RvSpot, PointKind::Poi] {
            let p = Point::new(kind, "Test", Some(50.088), Some(14.42), None);
            assert_eq!(p.kind(), kind);
            let c = p.coordinates().unwrap();
            assert_eq!((c.lat, c.lng), (50.088, 14.42));
        }
    }

    #[test]
    fn test_rv_spot_field_names() {
        let json = r#"{"kind":"rv_spot","name":"Camp Sokol","latitude":49.2,"longitude":16.6,"capacity":12}"#;
        let p: Point = serde_json::from_str(json).unwrap();
        assert_eq!(p.kind(), PointKind::RvSpot);
        assert_eq!(p.raw_coordinates(), (Some(49.2), Some(16.6)));
    }

    #[test]
    fn test_missing_coordinates() {
        let json = r#"{"kind":"poi","name":"Nowhere"}"#;
        let p: Point = serde_json::from_str(json).unwrap();
        assert_eq!(p.coordinates(), Err(SkipReason::Missing));
    }

    #[test]
    fn test_blank_external_id_is_none() {
        let p = Point::new(PointKind::Poi, "X", None, None, Some("  ".into()));
        assert_eq!(p.external_id(), None);
        let p = Point::new(PointKind::Poi, "X", None, None, Some("ocm-42".into()));
        assert_eq!(p.external_id(), Some("ocm-42"));
    }

    #[test]
    fn test_kind_parse() {
        assert_eq!("charging-location".parse::<PointKind>(), Ok(PointKind::ChargingLocation));
        assert_eq!("RV".parse::<PointKind>(), Ok(PointKind::RvSpot));
        assert!("hotel".parse::<PointKind>().is_err());
        assert_eq!(PointKind::RvSpot.to_string(), "rv_spot");
    }

    #[test]
    fn test_point_id_is_opaque_number() {
        assert_eq!(" 42 ".parse::<PointId>(), Ok(PointId(42)));
        assert!("xyz".parse::<PointId>().is_err());
        assert_eq!(PointId(7).to_string(), "7");
        assert_eq!(serde_json::to_string(&PointId(7)).unwrap(), "7");
    }
}
