//! Core geometry types: validated coordinates and lat/lng windows.

use super::distance::EARTH_RADIUS_M;
use crate::error::GeoError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A validated latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

/// Why a point was not given a zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// One or both coordinates absent.
    Missing,
    /// NaN or infinite.
    NotFinite,
    OutOfRange,
    /// Exactly `(0, 0)`; treated the same as missing.
    ZeroSentinel,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => write!(f, "missing coordinates"),
            Self::NotFinite => write!(f, "non-numeric coordinates"),
            Self::OutOfRange => write!(f, "coordinates out of range"),
            Self::ZeroSentinel => write!(f, "zero coordinates (treated as missing)"),
        }
    }
}

fn in_range(lat: f64, lng: f64) -> bool {
    (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lng)
}

impl Coordinates {
    /// Range-checked constructor for the pure geometry functions.
    /// `(0, 0)` is accepted here; only zone assignment rejects it.
    pub fn new(lat: f64, lng: f64) -> Result<Self, GeoError> {
        if !lat.is_finite() || !lng.is_finite() || !in_range(lat, lng) {
            return Err(GeoError::InvalidCoordinates { lat, lng });
        }
        Ok(Self { lat, lng })
    }

    /// Validation used before assigning a zone or matching by proximity.
    pub fn from_stored(lat: Option<f64>, lng: Option<f64>) -> Result<Self, SkipReason> {
        let (lat, lng) = match (lat, lng) {
            (Some(lat), Some(lng)) => (lat, lng),
            _ => return Err(SkipReason::Missing),
        };
        if !lat.is_finite() || !lng.is_finite() {
            return Err(SkipReason::NotFinite);
        }
        if !in_range(lat, lng) {
            return Err(SkipReason::OutOfRange);
        }
        if lat == 0.0 && lng == 0.0 {
            return Err(SkipReason::ZeroSentinel);
        }
        Ok(Self { lat, lng })
    }

    /// Great-circle distance in meters.
    pub fn distance_to(&self, other: &Coordinates) -> f64 {
        super::distance::haversine_m(self.lat, self.lng, other.lat, other.lng)
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}, {:.6}", self.lat, self.lng)
    }
}

/// An axis-aligned lat/lng window.
///
/// `min_lng > max_lng` means the window crosses the antimeridian and covers
/// `[min_lng, 180]` plus `[-180, max_lng]`. Geohash cells never wrap.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl BoundingBox {
    /// Coarse window that contains every point within `radius_m` of `center`.
    ///
    /// The longitude half-width is `asin(sin(d) / cos(lat))`, the exact bound
    /// for a spherical cap. When the cap reaches a pole every longitude is in
    /// range; when it passes ±180 the window wraps.
    pub fn around(center: &Coordinates, radius_m: f64) -> Self {
        let angular = radius_m.max(0.0) / EARTH_RADIUS_M;
        let lat_delta = angular.to_degrees();
        let min_lat = center.lat - lat_delta;
        let max_lat = center.lat + lat_delta;

        if max_lat >= 90.0 || min_lat <= -90.0 {
            return Self {
                min_lat: min_lat.max(-90.0),
                max_lat: max_lat.min(90.0),
                min_lng: -180.0,
                max_lng: 180.0,
            };
        }

        let ratio = angular.sin() / center.lat.to_radians().cos();
        if ratio >= 1.0 {
            return Self { min_lat, max_lat, min_lng: -180.0, max_lng: 180.0 };
        }
        let lng_delta = ratio.asin().to_degrees();
        if lng_delta >= 180.0 {
            return Self { min_lat, max_lat, min_lng: -180.0, max_lng: 180.0 };
        }

        let mut min_lng = center.lng - lng_delta;
        let mut max_lng = center.lng + lng_delta;
        if min_lng < -180.0 {
            min_lng += 360.0;
        }
        if max_lng > 180.0 {
            max_lng -= 360.0;
        }
        Self { min_lat, max_lat, min_lng, max_lng }
    }

    pub fn crosses_antimeridian(&self) -> bool {
        self.min_lng > self.max_lng
    }

    pub fn contains(&self, c: &Coordinates) -> bool {
        if !(self.min_lat..=self.max_lat).contains(&c.lat) {
            return false;
        }
        if self.crosses_antimeridian() {
            c.lng >= self.min_lng || c.lng <= self.max_lng
        } else {
            (self.min_lng..=self.max_lng).contains(&c.lng)
        }
    }

    pub fn center(&self) -> Coordinates {
        let mut lng = self.min_lng + self.width() / 2.0;
        if lng > 180.0 {
            lng -= 360.0;
        }
        Coordinates {
            lat: (self.min_lat + self.max_lat) / 2.0,
            lng,
        }
    }

    pub fn height(&self) -> f64 {
        self.max_lat - self.min_lat
    }

    pub fn width(&self) -> f64 {
        if self.crosses_antimeridian() {
            self.max_lng - self.min_lng + 360.0
        } else {
            self.max_lng - self.min_lng
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_out_of_range() {
        assert!(Coordinates::new(91.0, 0.0).is_err());
        assert!(Coordinates::new(0.0, -180.5).is_err());
        assert!(Coordinates::new(f64::NAN, 10.0).is_err());
        assert!(Coordinates::new(0.0, 0.0).is_ok());
    }

    #[test]
    fn test_from_stored_skip_reasons() {
        assert_eq!(Coordinates::from_stored(None, Some(14.42)), Err(SkipReason::Missing));
        assert_eq!(
            Coordinates::from_stored(Some(f64::INFINITY), Some(1.0)),
            Err(SkipReason::NotFinite)
        );
        assert_eq!(
            Coordinates::from_stored(Some(-95.0), Some(1.0)),
            Err(SkipReason::OutOfRange)
        );
        assert_eq!(
            Coordinates::from_stored(Some(0.0), Some(0.0)),
            Err(SkipReason::ZeroSentinel)
        );
        // a single zero axis is a real place (equator or prime meridian)
        assert!(Coordinates::from_stored(Some(0.0), Some(32.5)).is_ok());
    }

    #[test]
    fn test_bbox_contains_radius() {
        let prague = Coordinates::new(50.0880, 14.4200).unwrap();
        let bbox = BoundingBox::around(&prague, 50.0);
        let near = Coordinates::new(50.0881, 14.4201).unwrap();
        let far = Coordinates::new(50.0900, 14.4200).unwrap();
        assert!(bbox.contains(&prague));
        assert!(bbox.contains(&near));
        assert!(!bbox.contains(&far));
    }

    #[test]
    fn test_bbox_near_pole_spans_all_longitudes() {
        let c = Coordinates::new(89.9999, 179.9999).unwrap();
        let bbox = BoundingBox::around(&c, 1_000.0);
        assert_eq!(bbox.max_lat, 90.0);
        assert_eq!((bbox.min_lng, bbox.max_lng), (-180.0, 180.0));
        assert!(bbox.contains(&c));
        // ~22 m away across the pole
        let across = Coordinates::new(89.9999, 0.0).unwrap();
        assert!(c.distance_to(&across) < 50.0);
        assert!(BoundingBox::around(&c, 50.0).contains(&across));
    }

    #[test]
    fn test_bbox_high_latitude_widens_enough() {
        // pole outside the window, but 1/cos(lat) is large
        let c = Coordinates::new(89.99, 10.0).unwrap();
        let east = Coordinates::new(89.99, 12.5).unwrap();
        assert!(c.distance_to(&east) < 50.0);
        assert!(BoundingBox::around(&c, 50.0).contains(&east));
    }

    #[test]
    fn test_bbox_wraps_across_antimeridian() {
        let west = Coordinates::new(-16.5, 179.9999).unwrap();
        let east = Coordinates::new(-16.5, -179.9999).unwrap();
        assert!(west.distance_to(&east) < 50.0);

        let bbox = BoundingBox::around(&west, 50.0);
        assert!(bbox.crosses_antimeridian());
        assert!(bbox.contains(&west));
        assert!(bbox.contains(&east));
        assert!(!bbox.contains(&Coordinates::new(-16.5, 0.0).unwrap()));
        assert!(BoundingBox::around(&east, 50.0).contains(&west));
        assert!(bbox.width() < 0.01);
    }

    #[test]
    fn test_bbox_contains_points_on_the_radius() {
        let c = Coordinates::new(60.0, 25.0).unwrap();
        let bbox = BoundingBox::around(&c, 1_000.0);
        for (dlat, dlng) in [(0.0089, 0.0), (-0.0089, 0.0), (0.0, 0.0179), (0.0, -0.0179), (0.0063, 0.0126)] {
            let p = Coordinates::new(c.lat + dlat, c.lng + dlng).unwrap();
            if c.distance_to(&p) <= 1_000.0 {
                assert!(bbox.contains(&p), "missed {}", p);
            }
        }
    }
}
