//! Geometry primitives: geohash cells, haversine distance and name
//! similarity. Everything here is pure.

pub mod distance;
pub mod geohash;
pub mod similarity;
pub mod types;

pub use distance::{haversine_m, EARTH_RADIUS_M};
pub use geohash::{decode, decode_bbox, encode, neighbors, DEFAULT_PRECISION};
pub use similarity::{normalize, similarity};
pub use types::{BoundingBox, Coordinates, SkipReason};
