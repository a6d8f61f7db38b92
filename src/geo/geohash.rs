//! Geohash encoding and decoding.
//!
//! Bisection compares with a strict `>`: a coordinate exactly on a midpoint
//! goes to the lower half. This differs from the common geohash
//! implementations at cell edges (e.g. `(0, 0)` encodes as `7zzz…`, not
//! `s000…`), and zone slugs depend on it.

use super::types::{BoundingBox, Coordinates};
use crate::error::GeoError;

/// Geohash base32 alphabet (no `a`, `i`, `l`, `o`).
pub const ALPHABET: &[u8; 32] = b"0123456789bcdefghjkmnpqrstuvwxyz";

/// Zone precision used unless configured otherwise (~153 m x 153 m cells).
pub const DEFAULT_PRECISION: usize = 7;

const BITS_PER_CHAR: usize = 5;

/// Encode `lat`/`lng` into a geohash of `precision` characters.
pub fn encode(lat: f64, lng: f64, precision: usize) -> Result<String, GeoError> {
    if precision == 0 {
        return Err(GeoError::InvalidPrecision);
    }
    let coords = Coordinates::new(lat, lng)?;
    Ok(encode_coordinates(&coords, precision))
}

/// Encode already-validated coordinates. `precision` must be non-zero.
pub(crate) fn encode_coordinates(coords: &Coordinates, precision: usize) -> String {
    let mut lat_range = (-90.0_f64, 90.0_f64);
    let mut lng_range = (-180.0_f64, 180.0_f64);
    let mut hash = String::with_capacity(precision);
    let mut even = true;
    let mut bits = 0;
    let mut idx = 0usize;

    while hash.len() < precision {
        let (range, value) = if even {
            (&mut lng_range, coords.lng)
        } else {
            (&mut lat_range, coords.lat)
        };
        let mid = (range.0 + range.1) / 2.0;
        idx <<= 1;
        if value > mid {
            idx |= 1;
            range.0 = mid;
        } else {
            range.1 = mid;
        }
        even = !even;

        bits += 1;
        if bits == BITS_PER_CHAR {
            hash.push(ALPHABET[idx] as char);
            bits = 0;
            idx = 0;
        }
    }
    hash
}

fn char_index(c: char) -> Result<usize, GeoError> {
    let lower = c.to_ascii_lowercase();
    ALPHABET
        .iter()
        .position(|&b| b as char == lower)
        .ok_or(GeoError::InvalidGeohashChar(c))
}

/// The cell covered by `hash`.
pub fn decode_bbox(hash: &str) -> Result<BoundingBox, GeoError> {
    if hash.is_empty() {
        return Err(GeoError::EmptyGeohash);
    }
    let mut lat_range = (-90.0_f64, 90.0_f64);
    let mut lng_range = (-180.0_f64, 180.0_f64);
    let mut even = true;

    for c in hash.chars() {
        let idx = char_index(c)?;
        for shift in (0..BITS_PER_CHAR).rev() {
            let range = if even { &mut lng_range } else { &mut lat_range };
            let mid = (range.0 + range.1) / 2.0;
            if (idx >> shift) & 1 == 1 {
                range.0 = mid;
            } else {
                range.1 = mid;
            }
            even = !even;
        }
    }

    Ok(BoundingBox {
        min_lat: lat_range.0,
        max_lat: lat_range.1,
        min_lng: lng_range.0,
        max_lng: lng_range.1,
    })
}

/// Centre of the cell covered by `hash`.
pub fn decode(hash: &str) -> Result<Coordinates, GeoError> {
    decode_bbox(hash).map(|bbox| bbox.center())
}

/// The up to eight cells surrounding `hash` at the same precision.
///
/// Longitude wraps across the antimeridian; cells beyond a pole are omitted.
pub fn neighbors(hash: &str) -> Result<Vec<String>, GeoError> {
    let bbox = decode_bbox(hash)?;
    let center = bbox.center();
    let (h, w) = (bbox.height(), bbox.width());
    let precision = hash.chars().count();

    let mut out = Vec::with_capacity(8);
    for d_lat in [1.0, 0.0, -1.0] {
        for d_lng in [-1.0, 0.0, 1.0] {
            if d_lat == 0.0 && d_lng == 0.0 {
                continue;
            }
            let lat = center.lat + d_lat * h;
            if !(-90.0..=90.0).contains(&lat) {
                continue;
            }
            let mut lng = center.lng + d_lng * w;
            if lng > 180.0 {
                lng -= 360.0;
            } else if lng < -180.0 {
                lng += 360.0;
            }
            let cell = encode_coordinates(&Coordinates { lat, lng }, precision);
            if !out.contains(&cell) {
                out.push(cell);
            }
        }
    }
    Ok(out)
}
