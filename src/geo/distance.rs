//! Great-circle distance. Meters are the only unit used in this crate.

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Haversine distance between two lat/lng pairs, in meters.
///
/// The haversine term is clamped to `[0, 1]`; rounding can push it just
/// outside that range for identical or antipodal points.
pub fn haversine_m(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lng2 - lng1).to_radians();

    let h = (d_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    let h = h.clamp(0.0, 1.0);

    2.0 * EARTH_RADIUS_M * h.sqrt().atan2((1.0 - h).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const PRAGUE: (f64, f64) = (50.0880, 14.4200);
    const BRNO: (f64, f64) = (49.1951, 16.6068);

    #[test]
    fn test_same_point_is_zero() {
        assert_eq!(haversine_m(PRAGUE.0, PRAGUE.1, PRAGUE.0, PRAGUE.1), 0.0);
        assert_eq!(haversine_m(-33.8688, 151.2093, -33.8688, 151.2093), 0.0);
    }

    #[test]
    fn test_symmetry() {
        let pairs = [
            (PRAGUE, BRNO),
            ((0.0, 0.0), (0.0, 180.0)),
            ((89.9, -45.0), (-89.9, 135.0)),
            ((59.3293, 18.0686), (40.7128, -74.0060)),
        ];
        for (a, b) in pairs {
            assert_relative_eq!(
                haversine_m(a.0, a.1, b.0, b.1),
                haversine_m(b.0, b.1, a.0, a.1),
                max_relative = 1e-12
            );
        }
    }

    #[test]
    fn test_prague_brno() {
        // ~186.1 km on the 6371 km sphere
        let d = haversine_m(PRAGUE.0, PRAGUE.1, BRNO.0, BRNO.1);
        assert!((d - 186_140.0).abs() < 2_000.0, "got {}", d);
    }

    #[test]
    fn test_short_distance() {
        let d = haversine_m(50.0880, 14.4200, 50.0881, 14.4201);
        assert!((d - 13.2).abs() < 0.5, "got {}", d);
    }

    #[test]
    fn test_antipodal_is_half_circumference() {
        let d = haversine_m(0.0, 0.0, 0.0, 180.0);
        assert_relative_eq!(d, std::f64::consts::PI * EARTH_RADIUS_M, max_relative = 1e-9);
        let d = haversine_m(90.0, 0.0, -90.0, 0.0);
        assert!(d.is_finite());
        assert_relative_eq!(d, std::f64::consts::PI * EARTH_RADIUS_M, max_relative = 1e-9);
    }

    #[test]
    fn test_near_identical_points_stay_finite() {
        let d = haversine_m(50.0880, 14.4200, 50.0880000001, 14.4200000001);
        assert!(d.is_finite());
        assert!(d >= 0.0 && d < 0.1);
    }
}
