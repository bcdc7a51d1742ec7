use geographiclib_rs::{Geodesic, InverseGeodesic};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

static WGS84: Lazy<Geodesic> = Lazy::new(Geodesic::wgs84);

/// A point in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Finite and inside [-90, 90] x [-180, 180].
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// Surface distance in kilometres between two points, solving the inverse
/// geodesic problem on the WGS-84 ellipsoid (Karney's method).
///
/// Inputs are not validated; out-of-range or non-finite values yield whatever
/// the underlying solver produces, typically NaN.
pub fn geodesic_distance_km(from: Coordinates, to: Coordinates) -> f64 {
    let meters: f64 = WGS84.inverse(from.latitude, from.longitude, to.latitude, to.longitude);
    meters / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(actual: f64, expected: f64, tol: f64) -> bool {
        (actual - expected).abs() <= tol
    }

    #[test]
    fn same_point_is_zero() {
        let p = Coordinates::new(-6.2, 106.816);
        assert_eq!(geodesic_distance_km(p, p), 0.0);
    }

    #[test]
    fn one_degree_on_the_ellipsoid() {
        let origin = Coordinates::new(0.0, 0.0);
        // meridian degree at the equator is shorter than the equatorial degree
        let north = geodesic_distance_km(origin, Coordinates::new(1.0, 0.0));
        let east = geodesic_distance_km(origin, Coordinates::new(0.0, 1.0));
        assert!(close(north, 110.574, 0.01), "north={north}");
        assert!(close(east, 111.319, 0.01), "east={east}");
    }

    #[test]
    fn jakarta_short_hop() {
        let d = geodesic_distance_km(Coordinates::new(-6.210, 106.816), Coordinates::new(-6.200, 106.816));
        assert!(close(d, 1.106, 0.01), "d={d}");
    }

    #[test]
    fn gulf_of_guinea_to_jakarta_is_far() {
        let d = geodesic_distance_km(Coordinates::new(0.0, 0.0), Coordinates::new(-6.200, 106.816));
        assert!(d > 11_000.0 && d < 12_500.0, "d={d}");
    }

    #[test]
    fn crossing_the_antimeridian() {
        let d = geodesic_distance_km(Coordinates::new(0.0, 179.99), Coordinates::new(0.0, -179.99));
        assert!(close(d, 2.226, 0.01), "d={d}");
    }

    #[test]
    fn near_the_pole() {
        let d = geodesic_distance_km(Coordinates::new(89.99, 0.0), Coordinates::new(89.99, 180.0));
        assert!(d > 2.2 && d < 2.3, "d={d}");
        let at_pole = geodesic_distance_km(Coordinates::new(90.0, 0.0), Coordinates::new(90.0, 180.0));
        assert!(at_pole.abs() < 1e-6, "at_pole={at_pole}");
    }

    #[test]
    fn symmetric_and_deterministic() {
        let a = Coordinates::new(-6.1754, 106.8272);
        let b = Coordinates::new(-6.9175, 107.6191);
        let ab = geodesic_distance_km(a, b);
        assert_eq!(ab, geodesic_distance_km(a, b));
        assert!(close(ab, geodesic_distance_km(b, a), 1e-9));
    }

    #[test]
    fn validity_bounds() {
        assert!(Coordinates::new(90.0, -180.0).is_valid());
        assert!(!Coordinates::new(90.5, 0.0).is_valid());
        assert!(!Coordinates::new(0.0, 180.1).is_valid());
        assert!(!Coordinates::new(f64::NAN, 0.0).is_valid());
        assert!(!Coordinates::new(0.0, f64::INFINITY).is_valid());
    }
}
