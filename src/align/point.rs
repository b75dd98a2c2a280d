//! The `Point` type shared by every component of the alignment engine.

use serde::{Deserialize, Serialize};

/// A single point in the alignment engine's normalized 4-tuple shape:
/// `(lat, lng, t, d)`.
///
/// - A route point has `t = 0.0`, `d` populated with cumulative distance.
/// - A track point has both `t` (UNIX seconds) and `d` populated.
/// - A checkpoint has `t = 0.0`, `d` set to the planned offset from start.
///
/// The all-`NaN` point is the sentinel for "no match" in aligner output;
/// callers test with [`Point::is_missing`]. This is the one convention used
/// throughout the engine — it is never mixed with a tagged `Option`-like
/// representation, since the aligner and the deviation recomputation both
/// need a uniform, `Copy`, directly-summable shape.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub lat: f64,
    pub lng: f64,
    pub t: f64,
    pub d: f64,
}

impl Point {
    pub const fn new(lat: f64, lng: f64, t: f64, d: f64) -> Self {
        Self { lat, lng, t, d }
    }

    /// The missing-point sentinel: all four fields are `NaN`.
    pub const MISSING: Point = Point {
        lat: f64::NAN,
        lng: f64::NAN,
        t: f64::NAN,
        d: f64::NAN,
    };

    pub fn is_missing(&self) -> bool {
        self.lat.is_nan() || self.lng.is_nan()
    }
}

impl From<[f64; 4]> for Point {
    fn from(a: [f64; 4]) -> Self {
        Point::new(a[0], a[1], a[2], a[3])
    }
}

impl From<Point> for [f64; 4] {
    fn from(p: Point) -> Self {
        [p.lat, p.lng, p.t, p.d]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_point_is_missing() {
        assert!(Point::MISSING.is_missing());
    }

    #[test]
    fn ordinary_point_is_not_missing() {
        assert!(!Point::new(55.0, 37.0, 0.0, 0.0).is_missing());
    }

    #[test]
    fn round_trips_through_array() {
        let p = Point::new(1.0, 2.0, 3.0, 4.0);
        let a: [f64; 4] = p.into();
        assert_eq!(a, [1.0, 2.0, 3.0, 4.0]);
        assert_eq!(Point::from(a), p);
    }
}
