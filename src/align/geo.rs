//! Geodesic kernel: point-to-point, point-to-sequence, and sequence-to-sequence
//! distances used everywhere else in the alignment engine.

use super::constants::{DISTANCE_FACTOR, EARTH_RADIUS, MAX_POINT_DISTANCE};
use super::error::AlignmentError;
use super::point::Point;

/// Great-circle distance between two coordinates using the law of cosines
/// on a sphere of radius [`EARTH_RADIUS`].
///
/// Identical coordinates short-circuit to `0.0`. Coordinates close enough
/// together to push the acos argument outside `[-1, 1]` (or otherwise
/// produce a non-finite result) fail with [`AlignmentError::MathDomain`] —
/// this mirrors IEEE `acos` raising a domain error on inputs a hair
/// outside its domain due to floating-point rounding.
///
/// The cosine form is used instead of haversine: at this scale accuracy is
/// identical, and it costs one transcendental call instead of two, which
/// matters when the aligner evaluates this on the order of 10^6 times.
pub fn geo_distance(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> Result<f64, AlignmentError> {
    if lat1 == lat2 && lng1 == lng2 {
        return Ok(0.0);
    }

    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let delta_lambda = (lng2 - lng1).to_radians();

    let cos_arg = phi1.sin() * phi2.sin() + phi1.cos() * phi2.cos() * delta_lambda.cos();
    let distance = EARTH_RADIUS * cos_arg.acos();

    if distance.is_finite() {
        Ok(distance)
    } else {
        Err(AlignmentError::MathDomain {
            lat1,
            lng1,
            lat2,
            lng2,
        })
    }
}

/// Distance from `p` to every element of `track`, with a distance-from-start
/// shift penalty (scaled by `factor`) added on top of the geodesic distance.
///
/// The shift term keeps the aligner from matching two geographically close
/// points that sit thousands of kilometers apart along the route (two
/// passes through the same village, say). A [`AlignmentError::MathDomain`]
/// for a given pair degrades to `NaN` at that position rather than failing
/// the whole call — the caller (the aligner's cost function) is expected to
/// treat `NaN` contributions specially downstream.
pub fn point_to_track(p: Point, track: &[Point], factor: f64) -> Vec<f64> {
    track
        .iter()
        .map(|q| {
            let shift = (q.d - p.d).abs() * factor;
            match geo_distance(p.lat, p.lng, q.lat, q.lng) {
                Ok(d) => shift + d,
                Err(_) => f64::NAN,
            }
        })
        .collect()
}

/// Default-factor [`point_to_track`] using [`DISTANCE_FACTOR`].
pub fn point_to_track_default(p: Point, track: &[Point]) -> Vec<f64> {
    point_to_track(p, track, DISTANCE_FACTOR)
}

/// Elementwise distance between two equal-length, already-aligned sequences,
/// summed into a single scalar. `NaN` pairs (unmatched positions, or
/// degenerate coordinate pairs) contribute [`MAX_POINT_DISTANCE`] instead of
/// poisoning the sum — callers use this to recompute an aligner's score
/// stripped of its gap penalties, so a bounded-but-real penalty is wanted
/// for whatever the aligner left unmatched.
pub fn track_to_track(source: &[Point], target: &[Point], factor: f64) -> f64 {
    source
        .iter()
        .zip(target.iter())
        .map(|(s, t)| {
            let shift = (t.d - s.d).abs() * factor;
            let d = match geo_distance(s.lat, s.lng, t.lat, t.lng) {
                Ok(d) => shift + d,
                Err(_) => f64::NAN,
            };
            if d.is_nan() {
                MAX_POINT_DISTANCE
            } else {
                d
            }
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn zero_distance_for_identical_points() {
        assert_eq!(geo_distance(0.0, 0.0, 0.0, 0.0).unwrap(), 0.0);
    }

    #[test]
    fn known_distance_along_meridian() {
        assert_approx_eq!(
            geo_distance(50.0, 20.0, 60.0, 20.0).unwrap(),
            1_111_949.2664455846,
            1e-4
        );
    }

    #[test]
    fn known_distance_along_parallel() {
        assert_approx_eq!(
            geo_distance(60.0, 20.0, 60.0, 30.0).unwrap(),
            555_445.1329718407,
            1e-4
        );
    }

    #[test]
    fn degenerate_close_points_fail_math_domain() {
        let err = geo_distance(60.691026, 28.806356, 60.691026, 28.806357).unwrap_err();
        assert!(matches!(err, AlignmentError::MathDomain { .. }));
    }

    #[test]
    fn point_to_track_matches_reference_vector() {
        let p = Point::new(60.0, 20.0, 0.0, 150.0);
        let track = [
            Point::new(50.0, 20.0, 0.0, 0.0),
            Point::new(60.0, 20.0, 0.0, 0.0),
            Point::new(60.0, 20.0, 0.0, 150.0),
            Point::new(60.0, 20.0, 0.0, 1150.0),
            Point::new(60.0, 30.0, 0.0, 200.0),
            Point::new(0.0, 0.0, 0.0, 0.0),
        ];
        let expected = [
            1_111_949.416,
            0.15,
            0.0,
            1.0,
            555_445.183,
            6_891_381.266,
        ];
        let result = point_to_track_default(p, &track);
        for (got, want) in result.iter().zip(expected.iter()) {
            assert_approx_eq!(got, want, 1e-3);
        }
    }

    #[test]
    fn track_to_track_substitutes_max_distance_for_nan() {
        let source = [Point::new(60.691026, 28.806356, 0.0, 0.0)];
        let target = [Point::new(60.691026, 28.806357, 0.0, 0.0)];
        assert_eq!(track_to_track(&source, &target, 0.0), MAX_POINT_DISTANCE);
    }

    #[test]
    fn track_to_track_sums_zero_for_identical_sequences() {
        let seq = [
            Point::new(55.0, 37.0, 0.0, 0.0),
            Point::new(55.1, 37.0, 0.0, 100.0),
        ];
        assert_eq!(track_to_track(&seq, &seq, 0.0), 0.0);
    }
}
