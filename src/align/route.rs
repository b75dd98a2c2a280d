//! Route construction: turn a raw route-editor export into a
//! cumulative-distance polyline, its two simplified forms, and the
//! checkpoint list it implies.

use super::checkpoints::CheckpointInput;
use super::constants::{EPILOG_MAX_LENGTH, ROUTE_SIMPLIFY_FACTOR};
use super::geo::geo_distance;
use super::point::Point;
use super::rdp::{down_sample_factor, simplify};
use serde::{Deserialize, Serialize};

/// A label embedded in the route editor's export ("symlab") describing a
/// point of interest that may itself be a control.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymLabel {
    pub lat: f64,
    pub lng: f64,
    pub labtxt: Option<String>,
}

/// One point as exported by the route editor: a coordinate plus whatever
/// free-text metadata it carries. Only the first point's `symlabs` are
/// consulted (see Design Note "Label extraction").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutePlotPoint {
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub dir: Option<String>,
    #[serde(default)]
    pub labtxt: Option<String>,
    #[serde(default)]
    pub symlabs: Vec<SymLabel>,
}

/// A discovered control: name, coordinates, and planned distance from the
/// start in kilometers (rounded, matching the source's m-to-km conversion).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteCheckpoint {
    pub lat: f64,
    pub lng: f64,
    pub name: String,
    pub distance_km: f64,
}

impl RouteCheckpoint {
    pub fn into_input(self, uid: String) -> CheckpointInput {
        CheckpointInput {
            lat: self.lat,
            lng: self.lng,
            distance_km: self.distance_km,
            uid,
        }
    }
}

/// Whether a route point's free-text fields mark it as a mandatory control.
/// Locale-specific and heuristic by design (Design Note "name-based control
/// detection") — preserved exactly as found, not generalized.
pub fn is_control(dir: &Option<String>, labtxt: &Option<String>) -> bool {
    let starts_with_marker = |s: &str| s.starts_with("CP") || s.starts_with("КП");
    dir.as_deref().map(starts_with_marker).unwrap_or(false)
        || labtxt.as_deref().map(starts_with_marker).unwrap_or(false)
}

/// Build the cumulative-distance route track from the raw plot points.
/// A point whose geodesic distance from its predecessor fails with
/// `MathDomain` (near-duplicate coordinates) is dropped silently — the
/// route keeps accumulating from the last point it could place.
pub fn build_route(points: &[RoutePlotPoint]) -> Vec<Point> {
    let mut track = Vec::with_capacity(points.len());
    let mut iter = points.iter();
    let Some(first) = iter.next() else {
        return track;
    };
    track.push(Point::new(first.lat, first.lng, 0.0, 0.0));

    for p in iter {
        let prev = *track.last().unwrap();
        match geo_distance(prev.lat, prev.lng, p.lat, p.lng) {
            Ok(d) => track.push(Point::new(p.lat, p.lng, 0.0, prev.d + d)),
            Err(_) => continue,
        }
    }

    track
}

/// Simplify a route with Ramer-Douglas-Peucker at the given epsilon.
pub fn simplify_route(track: &[Point], eps: f64) -> Vec<Point> {
    let coords: Vec<(f64, f64)> = track.iter().map(|p| (p.lat, p.lng)).collect();
    let mask = simplify(&coords, eps);
    track
        .iter()
        .zip(mask.iter())
        .filter(|(_, &keep)| keep)
        .map(|(p, _)| *p)
        .collect()
}

/// Build both the "normal" short track (fixed epsilon) and a second,
/// auto-tuned short track whose length tracks the normal one regardless of
/// the source's point count.
pub fn build_short_tracks(track: &[Point]) -> (Vec<Point>, Vec<Point>) {
    let normal = simplify_route(track, ROUTE_SIMPLIFY_FACTOR);
    let eps = down_sample_factor(track.len().max(1), normal.len());
    let auto = simplify_route(track, eps);
    (normal, auto)
}

/// Trace the route and discover its checkpoints: a synthetic "Start" at the
/// first point, every `is_control()` route point in order, every
/// `is_control()` symlab attached to the first point (with its distance
/// resolved to the nearest route point when not given), and a synthetic
/// "End" if the route runs on past the last discovered control.
pub fn find_checkpoints(points: &[RoutePlotPoint], track: &[Point]) -> Vec<RouteCheckpoint> {
    if points.is_empty() || track.is_empty() {
        return Vec::new();
    }

    let mut checkpoints = Vec::new();
    checkpoints.push(RouteCheckpoint {
        lat: track[0].lat,
        lng: track[0].lng,
        name: "Start".to_string(),
        distance_km: 0.0,
    });

    for (p, t) in points.iter().zip(track.iter()).skip(1) {
        if is_control(&p.dir, &p.labtxt) {
            checkpoints.push(RouteCheckpoint {
                lat: t.lat,
                lng: t.lng,
                name: control_name(&p.dir, &p.labtxt),
                distance_km: (t.d / 1000.0).round(),
            });
        }
    }

    let route_points: Vec<Point> = points
        .iter()
        .zip(track.iter())
        .map(|(_, t)| *t)
        .collect();

    let labels: Vec<&SymLabel> = points[0]
        .symlabs
        .iter()
        .filter(|l| is_control(&None, &l.labtxt))
        .collect();

    for label in labels {
        let name = label.labtxt.clone().unwrap_or_default().trim().to_string();
        let distance_km = nearest_distance_km(label.lat, label.lng, &route_points);
        checkpoints.push(RouteCheckpoint {
            lat: label.lat,
            lng: label.lng,
            name,
            distance_km,
        });
    }

    if let Some(last) = track.last() {
        if let Some(last_control) = checkpoints.last() {
            if last.d / 1000.0 > last_control.distance_km + EPILOG_MAX_LENGTH / 1000.0 {
                checkpoints.push(RouteCheckpoint {
                    lat: last.lat,
                    lng: last.lng,
                    name: "End".to_string(),
                    distance_km: (last.d / 1000.0).round(),
                });
            }
        }
    }

    checkpoints
}

fn control_name(dir: &Option<String>, labtxt: &Option<String>) -> String {
    dir.clone()
        .or_else(|| labtxt.clone())
        .unwrap_or_default()
        .trim()
        .to_string()
}

/// Distance (km) of the route point nearest to `(lat, lng)`. A genuine
/// km-0 label is indistinguishable from "missing distance" — the source
/// treats `0.0` as missing and so do we (Design Note "start-label
/// distance"): a caller should only ever invoke this when a label didn't
/// carry its own distance.
fn nearest_distance_km(lat: f64, lng: f64, route: &[Point]) -> f64 {
    route
        .iter()
        .min_by(|a, b| {
            let da = geo_distance(lat, lng, a.lat, a.lng).unwrap_or(f64::INFINITY);
            let db = geo_distance(lat, lng, b.lat, b.lng).unwrap_or(f64::INFINITY);
            da.partial_cmp(&db).unwrap()
        })
        .map(|p| (p.d / 1000.0).round())
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plot(lat: f64, lng: f64, dir: Option<&str>) -> RoutePlotPoint {
        RoutePlotPoint {
            lat,
            lng,
            dir: dir.map(String::from),
            labtxt: None,
            symlabs: Vec::new(),
        }
    }

    #[test]
    fn is_control_recognizes_cp_and_cyrillic_kp() {
        assert!(is_control(&Some("CP1".into()), &None));
        assert!(is_control(&None, &Some("КП2".into())));
        assert!(!is_control(&Some("Turn left".into()), &None));
    }

    #[test]
    fn build_route_accumulates_distance() {
        let points = vec![
            plot(55.0, 37.0, None),
            plot(55.1, 37.0, None),
            plot(55.2, 37.0, None),
        ];
        let track = build_route(&points);
        assert_eq!(track.len(), 3);
        assert_eq!(track[0].d, 0.0);
        assert!(track[1].d > 0.0);
        assert!(track[2].d > track[1].d);
    }

    #[test]
    fn build_route_skips_math_domain_duplicate() {
        let points = vec![
            plot(60.691026, 28.806356, None),
            plot(60.691026, 28.806357, None),
            plot(55.2, 37.0, None),
        ];
        let track = build_route(&points);
        assert_eq!(track.len(), 2);
    }

    #[test]
    fn find_checkpoints_includes_start_and_controls() {
        let points = vec![
            plot(55.0, 37.0, None),
            plot(55.1, 37.0, Some("CP1")),
            plot(55.2, 37.0, None),
        ];
        let track = build_route(&points);
        let checkpoints = find_checkpoints(&points, &track);
        assert_eq!(checkpoints[0].name, "Start");
        assert_eq!(checkpoints[1].name, "CP1");
    }

    #[test]
    fn empty_route_has_no_checkpoints() {
        assert!(find_checkpoints(&[], &[]).is_empty());
    }
}
