//! End-to-end exercises of the public alignment API against a synthetic
//! brevet: a straight route, a few controls, and a track that loiters near
//! each one before continuing — small enough to hand-verify, shaped enough
//! to exercise every pipeline stage (down-sample, trim, stop-clearing,
//! two-pass Hirschberg, coverage check).

use brevet_align::align::{
    align, build_checkpoint_list, AlignmentConfig, CheckpointInput, Point,
};

fn route_point(km: f64) -> Point {
    // one degree of latitude is roughly 111 km; walk north along a meridian
    Point::new(55.0 + km / 111.0, 37.0, 0.0, km * 1000.0)
}

fn synthetic_route(total_km: f64, step_km: f64) -> Vec<Point> {
    let mut km = 0.0;
    let mut out = Vec::new();
    while km <= total_km {
        out.push(route_point(km));
        km += step_km;
    }
    out
}

/// A rider's trace: dense points along the route, with a short stationary
/// loiter (duplicate-ish points) near each checkpoint to exercise
/// `clear_stops`.
fn synthetic_track(checkpoints_km: &[f64], total_km: f64) -> Vec<Point> {
    let mut track = Vec::new();
    let mut t = 0.0;
    let mut km = 0.0;
    let step_km = 0.05;
    while km <= total_km {
        track.push(Point::new(55.0 + km / 111.0, 37.0, t, km * 1000.0));
        t += 10.0;

        if checkpoints_km.iter().any(|&cp| (cp - km).abs() < step_km / 2.0) {
            for _ in 0..5 {
                track.push(Point::new(55.0 + km / 111.0, 37.0, t, km * 1000.0));
                t += 10.0;
            }
        }
        km += step_km;
    }
    track
}

#[test]
fn synthetic_brevet_passes_end_to_end() {
    let checkpoints_km = [0.0, 20.0, 45.0, 70.0];
    let route = synthetic_route(70.0, 0.2);
    let track = synthetic_track(&checkpoints_km, 70.0);

    let checkpoint_inputs: Vec<CheckpointInput> = checkpoints_km
        .iter()
        .enumerate()
        .map(|(i, &km)| CheckpointInput {
            lat: 55.0 + km / 111.0,
            lng: 37.0,
            distance_km: km,
            uid: format!("cp{i}"),
        })
        .collect();
    let (checkpoints, uids) = build_checkpoint_list(&checkpoint_inputs);

    // §8: expansion length is 2N - 2 for N >= 2.
    assert_eq!(checkpoints.len(), 2 * checkpoints_km.len() - 2);
    assert_eq!(uids.len(), checkpoints.len());

    let config = AlignmentConfig {
        skip_trim: true,
        ..Default::default()
    };
    let result = align(&config, &route, &checkpoints, &uids, &track);

    assert!(
        result.is_ok(),
        "expected the synthetic brevet to align cleanly, got {:?}",
        result
    );
    let hits = result.unwrap();
    assert_eq!(hits.len(), checkpoints.len());

    let matched = hits.iter().filter(|h| h.point.is_some()).count();
    assert!(
        matched as f64 >= checkpoints.len() as f64 / 2.0 + 1.0,
        "coverage invariant from §8 should hold: matched={matched}, total={}",
        checkpoints.len()
    );
}

#[test]
fn route_cumulative_distance_is_monotone() {
    use brevet_align::align::build_route;
    use brevet_align::align::RoutePlotPoint;

    let points: Vec<RoutePlotPoint> = (0..10)
        .map(|i| RoutePlotPoint {
            lat: 55.0 + i as f64 * 0.01,
            lng: 37.0,
            dir: None,
            labtxt: None,
            symlabs: Vec::new(),
        })
        .collect();
    let track = build_route(&points);

    assert_eq!(track[0].d, 0.0);
    for pair in track.windows(2) {
        assert!(pair[1].d >= pair[0].d);
    }
}

#[test]
fn empty_track_is_rejected_with_no_track() {
    use brevet_align::align::AlignmentError;

    let config = AlignmentConfig::default();
    let route = vec![Point::new(55.0, 37.0, 0.0, 0.0)];
    let checkpoints = vec![Point::new(55.0, 37.0, 0.0, 0.0)];
    let uids = vec!["start".to_string()];
    let result = align(&config, &route, &checkpoints, &uids, &[]);
    assert_eq!(result.unwrap_err(), AlignmentError::NoTrack);
}
