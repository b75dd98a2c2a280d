//! Checkpoint list builder: turns a brevet's control list into the
//! entry/exit-expanded point sequence the aligner matches the shaped track
//! against.

use super::point::Point;
use serde::{Deserialize, Serialize};

/// One control as configured for a brevet: a coordinate, a uid used to
/// report back which control a rider passed, and its planned distance from
/// the start (kilometers; `0.0` for "unknown", see the start-label design
/// note in [`crate::align::route`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointInput {
    pub lat: f64,
    pub lng: f64,
    pub distance_km: f64,
    pub uid: String,
}

/// Expand a checkpoint list into entry/exit pairs and drop the very first
/// and last copies (a rider neither "enters" the start control nor "exits"
/// the finish — their single pass already is the event). A solitary
/// checkpoint instead drops only its trailing copy, since dropping both
/// would empty the list.
///
/// Returns `(points, uids)` of equal length: for `N` checkpoints the
/// length is `2N - 2` (or `1` for `N == 1`).
pub fn build_checkpoint_list(checkpoints: &[CheckpointInput]) -> (Vec<Point>, Vec<String>) {
    let mut points = Vec::with_capacity(checkpoints.len() * 2);
    let mut uids = Vec::with_capacity(checkpoints.len() * 2);

    for cp in checkpoints {
        let point = Point::new(cp.lat, cp.lng, 0.0, cp.distance_km * 1000.0);
        points.push(point);
        points.push(point);
        uids.push(cp.uid.clone());
        uids.push(cp.uid.clone());
    }

    if checkpoints.len() == 1 {
        points.pop();
        uids.pop();
    } else if !points.is_empty() {
        points.pop();
        points.remove(0);
        uids.pop();
        uids.remove(0);
    }

    (points, uids)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cp(uid: &str, distance_km: f64) -> CheckpointInput {
        CheckpointInput {
            lat: 55.0,
            lng: 37.0,
            distance_km,
            uid: uid.to_string(),
        }
    }

    #[test]
    fn expands_entry_exit_and_trims_first_and_last() {
        let checkpoints = vec![cp("a", 0.0), cp("b", 10.0), cp("c", 20.0)];
        let (points, uids) = build_checkpoint_list(&checkpoints);
        assert_eq!(uids, vec!["a", "b", "b", "c"]);
        let distances: Vec<f64> = points.iter().map(|p| p.d).collect();
        assert_eq!(distances, vec![0.0, 10_000.0, 10_000.0, 20_000.0]);
    }

    #[test]
    fn single_checkpoint_keeps_one_copy() {
        let checkpoints = vec![cp("only", 5.0)];
        let (points, uids) = build_checkpoint_list(&checkpoints);
        assert_eq!(uids, vec!["only"]);
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].d, 5_000.0);
    }

    #[test]
    fn empty_input_yields_empty_output() {
        let (points, uids) = build_checkpoint_list(&[]);
        assert!(points.is_empty());
        assert!(uids.is_empty());
    }

    #[test]
    fn two_checkpoints_keep_one_exit_and_one_entry() {
        let checkpoints = vec![cp("a", 0.0), cp("b", 10.0)];
        let (points, uids) = build_checkpoint_list(&checkpoints);
        assert_eq!(uids, vec!["a", "b"]);
        assert_eq!(points.len(), 2);
    }
}
