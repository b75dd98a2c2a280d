//! The alignment orchestrator: the six-step pipeline that turns a raw GPS
//! trace into a pass/fail decision plus per-control timestamps.

use super::constants::{
    CONTROL_DEVIATION_FACTOR, MAX_POINT_DISTANCE, TRACK_DEVIATION_MAX, TRACK_DEVIATION_MIN,
};
use super::error::AlignmentError;
use super::geo::track_to_track;
use super::hirschberg::align_points;
use super::point::Point;
use super::shaper::{clear_stops, cut_off_epilog, cut_off_prolog, down_sample_mask_default};
use crate::metrics;
use serde::{Deserialize, Serialize};

/// Per-brevet acceptance thresholds. All optional; `None` falls back to the
/// documented default (Design Note "Configuration object").
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AlignmentConfig {
    pub track_deviation: Option<f64>,
    pub control_deviation: Option<f64>,
    #[serde(default)]
    pub skip_trim: bool,
}

/// Per-control visitation result: the matched track point, or `None` if the
/// checkpoint went unmatched (still counted against coverage downstream).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointHit {
    pub uid: String,
    pub point: Option<Point>,
}

/// Run the full pipeline: shape the raw track, align it to the route,
/// re-check deviation with the along-route shift disabled, align it to the
/// checkpoint list, re-check that deviation too, then confirm coverage.
pub fn align(
    config: &AlignmentConfig,
    short_route: &[Point],
    checkpoints: &[Point],
    checkpoint_uids: &[String],
    draft_track: &[Point],
) -> Result<Vec<CheckpointHit>, AlignmentError> {
    metrics::observe_track_points("raw", draft_track.len());

    let down_sampled_mask = down_sample_mask_default(draft_track);
    let down_sampled: Vec<Point> = draft_track
        .iter()
        .zip(down_sampled_mask.iter())
        .filter(|(_, &keep)| keep)
        .map(|(p, _)| *p)
        .collect();
    metrics::observe_track_points("down_sampled", down_sampled.len());

    let trimmed = if config.skip_trim || checkpoints.is_empty() {
        down_sampled
    } else {
        let after_prolog = cut_off_prolog(&down_sampled, checkpoints[0]);
        let before_epilog = cut_off_epilog(&after_prolog, *checkpoints.last().unwrap());
        before_epilog
    };
    let shaped = clear_stops(&trimmed, checkpoints);
    metrics::observe_track_points("shaped", shaped.len());

    if shaped.is_empty() {
        return Err(AlignmentError::NoTrack);
    }

    let (aligned_route, aligned_track, route_score) =
        align_points(short_route, &shaped, -MAX_POINT_DISTANCE, 0.0);
    let reduced_to_route = reduce_to_matched(&aligned_route, &aligned_track);

    let track_deviation_max = config
        .track_deviation
        .unwrap_or(reduced_to_route.len() as f64 * TRACK_DEVIATION_MAX);
    if route_score < -track_deviation_max {
        return Err(AlignmentError::RouteDeviation {
            actual: route_score,
            threshold: -track_deviation_max,
        });
    }

    let route_deviation = track_to_track(short_route, &reduced_to_route, 0.0);
    metrics::observe_route_deviation(route_deviation);
    let track_deviation_min = config
        .track_deviation
        .unwrap_or(reduced_to_route.len() as f64 * TRACK_DEVIATION_MIN);
    if route_deviation > track_deviation_min {
        return Err(AlignmentError::RouteDeviation {
            actual: route_deviation,
            threshold: track_deviation_min,
        });
    }

    let (aligned_checkpoints, aligned_track_to_checkpoints, _) =
        align_points(checkpoints, &shaped, -MAX_POINT_DISTANCE, 0.0);
    let reduced_to_checkpoints =
        reduce_to_matched(&aligned_checkpoints, &aligned_track_to_checkpoints);

    let control_deviation = track_to_track(checkpoints, &reduced_to_checkpoints, 0.0);
    metrics::observe_control_deviation(control_deviation);
    let control_deviation_max = config
        .control_deviation
        .unwrap_or((checkpoints.len() as f64 / 2.0 + 1.0) * CONTROL_DEVIATION_FACTOR);
    if control_deviation > control_deviation_max {
        return Err(AlignmentError::ControlDeviation {
            actual: control_deviation,
            threshold: control_deviation_max,
        });
    }

    let matched_checkpoints = reduced_to_checkpoints
        .iter()
        .filter(|p| !p.is_missing())
        .count();
    let required_threshold = checkpoints.len() as f64 / 2.0 + 1.0;
    if (matched_checkpoints as f64) < required_threshold {
        return Err(AlignmentError::CheckpointMissing {
            found: matched_checkpoints,
            required: required_threshold.ceil() as usize,
        });
    }

    Ok(checkpoint_uids
        .iter()
        .zip(reduced_to_checkpoints.iter())
        .map(|(uid, point)| CheckpointHit {
            uid: uid.clone(),
            point: if point.is_missing() {
                None
            } else {
                Some(*point)
            },
        })
        .collect())
}

/// Keep only the target-side aligned points at positions where the
/// corresponding source-side entry actually matched (not a gap) — mirrors
/// filtering `second[first.all(axis=1) != None]` in the source.
fn reduce_to_matched(aligned_source: &[Point], aligned_target: &[Point]) -> Vec<Point> {
    aligned_source
        .iter()
        .zip(aligned_target.iter())
        .filter(|(s, _)| !s.is_missing())
        .map(|(_, t)| *t)
        .collect()
}
