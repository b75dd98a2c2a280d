//! Track shaping: down-sample a raw point stream, trim everything before the
//! start and after the finish, and drop points recorded while the rider was
//! stopped at a checkpoint.

use super::constants::{CHECKPOINT_RADIUS, DOWN_SAMPLE_INTERVAL, LOOKUP_AHEAD_POINTS};
use super::geo::{geo_distance, point_to_track_default};
use super::point::Point;

/// Build a retention mask that leaves roughly one point every `interval`
/// meters. The look-ahead window grows when nothing in range clears the
/// interval (the rider paused or the recording got sparse) and shrinks once
/// a hit is found nearby, so a single window size doesn't have to fit both a
/// dense urban crawl and a long open-road stretch of the same track.
pub fn down_sample_mask(track: &[Point], ahead: usize, interval: f64) -> Vec<bool> {
    let n = track.len();
    let mut mask = vec![false; n];
    if n == 0 {
        return mask;
    }

    let mut i = 0usize;
    let mut ahead = ahead;
    while i < n - 1 {
        mask[i] = true;

        let window_end = (i + 1 + ahead).min(n);
        let window = &track[i + 1..window_end];
        let distances = point_to_track_default(track[i], window);

        let offset = distances
            .iter()
            .position(|d| !d.is_nan() && *d > interval);

        match offset {
            Some(0) => {
                i += 1;
            }
            Some(off) => {
                i += off + 1;
                ahead = (ahead + off + 19) / 2;
                continue;
            }
            None => {
                if i + ahead > n {
                    break;
                }
                ahead = (ahead as f64 * 1.5) as usize;
                continue;
            }
        }
        ahead = (ahead + 19) / 2;
    }

    mask
}

/// [`down_sample_mask`] with the engine's default window and interval.
pub fn down_sample_mask_default(track: &[Point]) -> Vec<bool> {
    down_sample_mask(track, LOOKUP_AHEAD_POINTS, DOWN_SAMPLE_INTERVAL)
}

/// Drop every leading point before the first one within [`CHECKPOINT_RADIUS`]
/// of `start`, and rebase the remaining points' cumulative distance against
/// it so the shaped track starts at zero.
pub fn cut_off_prolog(track: &[Point], start: Point) -> Vec<Point> {
    if track.len() < 2 {
        return track.to_vec();
    }

    let offset = track
        .iter()
        .position(|p| {
            geo_distance(start.lat, start.lng, p.lat, p.lng)
                .map(|d| d < CHECKPOINT_RADIUS)
                .unwrap_or(false)
        })
        .unwrap_or(0);

    let prolog = track[offset].d;
    track[offset..]
        .iter()
        .map(|p| Point::new(p.lat, p.lng, p.t, p.d - prolog))
        .collect()
}

/// Drop every trailing point after the last one within [`CHECKPOINT_RADIUS`]
/// of `end`.
pub fn cut_off_epilog(track: &[Point], end: Point) -> Vec<Point> {
    if track.len() < 2 {
        return track.to_vec();
    }

    let offset_from_end = track
        .iter()
        .rev()
        .position(|p| {
            geo_distance(end.lat, end.lng, p.lat, p.lng)
                .map(|d| d < CHECKPOINT_RADIUS)
                .unwrap_or(false)
        })
        .unwrap_or(0);

    let keep = track.len() - offset_from_end;
    track[..keep].to_vec()
}

/// Remove every track point within [`CHECKPOINT_RADIUS`] of any checkpoint —
/// a rider lingering at a control shouldn't contribute a cluster of
/// near-duplicate points to the alignment. Uses `factor = 0.0` since stop
/// detection only cares about physical proximity, not along-route offset.
pub fn clear_stops(track: &[Point], checkpoints: &[Point]) -> Vec<Point> {
    track
        .iter()
        .filter(|p| {
            checkpoints.iter().all(|cp| {
                geo_distance(cp.lat, cp.lng, p.lat, p.lng)
                    .map(|d| d > CHECKPOINT_RADIUS)
                    .unwrap_or(true)
            })
        })
        .copied()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(lat: f64, lng: f64, t: f64, d: f64) -> Point {
        Point::new(lat, lng, t, d)
    }

    #[test]
    fn down_sample_mask_keeps_first_and_thins_dense_run() {
        let track: Vec<Point> = (0..10)
            .map(|i| p(55.0 + i as f64 * 0.0001, 37.0, i as f64, i as f64 * 10.0))
            .collect();
        let mask = down_sample_mask(&track, 200, 100.0);
        assert!(mask[0]);
        assert!(!mask.iter().all(|&k| k));
    }

    #[test]
    fn clear_stops_removes_points_near_checkpoint() {
        let checkpoint = p(55.0, 37.0, 0.0, 0.0);
        let track = vec![
            p(55.0, 37.0, 0.0, 0.0),
            p(55.0005, 37.0, 1.0, 50.0),
            p(56.0, 38.0, 2.0, 1_000_000.0),
        ];
        let cleared = clear_stops(&track, &[checkpoint]);
        assert_eq!(cleared.len(), 1);
        assert_eq!(cleared[0].lat, 56.0);
    }

    #[test]
    fn cut_off_prolog_rebases_distance() {
        let start = p(55.001, 37.0, 0.0, 0.0);
        let track = vec![
            p(54.0, 37.0, 0.0, 0.0),
            p(55.001, 37.0, 1.0, 500.0),
            p(55.002, 37.0, 2.0, 600.0),
        ];
        let trimmed = cut_off_prolog(&track, start);
        assert_eq!(trimmed.len(), 2);
        assert_eq!(trimmed[0].d, 0.0);
        assert_eq!(trimmed[1].d, 100.0);
    }

    #[test]
    fn cut_off_epilog_drops_tail_past_finish() {
        let end = p(55.002, 37.0, 2.0, 600.0);
        let track = vec![
            p(55.0, 37.0, 0.0, 0.0),
            p(55.002, 37.0, 2.0, 600.0),
            p(56.0, 38.0, 3.0, 900.0),
        ];
        let trimmed = cut_off_epilog(&track, end);
        assert_eq!(trimmed.len(), 2);
    }

    #[test]
    fn short_tracks_pass_through_trim_unchanged() {
        let track = vec![p(55.0, 37.0, 0.0, 0.0)];
        assert_eq!(cut_off_prolog(&track, track[0]), track);
        assert_eq!(cut_off_epilog(&track, track[0]), track);
    }
}
