use axum::extract::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use std::time::Instant;
use tracing::{error, info};

use crate::align::{self, AlignmentError, Point};
use crate::models::{
    AlignRequest, AlignResponse, CheckpointResult, ErrorResponse, RoutePlotRequest,
    RoutePlotResponse,
};

impl IntoResponse for AlignmentError {
    fn into_response(self) -> Response {
        let (status, error) = match &self {
            AlignmentError::MathDomain { .. } => (StatusCode::UNPROCESSABLE_ENTITY, "math_domain"),
            AlignmentError::NoTrack => (StatusCode::UNPROCESSABLE_ENTITY, "no_track"),
            AlignmentError::RouteDeviation { .. } => {
                (StatusCode::UNPROCESSABLE_ENTITY, "route_deviation")
            }
            AlignmentError::ControlDeviation { .. } => {
                (StatusCode::UNPROCESSABLE_ENTITY, "control_deviation")
            }
            AlignmentError::CheckpointMissing { .. } => {
                (StatusCode::UNPROCESSABLE_ENTITY, "checkpoint_missing")
            }
        };
        let body = ErrorResponse {
            error: error.to_string(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

fn to_point(p: &crate::models::TrackPointInput) -> Point {
    Point::new(p.lat, p.lng, p.t, p.d)
}

/// `POST /align` — match a raw GPS trace against a route and checkpoint
/// list. The alignment itself is CPU-bound (two Hirschberg passes over the
/// shaped track), so it runs on the blocking pool rather than tying up the
/// async runtime.
pub async fn align_track(
    Json(request): Json<AlignRequest>,
) -> Result<Json<AlignResponse>, AlignmentError> {
    info!(
        track_points = request.track.len(),
        short_route_points = request.short_route.len(),
        checkpoints = request.checkpoints.len(),
        "[align_track] called"
    );

    let short_route: Vec<Point> = request.short_route.iter().map(to_point).collect();
    let track: Vec<Point> = request.track.iter().map(to_point).collect();
    let (checkpoints, checkpoint_uids) = align::build_checkpoint_list(&request.checkpoints);

    let config = request.config;
    let started = Instant::now();
    let outcome = tokio::task::spawn_blocking(move || {
        align::align(&config, &short_route, &checkpoints, &checkpoint_uids, &track)
    })
    .await
    .map_err(|e| {
        error!(?e, "[align_track] blocking task panicked");
        AlignmentError::NoTrack
    })?;

    let elapsed = started.elapsed().as_secs_f64();
    match outcome {
        Ok(hits) => {
            crate::metrics::record_alignment_outcome("passed", elapsed);
            crate::metrics::set_checkpoints_matched(
                hits.iter().filter(|h| h.point.is_some()).count(),
            );
            info!(matched = hits.len(), "[align_track] alignment succeeded");
            let checkpoints = hits
                .into_iter()
                .map(|hit| match hit.point {
                    Some(p) => CheckpointResult {
                        uid: hit.uid,
                        lat: Some(p.lat),
                        lng: Some(p.lng),
                        t: Some(p.t),
                        d: Some(p.d),
                    },
                    None => CheckpointResult {
                        uid: hit.uid,
                        lat: None,
                        lng: None,
                        t: None,
                        d: None,
                    },
                })
                .collect();
            Ok(Json(AlignResponse { checkpoints }))
        }
        Err(err) => {
            crate::metrics::record_alignment_outcome(outcome_label(&err), elapsed);
            error!(?err, "[align_track] alignment rejected");
            Err(err)
        }
    }
}

fn outcome_label(err: &AlignmentError) -> &'static str {
    match err {
        AlignmentError::MathDomain { .. } => "math_domain",
        AlignmentError::NoTrack => "no_track",
        AlignmentError::RouteDeviation { .. } => "route_deviation",
        AlignmentError::ControlDeviation { .. } => "control_deviation",
        AlignmentError::CheckpointMissing { .. } => "checkpoint_missing",
    }
}

/// `POST /route/plot` — offline helper: builds the cumulative route, both
/// simplified short tracks, and the control list out of a raw route editor
/// export. Used by brevet-setup tooling, not the live alignment path.
pub async fn plot_route(
    Json(request): Json<RoutePlotRequest>,
) -> Result<Json<RoutePlotResponse>, StatusCode> {
    info!(points = request.points.len(), "[plot_route] called");
    if request.points.is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    let track = align::build_route(&request.points);
    let (_normal, short_track) = align::build_short_tracks(&track);
    let discovered = align::find_checkpoints(&request.points, &track);

    let checkpoints = discovered
        .into_iter()
        .enumerate()
        .map(|(i, cp)| CheckpointResult {
            uid: format!("{}-{}", i, cp.name),
            lat: Some(cp.lat),
            lng: Some(cp.lng),
            t: None,
            d: Some(cp.distance_km * 1000.0),
        })
        .collect();

    Ok(Json(RoutePlotResponse {
        track_len: track.len(),
        short_track_len: short_track.len(),
        checkpoints,
    }))
}

pub async fn healthz() -> &'static str {
    "ok"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alignment_error_maps_to_unprocessable_entity() {
        let err = AlignmentError::NoTrack;
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn healthz_reports_ok() {
        assert_eq!(healthz().await, "ok");
    }

    #[tokio::test]
    async fn plot_route_rejects_empty_input() {
        let request = Json(RoutePlotRequest { points: vec![] });
        let result = plot_route(request).await;
        assert_eq!(result.unwrap_err(), StatusCode::BAD_REQUEST);
    }
}
