//! Request/response DTOs for the `/align` HTTP surface.

use crate::align::{AlignmentConfig, CheckpointInput};
use serde::{Deserialize, Serialize};

/// One point of a raw GPS trace, as handed in by the HTTP caller.
#[derive(Debug, Clone, Deserialize)]
pub struct TrackPointInput {
    pub lat: f64,
    pub lng: f64,
    /// UNIX seconds.
    pub t: f64,
    /// Cumulative distance from the track's own start, meters.
    pub d: f64,
}

#[derive(Debug, Deserialize)]
pub struct AlignRequest {
    /// The route's already-simplified short track, as produced by
    /// `POST /route/short-tracks` or computed offline.
    pub short_route: Vec<TrackPointInput>,
    pub checkpoints: Vec<CheckpointInput>,
    pub track: Vec<TrackPointInput>,
    #[serde(default)]
    pub config: AlignmentConfig,
}

/// One checkpoint's visitation result. `lat`/`lng`/`t`/`d` are `null` when
/// the checkpoint was never matched in the track.
#[derive(Debug, Serialize)]
pub struct CheckpointResult {
    pub uid: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub t: Option<f64>,
    pub d: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct AlignResponse {
    pub checkpoints: Vec<CheckpointResult>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

/// Input to an offline route-building request: a route editor export plus
/// whatever free-text control markers it carries.
#[derive(Debug, Deserialize)]
pub struct RoutePlotRequest {
    pub points: Vec<crate::align::RoutePlotPoint>,
}

#[derive(Debug, Serialize)]
pub struct RoutePlotResponse {
    pub track_len: usize,
    pub short_track_len: usize,
    pub checkpoints: Vec<CheckpointResult>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn align_request_deserializes_with_default_config() {
        let json = r#"{
            "short_route": [{"lat": 55.0, "lng": 37.0, "t": 0.0, "d": 0.0}],
            "checkpoints": [{"lat": 55.0, "lng": 37.0, "distance_km": 0.0, "uid": "start"}],
            "track": []
        }"#;
        let request: AlignRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.short_route.len(), 1);
        assert!(!request.config.skip_trim);
    }
}
