//! Canonical constants for the alignment engine.
//!
//! Every numeric threshold the engine depends on lives here so there is a
//! single place to change if a test ever needs a different value. Do not
//! change these without updating the corresponding tests.

/// Mean earth radius used by the geodesic kernel, in meters.
pub const EARTH_RADIUS: f64 = 6_371_000.0;

/// Multiplier applied to the along-route distance shift in the geodesic
/// kernel's cost function (1 km of offset along the route costs as much as
/// 1 m of lateral offset).
pub const DISTANCE_FACTOR: f64 = 0.001;

/// Penalty substituted for a `NaN` pairwise distance when summing
/// `track_to_track`, and the default deletion cost for the aligner.
pub const MAX_POINT_DISTANCE: f64 = 3000.0;

/// Radius around a checkpoint within which track points are considered a
/// stop and removed, in meters.
pub const CHECKPOINT_RADIUS: f64 = 100.0;

/// Minimum spacing enforced between retained points by the down-sampler,
/// in meters.
pub const DOWN_SAMPLE_INTERVAL: f64 = 100.0;

/// Initial look-ahead window for the down-sampler, in points.
pub const LOOKUP_AHEAD_POINTS: usize = 200;

/// Default RDP epsilon (degrees) for the "normal" route simplification.
pub const ROUTE_SIMPLIFY_FACTOR: f64 = 0.001;

/// Distance beyond the last recognized control after which a synthetic
/// "End" checkpoint is appended, in meters.
pub const EPILOG_MAX_LENGTH: f64 = 500.0;

/// Default route-deviation acceptance threshold, meters per matched point.
pub const TRACK_DEVIATION_MAX: f64 = 200.0;

/// Default route-deviation recheck threshold (factor=0 recomputation),
/// meters per matched point.
pub const TRACK_DEVIATION_MIN: f64 = 200.0;

/// Default control-deviation acceptance threshold, meters per checkpoint.
pub const CONTROL_DEVIATION_FACTOR: f64 = 500.0;
