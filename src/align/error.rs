//! Error kinds surfaced by the alignment engine.

/// Errors the core can raise. `MathDomain` is always caught locally (the
/// route builder skips the offending point); every other variant propagates
/// out of [`crate::align::orchestrator::align`] to the caller.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum AlignmentError {
    #[error("math domain error for ({lat1}, {lng1}) vs ({lat2}, {lng2})")]
    MathDomain {
        lat1: f64,
        lng1: f64,
        lat2: f64,
        lng2: f64,
    },

    #[error("no usable track points after shaping")]
    NoTrack,

    #[error("route deviation {actual} exceeds threshold {threshold}")]
    RouteDeviation { actual: f64, threshold: f64 },

    #[error("control deviation {actual} exceeds threshold {threshold}")]
    ControlDeviation { actual: f64, threshold: f64 },

    #[error("only {found} of {required} checkpoints matched")]
    CheckpointMissing { found: usize, required: usize },
}
