// seascan_core/src/error.rs

use thiserror::Error;

/// Setup-time and frame-validation failures of the sonar pipeline.
///
/// Per-point anomalies (NaN coordinates, out-of-coverage ranges) are never
/// errors; they are silently excluded during binning so a few bad points
/// cannot abort a tick.
#[derive(Debug, Error)]
pub enum SonarError {
    #[error("unknown normalizing method '{0}' (expected \"all\" or \"range\")")]
    UnknownNormalizingMethod(String),

    #[error("invalid range window: min_range {min} must lie below max_range {max}")]
    InvalidRangeWindow { min: f32, max: f32 },

    #[error("min_range must be positive so degenerate points (range 0) fall below coverage, got {0}")]
    NonPositiveMinRange(f32),

    #[error("range resolution must be positive and finite, got {0}")]
    InvalidRangeResolution(f32),

    #[error("range window is narrower than a single bin")]
    EmptyGrid,

    #[error("waterfall height must be at least 1")]
    InvalidWaterfallHeight,

    #[error("noise parameter must be finite and non-negative, got {0}")]
    InvalidNoiseParameter(f32),

    #[error(
        "scan frame arrays disagree in length: {positions} positions, \
         {normals} normals, {semantics} semantic ids"
    )]
    MismatchedFrame {
        positions: usize,
        normals: usize,
        semantics: usize,
    },

    #[error("failed to build compute thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}
