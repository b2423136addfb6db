use crate::calibration::CalibrationError;

/// Per-frame failures. None of them leave a partially updated [`crate::RoverState`].
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum PerceptionError {
    #[error("invalid RGB buffer length (expected {expected} bytes, got {got})")]
    InvalidRgbBuffer { expected: usize, got: usize },

    #[error("{what} is {got_w}x{got_h}, expected {expected_w}x{expected_h}")]
    ShapeMismatch {
        what: &'static str,
        expected_w: usize,
        expected_h: usize,
        got_w: usize,
        got_h: usize,
    },

    #[error("world map is {got}x{got}, expected {expected}x{expected}")]
    WorldSizeMismatch { expected: usize, got: usize },

    #[error(transparent)]
    Calibration(#[from] CalibrationError),
}
