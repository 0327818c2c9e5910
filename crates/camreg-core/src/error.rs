//! Error types for camreg.

use thiserror::Error;

/// The main error type for camreg operations.
#[derive(Error, Debug)]
pub enum CamregError {
    /// Focal lengths must be finite and positive, principal point finite.
    #[error("invalid intrinsics: {0}")]
    InvalidIntrinsics(String),

    /// The pose rotation is not a proper rotation matrix.
    #[error("invalid rotation: {0}")]
    InvalidRotation(String),

    /// Image dimensions or pixel data are unusable.
    #[error("invalid image: {0}")]
    InvalidImage(String),

    /// Overlay mesh is malformed.
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    /// An overlay vertex is on or behind the camera plane.
    #[error("overlay vertex at camera depth {depth} is not in front of the camera")]
    BehindCamera { depth: f32 },

    /// Overlay vertices fall outside the depth range mapped onto the depth
    /// buffer, so the rasterizer would clip them.
    #[error("overlay depths {nearest}..{farthest} outside depth range {near}..{far}")]
    OutsideDepthRange {
        nearest: f32,
        farthest: f32,
        near: f32,
        far: f32,
    },

    /// Calibration file content is unusable.
    #[error("invalid calibration: {0}")]
    InvalidCalibration(String),

    /// Data size mismatch.
    #[error("data size mismatch: expected {expected}, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    /// Failed to decode an image file.
    #[error("image load error: {0}")]
    ImageLoad(#[from] image::ImageError),

    /// I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// A specialized Result type for camreg operations.
pub type Result<T> = std::result::Result<T, CamregError>;
