//! Calibration files: intrinsics, extrinsics and the target they were
//! estimated from.
//!
//! The JSON layout matches what common calibration toolchains write out:
//!
//! ```json
//! {
//!   "camera_matrix": [[536.46, 0, 342.37], [0, 536.41, 235.55], [0, 0, 1]],
//!   "rvec": [-0.43, 0.21, 0.06],
//!   "tvec": [-65.0, -40.0, 450.0],
//!   "image_size": [640, 480],
//!   "board": { "cols": 9, "rows": 6, "square_size": 25.0 }
//! }
//! ```
//!
//! A row-major `"rotation"` matrix may be given instead of `"rvec"`.

use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::board::BoardLayout;
use crate::error::{CamregError, Result};
use crate::intrinsics::CameraIntrinsics;
use crate::pose::CameraPose;
use crate::projection::{DepthRange, ProjectionBuilder};

#[derive(Debug, Serialize, Deserialize)]
struct CalibrationFile {
    camera_matrix: [[f32; 3]; 3],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    rvec: Option<[f32; 3]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    rotation: Option<[[f32; 3]; 3]>,
    tvec: [f32; 3],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    image_size: Option<[u32; 2]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    board: Option<BoardLayout>,
}

/// A single-view camera calibration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Calibration {
    /// Pinhole intrinsics.
    pub intrinsics: CameraIntrinsics,
    /// Board-to-camera pose.
    pub pose: CameraPose,
    /// Size of the image the intrinsics were estimated at.
    pub image_size: Option<(u32, u32)>,
    /// Calibration target, when known.
    pub board: Option<BoardLayout>,
}

impl Calibration {
    /// Creates a calibration without image size or board information.
    #[must_use]
    pub fn new(intrinsics: CameraIntrinsics, pose: CameraPose) -> Self {
        Self {
            intrinsics,
            pose,
            image_size: None,
            board: None,
        }
    }

    /// Parses and validates a calibration from JSON text.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let file: CalibrationFile = serde_json::from_str(json)?;
        let pose = match (file.rvec, file.rotation) {
            (Some(_), Some(_)) => {
                return Err(CamregError::InvalidCalibration(
                    "give either rvec or rotation, not both".into(),
                ))
            }
            (Some(rvec), None) => {
                CameraPose::from_rodrigues(Vec3::from_array(rvec), Vec3::from_array(file.tvec))
            }
            (None, Some(rows)) => CameraPose::from_rows(rows, file.tvec),
            (None, None) => {
                return Err(CamregError::InvalidCalibration(
                    "missing rvec or rotation".into(),
                ))
            }
        };
        let calibration = Self {
            intrinsics: CameraIntrinsics::from_rows(file.camera_matrix)?,
            pose,
            image_size: file.image_size.map(|[w, h]| (w, h)),
            board: file.board,
        };
        calibration.validate()?;
        Ok(calibration)
    }

    /// Reads and validates a calibration file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let calibration = Self::from_json_str(&json)?;
        log::info!("loaded calibration from {}", path.display());
        Ok(calibration)
    }

    /// Serializes the calibration, writing the rotation as a Rodrigues vector.
    pub fn to_json_string(&self) -> Result<String> {
        let k = self.intrinsics;
        let file = CalibrationFile {
            camera_matrix: [[k.fx, 0.0, k.cx], [0.0, k.fy, k.cy], [0.0, 0.0, 1.0]],
            rvec: Some(self.pose.rodrigues().to_array()),
            rotation: None,
            tvec: self.pose.translation.to_array(),
            image_size: self.image_size.map(|(w, h)| [w, h]),
            board: self.board,
        };
        Ok(serde_json::to_string_pretty(&file)?)
    }

    /// Checks intrinsics, rotation, image size and board.
    pub fn validate(&self) -> Result<()> {
        self.intrinsics.validate()?;
        self.pose.validate()?;
        if let Some((w, h)) = self.image_size {
            if w == 0 || h == 0 {
                return Err(CamregError::InvalidCalibration(format!(
                    "image size must be positive, got {w}x{h}"
                )));
            }
        }
        if let Some(board) = &self.board {
            board.validate()?;
        }
        Ok(())
    }

    /// Returns a projection builder for this calibration.
    ///
    /// With `rescale` set and a known image size, frames of another size use
    /// intrinsics rescaled to the framebuffer.
    #[must_use]
    pub fn projection(&self, depth_range: DepthRange, rescale: bool) -> ProjectionBuilder {
        let builder =
            ProjectionBuilder::new(self.intrinsics, self.pose).with_depth_range(depth_range);
        match self.image_size {
            Some((w, h)) if rescale => builder.with_reference_size(w, h),
            _ => builder,
        }
    }
}
