//! Pinhole camera intrinsics.

use glam::{Mat3, Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::error::{CamregError, Result};

/// Largest deviation from an exact zero or one accepted in a camera matrix.
const MATRIX_TOLERANCE: f32 = 1e-6;

/// Intrinsic parameters of a calibrated pinhole camera, in pixels.
///
/// Corresponds to the classical 3x3 camera matrix
/// ```text
/// [[fx,  0, cx],
///  [ 0, fy, cy],
///  [ 0,  0,  1]]
/// ```
/// with image coordinates growing right (x) and down (y).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraIntrinsics {
    /// Horizontal focal length.
    pub fx: f32,
    /// Vertical focal length.
    pub fy: f32,
    /// Horizontal component of the principal point.
    pub cx: f32,
    /// Vertical component of the principal point.
    pub cy: f32,
}

impl CameraIntrinsics {
    /// Creates new camera intrinsics. Values are taken as-is; see [`Self::validate`].
    #[must_use]
    pub fn new(fx: f32, fy: f32, cx: f32, cy: f32) -> Self {
        Self { fx, fy, cx, cy }
    }

    /// Creates intrinsics from a row-major 3x3 camera matrix.
    ///
    /// The matrix must have zero skew and `[0, 0, 1]` as its last row. Any
    /// other entry has no place in the four-parameter model and is rejected
    /// rather than dropped.
    pub fn from_rows(rows: [[f32; 3]; 3]) -> Result<Self> {
        let (skew, skew_below, last) = (rows[0][1], rows[1][0], rows[2]);
        if skew.abs() > MATRIX_TOLERANCE || skew_below.abs() > MATRIX_TOLERANCE {
            return Err(CamregError::InvalidIntrinsics(format!(
                "camera matrix has skew {skew} (row 0) and {skew_below} (row 1), expected 0"
            )));
        }
        let expected = [0.0, 0.0, 1.0];
        if last
            .iter()
            .zip(expected)
            .any(|(got, want)| (got - want).abs() > MATRIX_TOLERANCE)
        {
            return Err(CamregError::InvalidIntrinsics(format!(
                "camera matrix last row must be [0, 0, 1], got {last:?}"
            )));
        }
        Ok(Self {
            fx: rows[0][0],
            fy: rows[1][1],
            cx: rows[0][2],
            cy: rows[1][2],
        })
    }

    /// Checks fx, fy > 0 and that every parameter is finite.
    pub fn validate(&self) -> Result<()> {
        if !(self.fx.is_finite() && self.fy.is_finite()) || self.fx <= 0.0 || self.fy <= 0.0 {
            return Err(CamregError::InvalidIntrinsics(format!(
                "focal lengths must be finite and positive, got fx={} fy={}",
                self.fx, self.fy
            )));
        }
        if !(self.cx.is_finite() && self.cy.is_finite()) {
            return Err(CamregError::InvalidIntrinsics(format!(
                "principal point must be finite, got cx={} cy={}",
                self.cx, self.cy
            )));
        }
        Ok(())
    }

    /// Returns the intrinsics of the same camera seen through an image
    /// resized by `(sx, sy)`.
    #[must_use]
    pub fn scaled(&self, sx: f32, sy: f32) -> Self {
        Self {
            fx: self.fx * sx,
            fy: self.fy * sy,
            cx: self.cx * sx,
            cy: self.cy * sy,
        }
    }

    /// Returns the principal point.
    #[must_use]
    pub fn principal_point(&self) -> Vec2 {
        Vec2::new(self.cx, self.cy)
    }

    /// Returns the classical 3x3 camera matrix.
    #[must_use]
    pub fn matrix3(&self) -> Mat3 {
        Mat3::from_cols(
            Vec3::new(self.fx, 0.0, 0.0),
            Vec3::new(0.0, self.fy, 0.0),
            Vec3::new(self.cx, self.cy, 1.0),
        )
    }

    /// Projects a camera-space point to pixel coordinates.
    ///
    /// The point must lie in front of the camera (`z > 0`).
    #[must_use]
    pub fn project(&self, point_camera: Vec3) -> Vec2 {
        Vec2::new(
            self.fx * point_camera.x / point_camera.z + self.cx,
            self.fy * point_camera.y / point_camera.z + self.cy,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rejects_non_positive_focal_length() {
        assert!(CameraIntrinsics::new(500.0, 500.0, 320.0, 240.0)
            .validate()
            .is_ok());
        assert!(CameraIntrinsics::new(0.0, 500.0, 320.0, 240.0)
            .validate()
            .is_err());
        assert!(CameraIntrinsics::new(500.0, -1.0, 320.0, 240.0)
            .validate()
            .is_err());
        assert!(CameraIntrinsics::new(f32::NAN, 500.0, 320.0, 240.0)
            .validate()
            .is_err());
        assert!(CameraIntrinsics::new(500.0, 500.0, f32::INFINITY, 240.0)
            .validate()
            .is_err());
    }

    #[test]
    fn test_from_rows_matches_matrix3() {
        let k = CameraIntrinsics::from_rows([
            [536.46, 0.0, 342.37],
            [0.0, 536.41, 235.55],
            [0.0, 0.0, 1.0],
        ])
        .unwrap();
        assert_eq!(k.fx, 536.46);
        assert_eq!(k.cy, 235.55);
        let m = k.matrix3();
        // glam is column-major: col(2) holds the principal point.
        assert_eq!(m.col(2), Vec3::new(342.37, 235.55, 1.0));
        assert_eq!(m.row(0), Vec3::new(536.46, 0.0, 342.37));
    }

    #[test]
    fn test_from_rows_rejects_skew_and_bad_last_row() {
        let skewed = [[500.0, 2.5, 320.0], [0.0, 500.0, 240.0], [0.0, 0.0, 1.0]];
        assert!(matches!(
            CameraIntrinsics::from_rows(skewed),
            Err(CamregError::InvalidIntrinsics(msg)) if msg.contains("skew")
        ));

        let projective = [[500.0, 0.0, 320.0], [0.0, 500.0, 240.0], [0.0, 0.01, 1.0]];
        assert!(matches!(
            CameraIntrinsics::from_rows(projective),
            Err(CamregError::InvalidIntrinsics(msg)) if msg.contains("last row")
        ));

        let scaled = [[500.0, 0.0, 320.0], [0.0, 500.0, 240.0], [0.0, 0.0, 2.0]];
        assert!(CameraIntrinsics::from_rows(scaled).is_err());
    }

    #[test]
    fn test_scaled_halves_pixels() {
        let k = CameraIntrinsics::new(500.0, 400.0, 320.0, 240.0);
        let half = k.scaled(0.5, 0.5);
        let p = Vec3::new(0.3, -0.2, 2.0);
        let full = k.project(p);
        let small = half.project(p);
        assert!((small * 2.0 - full).length() < 1e-4);
    }

    #[test]
    fn test_project_principal_ray() {
        let k = CameraIntrinsics::new(500.0, 500.0, 320.0, 240.0);
        assert_eq!(k.project(Vec3::new(0.0, 0.0, 7.0)), k.principal_point());
    }
}
