//! Camera extrinsics: the rigid transform from board space into camera space.

use glam::{Mat3, Mat4, Vec3};

use crate::error::{CamregError, Result};
use crate::projection::build_pose_matrix;

/// Tolerance used by [`CameraPose::validate`] for orthonormality and determinant.
pub const ROTATION_TOLERANCE: f32 = 1e-4;

/// Camera extrinsics (board-to-camera rotation and translation).
///
/// A board-space point `p` maps to camera space as `rotation * p + translation`,
/// with the camera looking down `+Z`, `+X` to the right and `+Y` down.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPose {
    /// Rotation from board to camera coordinates.
    pub rotation: Mat3,
    /// Translation from board to camera coordinates.
    pub translation: Vec3,
}

impl CameraPose {
    /// Creates a new pose. The rotation is trusted; see [`Self::validate`].
    #[must_use]
    pub fn new(rotation: Mat3, translation: Vec3) -> Self {
        Self {
            rotation,
            translation,
        }
    }

    /// The identity pose: board space coincides with camera space.
    #[must_use]
    pub fn identity() -> Self {
        Self {
            rotation: Mat3::IDENTITY,
            translation: Vec3::ZERO,
        }
    }

    /// Creates a pose from a Rodrigues rotation vector and a translation.
    ///
    /// The rotation vector's direction is the rotation axis and its length
    /// the angle in radians.
    #[must_use]
    pub fn from_rodrigues(rvec: Vec3, tvec: Vec3) -> Self {
        let angle = rvec.length();
        let rotation = if angle < f32::EPSILON {
            Mat3::IDENTITY
        } else {
            Mat3::from_axis_angle(rvec / angle, angle)
        };
        Self::new(rotation, tvec)
    }

    /// Creates a pose from a row-major 3x3 rotation and a translation.
    #[must_use]
    pub fn from_rows(rotation: [[f32; 3]; 3], translation: [f32; 3]) -> Self {
        Self::new(
            Mat3::from_cols_array_2d(&rotation).transpose(),
            Vec3::from_array(translation),
        )
    }

    /// Returns the rotation as a Rodrigues vector.
    #[must_use]
    pub fn rodrigues(&self) -> Vec3 {
        let (axis, angle) = glam::Quat::from_mat3(&self.rotation).to_axis_angle();
        axis * angle
    }

    /// Transforms a board-space point into camera space.
    #[must_use]
    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        self.rotation * point + self.translation
    }

    /// Returns the 4x4 rigid transform (see [`build_pose_matrix`]).
    #[must_use]
    pub fn matrix(&self) -> Mat4 {
        build_pose_matrix(self.rotation, self.translation)
    }

    /// Checks that the rotation is orthonormal with determinant +1 and that
    /// every component is finite.
    pub fn validate(&self) -> Result<()> {
        let r = self.rotation;
        if !(r.is_finite() && self.translation.is_finite()) {
            return Err(CamregError::InvalidRotation(
                "pose contains non-finite values".into(),
            ));
        }
        let gram = r.transpose() * r;
        let deviation = (gram - Mat3::IDENTITY)
            .to_cols_array()
            .iter()
            .fold(0.0f32, |acc, v| acc.max(v.abs()));
        if deviation > ROTATION_TOLERANCE {
            return Err(CamregError::InvalidRotation(format!(
                "rotation is not orthonormal (max deviation {deviation:e})"
            )));
        }
        let det = r.determinant();
        if (det - 1.0).abs() > ROTATION_TOLERANCE {
            return Err(CamregError::InvalidRotation(format!(
                "rotation determinant is {det}, expected +1"
            )));
        }
        Ok(())
    }
}

impl Default for CameraPose {
    fn default() -> Self {
        Self::identity()
    }
}
