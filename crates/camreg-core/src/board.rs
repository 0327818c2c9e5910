//! Procedural checkerboard calibration target.
//!
//! Renders what a calibrated camera would see of a flat checkerboard lying
//! on the board plane (`z = 0`). Useful when no photograph is at hand and as
//! ground truth in tests, since the squares land exactly where the
//! calibration projects them.

use glam::{Mat3, Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::error::{CamregError, Result};
use crate::gray_image::{GrayImage, ImageSource, RowOrder};
use crate::intrinsics::CameraIntrinsics;
use crate::pose::CameraPose;

/// Gray level of dark squares.
pub const DARK: u8 = 24;
/// Gray level of light squares and the quiet zone around the board.
pub const LIGHT: u8 = 232;
/// Gray level of everything off the board.
pub const SURROUND: u8 = 128;

/// Checkerboard dimensions in squares and board units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoardLayout {
    /// Number of squares along x.
    pub cols: u32,
    /// Number of squares along y.
    pub rows: u32,
    /// Edge length of one square.
    pub square_size: f32,
}

impl BoardLayout {
    /// Creates a board layout.
    #[must_use]
    pub fn new(cols: u32, rows: u32, square_size: f32) -> Self {
        Self {
            cols,
            rows,
            square_size,
        }
    }

    /// Checks for a non-empty board with a positive square size.
    pub fn validate(&self) -> Result<()> {
        if self.cols == 0 || self.rows == 0 {
            return Err(CamregError::InvalidCalibration(format!(
                "board must have at least one square, got {}x{}",
                self.cols, self.rows
            )));
        }
        if !(self.square_size.is_finite() && self.square_size > 0.0) {
            return Err(CamregError::InvalidCalibration(format!(
                "square size must be positive, got {}",
                self.square_size
            )));
        }
        Ok(())
    }

    /// Returns the board extent along x and y.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn extent(&self) -> Vec2 {
        Vec2::new(self.cols as f32, self.rows as f32) * self.square_size
    }

    /// Returns the gray level at a board-plane point.
    ///
    /// Squares alternate starting with a dark one at the origin. A quiet
    /// zone one square wide surrounds the pattern.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn shade(&self, point: Vec2) -> u8 {
        let cell = (point / self.square_size).floor();
        let (i, j) = (cell.x as i64, cell.y as i64);
        let (cols, rows) = (i64::from(self.cols), i64::from(self.rows));
        if (0..cols).contains(&i) && (0..rows).contains(&j) {
            if (i + j) % 2 == 0 {
                DARK
            } else {
                LIGHT
            }
        } else if (-1..=cols).contains(&i) && (-1..=rows).contains(&j) {
            LIGHT
        } else {
            SURROUND
        }
    }
}

impl Default for BoardLayout {
    fn default() -> Self {
        Self {
            cols: 9,
            rows: 6,
            square_size: 25.0,
        }
    }
}

/// Synthesizes the photograph of a checkerboard seen by a calibrated camera.
#[derive(Debug, Clone, Copy)]
pub struct CheckerboardSource {
    layout: BoardLayout,
    intrinsics: CameraIntrinsics,
    pose: CameraPose,
    width: u32,
    height: u32,
}

impl CheckerboardSource {
    /// Creates a source producing `width` x `height` images.
    #[must_use]
    pub fn new(
        layout: BoardLayout,
        intrinsics: CameraIntrinsics,
        pose: CameraPose,
        width: u32,
        height: u32,
    ) -> Self {
        Self {
            layout,
            intrinsics,
            pose,
            width,
            height,
        }
    }

    /// Returns the board layout.
    #[must_use]
    pub fn layout(&self) -> BoardLayout {
        self.layout
    }

    /// Homography from board-plane coordinates to pixels: `K [r1 r2 t]`.
    fn board_to_pixel(&self) -> Mat3 {
        let k = self.intrinsics.matrix3();
        let r = self.pose.rotation;
        Mat3::from_cols(k * r.x_axis, k * r.y_axis, k * self.pose.translation)
    }
}

impl ImageSource for CheckerboardSource {
    #[allow(clippy::cast_precision_loss)]
    fn load(&self) -> Result<GrayImage> {
        self.layout.validate()?;
        self.intrinsics.validate()?;
        self.pose.validate()?;

        let homography = self.board_to_pixel();
        if homography.determinant().abs() < f32::EPSILON {
            return Err(CamregError::InvalidCalibration(
                "board plane is seen edge-on".into(),
            ));
        }
        let pixel_to_board = homography.inverse();

        let mut pixels = Vec::with_capacity(self.width as usize * self.height as usize);
        for y in 0..self.height {
            for x in 0..self.width {
                let h = pixel_to_board * Vec3::new(x as f32 + 0.5, y as f32 + 0.5, 1.0);
                // h.z is the inverse camera depth of the plane hit.
                let shade = if h.z > 0.0 {
                    self.layout.shade(Vec2::new(h.x / h.z, h.y / h.z))
                } else {
                    SURROUND
                };
                pixels.push(shade);
            }
        }
        log::debug!(
            "synthesized {}x{} checkerboard ({}x{} squares of {})",
            self.width,
            self.height,
            self.layout.cols,
            self.layout.rows,
            self.layout.square_size
        );
        GrayImage::new(self.width, self.height, pixels, RowOrder::TopToBottom)
    }

    fn describe(&self) -> String {
        format!(
            "synthetic {}x{} checkerboard",
            self.layout.cols, self.layout.rows
        )
    }
}
