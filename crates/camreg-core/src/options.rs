//! Configuration options for the overlay viewer.

use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::geometry::{Cuboid, CuboidOverlay, EdgeColors, FaceColors, OverlayStyle};
use crate::projection::DepthRange;

/// Viewer configuration. Missing JSON fields fall back to their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Window title.
    pub window_title: String,

    /// Initial window size. `None` uses the background image size.
    pub window_size: Option<(u32, u32)>,

    /// Clear color behind the background layer.
    pub clear_color: Vec3,

    /// Camera depth interval mapped onto the depth buffer.
    pub depth_range: DepthRange,

    /// Wireframe or solid cuboid.
    pub overlay_style: OverlayStyle,

    /// Cuboid placement on the board.
    pub cuboid: Cuboid,

    /// Wireframe edge colors.
    pub edge_colors: EdgeColors,

    /// Solid face colors.
    pub face_colors: FaceColors,

    /// Rescale intrinsics when the framebuffer differs from the calibrated
    /// image size.
    pub rescale_intrinsics: bool,

    /// Present with vsync.
    pub vsync: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            window_title: "camreg".to_string(),
            window_size: None,
            clear_color: Vec3::new(0.1, 0.1, 0.1),
            depth_range: DepthRange::default(),
            overlay_style: OverlayStyle::default(),
            cuboid: Cuboid::default(),
            edge_colors: EdgeColors::default(),
            face_colors: FaceColors::default(),
            rescale_intrinsics: true,
            vsync: true,
        }
    }
}

impl Options {
    /// Parses options from JSON text.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads options from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Writes options as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Returns the configured cuboid overlay.
    #[must_use]
    pub fn overlay(&self) -> CuboidOverlay {
        CuboidOverlay {
            cuboid: self.cuboid,
            style: self.overlay_style,
            edge_colors: self.edge_colors,
            face_colors: self.face_colors,
        }
    }
}
