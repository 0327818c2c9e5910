//! Translucent solid cuboid: faces toward the camera in one color, faces
//! away in another.
//!
//! Usage: `solid_overlay [options.json]`

use camreg::{Calibration, Options, OverlayScene, OverlayStyle, Result};

const DEFAULT_CALIBRATION: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/assets/calibration.json");

fn main() -> Result<()> {
    let mut options = match std::env::args().nth(1) {
        Some(path) => Options::from_path(path)?,
        None => Options::default(),
    };
    options.overlay_style = OverlayStyle::Solid;
    options.window_title = "camreg - solid overlay".to_string();

    let calibration = Calibration::from_path(DEFAULT_CALIBRATION)?;
    let scene = OverlayScene::checkerboard(&calibration, options)?;
    camreg::run_app(scene)
}
