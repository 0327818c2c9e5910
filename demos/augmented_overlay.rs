//! Shows the calibration photograph with the wireframe cuboid on top.
//!
//! Usage: `augmented_overlay [calibration.json] [photo.png]`
//!
//! Without a photo the checkerboard the calibration was taken of is
//! synthesized at the calibrated image size. Press F12 for a screenshot and
//! Escape to quit.

use camreg::{Calibration, FileImageSource, Options, OverlayScene, Result};

const DEFAULT_CALIBRATION: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/assets/calibration.json");

fn main() -> Result<()> {
    let mut args = std::env::args().skip(1);
    let calibration_path = args
        .next()
        .unwrap_or_else(|| DEFAULT_CALIBRATION.to_string());
    let calibration = Calibration::from_path(&calibration_path)?;
    let options = Options::default();

    let scene = match args.next() {
        Some(photo) => OverlayScene::from_calibration(
            &calibration,
            Box::new(FileImageSource::new(photo)),
            options,
        ),
        None => OverlayScene::checkerboard(&calibration, options)?,
    };

    camreg::run_app(scene)
}
