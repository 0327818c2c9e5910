//! Just the photograph, drawn through the same compositor as the overlay.

use camreg::{Calibration, CompositePolicy, Options, OverlayScene, Result};

const DEFAULT_CALIBRATION: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/assets/calibration.json");

fn main() -> Result<()> {
    let calibration = Calibration::from_path(DEFAULT_CALIBRATION)?;
    let options = Options {
        window_title: "camreg - background".to_string(),
        ..Options::default()
    };
    let scene = OverlayScene::checkerboard(&calibration, options)?
        .with_policy(CompositePolicy::background_only());
    camreg::run_app(scene)
}
