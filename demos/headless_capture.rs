//! Renders the background, overlay and augmented views to PNG files
//! without opening a window.
//!
//! Usage: `headless_capture [output_dir]`

use std::path::PathBuf;

use camreg::{
    Calibration, CamregError, CompositePolicy, Options, OverlayScene, OverlayStyle, Result,
};

const DEFAULT_CALIBRATION: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/assets/calibration.json");

fn main() -> Result<()> {
    env_logger::init();

    let out_dir = PathBuf::from(std::env::args().nth(1).unwrap_or_else(|| ".".to_string()));
    std::fs::create_dir_all(&out_dir).map_err(CamregError::from)?;

    let calibration = Calibration::from_path(DEFAULT_CALIBRATION)?;
    let (width, height) = calibration.image_size.unwrap_or(camreg::DEFAULT_IMAGE_SIZE);

    let background = CompositePolicy::background_only();
    let augmented = CompositePolicy::augmented();
    let overlay = CompositePolicy::overlay_only();
    let variants = [
        ("background.png", OverlayStyle::Wireframe, background),
        ("wireframe.png", OverlayStyle::Wireframe, augmented),
        ("solid.png", OverlayStyle::Solid, augmented),
        ("overlay_only.png", OverlayStyle::Solid, overlay),
    ];

    for (name, style, policy) in variants {
        let options = Options {
            overlay_style: style,
            ..Options::default()
        };
        let scene = OverlayScene::checkerboard(&calibration, options)?.with_policy(policy);
        let path = out_dir.join(name);
        camreg::render_to_file(&scene, &path.to_string_lossy(), width, height)?;
        println!("wrote {}", path.display());
    }

    Ok(())
}
