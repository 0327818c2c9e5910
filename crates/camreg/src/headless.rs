//! Headless rendering.
//!
//! Renders a scene to an image buffer or file without opening a window.
//! Useful for integration tests, batch processing and regression images.

use camreg_render::RenderEngine;
use pollster::FutureExt;

use crate::error::Result;
use crate::scene::OverlayScene;

/// Renders one frame of `scene` to a file.
///
/// The format follows the extension (`.png`, `.jpg` or `.jpeg`).
///
/// # Example
/// ```no_run
/// use camreg::*;
///
/// let calibration = Calibration::from_path("calibration.json").unwrap();
/// let scene = OverlayScene::checkerboard(&calibration, Options::default()).unwrap();
/// render_to_file(&scene, "overlay.png", 640, 480).unwrap();
/// ```
pub fn render_to_file(
    scene: &OverlayScene,
    filename: &str,
    width: u32,
    height: u32,
) -> Result<()> {
    let data = render_to_image(scene, width, height)?;
    camreg_render::save_image(filename, &data, width, height)?;
    Ok(())
}

/// Renders one frame of `scene` to a raw RGBA pixel buffer.
///
/// The buffer holds `width * height * 4` bytes, top row first.
pub fn render_to_image(scene: &OverlayScene, width: u32, height: u32) -> Result<Vec<u8>> {
    let engine = RenderEngine::new_headless(width, height).block_on()?;
    let prepared = scene.prepare(&engine)?;

    let target = engine.create_capture_target();
    let matrices = scene.frame_matrices(engine.frame_info());
    let commands = engine.encode_frame(
        target.view(),
        scene.clear_color(),
        prepared.layers(),
        scene.compositor(),
        &matrices,
    )?;
    engine.queue.submit(std::iter::once(commands));

    Ok(engine.read_capture(&target)?)
}
