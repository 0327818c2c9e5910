//! Per-frame rendering for the windowed viewer.

use super::App;
use camreg_render::save_image;

impl App {
    /// Renders and presents one frame, then services a pending screenshot.
    pub(super) fn render(&mut self) {
        let (Some(engine), Some(prepared)) = (&mut self.engine, &self.prepared) else {
            return;
        };
        let Some(surface) = engine.surface.as_ref() else {
            return;
        };

        let output = match surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                engine.resize(engine.width, engine.height);
                return;
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("Out of memory");
                self.close_requested = true;
                return;
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::warn!("Surface timeout");
                return;
            }
            Err(wgpu::SurfaceError::Other) => {
                log::warn!("Surface error: other");
                return;
            }
        };

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let matrices = self.scene.frame_matrices(engine.frame_info());
        let commands = engine.encode_frame(
            &view,
            self.scene.clear_color(),
            prepared.layers(),
            self.scene.compositor(),
            &matrices,
        );
        match commands {
            Ok(commands) => {
                engine.queue.submit(std::iter::once(commands));
                output.present();
            }
            Err(e) => {
                self.fail(e);
                return;
            }
        }

        if let Some(filename) = self.screenshot_pending.take() {
            self.capture_screenshot(&filename);
        }
    }

    /// Renders the current view offscreen and writes it to `filename`.
    fn capture_screenshot(&self, filename: &str) {
        let (Some(engine), Some(prepared)) = (&self.engine, &self.prepared) else {
            return;
        };

        let target = engine.create_capture_target();
        let matrices = self.scene.frame_matrices(engine.frame_info());
        let commands = match engine.encode_frame(
            target.view(),
            self.scene.clear_color(),
            prepared.layers(),
            self.scene.compositor(),
            &matrices,
        ) {
            Ok(commands) => commands,
            Err(e) => {
                log::error!("Failed to capture screenshot: {e}");
                return;
            }
        };
        engine.queue.submit(std::iter::once(commands));

        let (width, height) = target.dimensions();
        let result = engine
            .read_capture(&target)
            .and_then(|pixels| save_image(filename, &pixels, width, height));
        if let Err(e) = result {
            log::error!("Failed to save screenshot to {filename}: {e}");
        }
    }
}
