//! Window event handling.

use super::{
    ActiveEventLoop, App, ApplicationHandler, Arc, ElementState, FutureExt, KeyCode, LogicalSize,
    PhysicalKey, RenderEngine, Window, WindowEvent, WindowId,
};

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let (width, height) = match self.scene.preferred_size() {
            Ok(size) => size,
            Err(e) => {
                self.fail(e);
                event_loop.exit();
                return;
            }
        };

        let window_attributes = Window::default_attributes()
            .with_title(self.scene.options().window_title.clone())
            .with_inner_size(LogicalSize::new(width, height));

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                self.fail(e);
                event_loop.exit();
                return;
            }
        };

        let request = RenderEngine::new_windowed(window.clone(), self.scene.options().vsync);
        let engine = match request.block_on() {
            Ok(engine) => engine,
            Err(e) => {
                self.fail(e);
                event_loop.exit();
                return;
            }
        };

        match self.scene.prepare(&engine) {
            Ok(prepared) => self.prepared = Some(prepared),
            Err(e) => {
                self.fail(e);
                event_loop.exit();
                return;
            }
        }

        window.request_redraw();
        self.window = Some(window);
        self.engine = Some(engine);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                self.close_requested = true;
            }
            WindowEvent::Resized(size) => {
                if let Some(engine) = &mut self.engine {
                    engine.resize(size.width, size.height);
                }
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            WindowEvent::RedrawRequested => {
                self.render();
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if event.state == ElementState::Pressed {
                    match event.physical_key {
                        PhysicalKey::Code(KeyCode::Escape) => {
                            self.close_requested = true;
                        }
                        PhysicalKey::Code(KeyCode::F12) => {
                            self.request_auto_screenshot();
                            log::info!("Screenshot requested (F12)");
                            if let Some(window) = &self.window {
                                window.request_redraw();
                            }
                        }
                        _ => {}
                    }
                }
            }
            _ => {}
        }

        if self.close_requested {
            event_loop.exit();
        }
    }
}
