//! Application window and event loop management.

mod input;
mod render;

pub(super) use std::sync::Arc;

pub(super) use pollster::FutureExt;
pub(super) use winit::{
    application::ApplicationHandler,
    dpi::LogicalSize,
    event::{ElementState, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

pub(super) use camreg_render::RenderEngine;

use crate::error::{Error, Result};
use crate::scene::{OverlayScene, PreparedScene};

/// The viewer application state.
pub struct App {
    pub(super) scene: OverlayScene,
    pub(super) window: Option<Arc<Window>>,
    pub(super) engine: Option<RenderEngine>,
    pub(super) prepared: Option<PreparedScene>,
    pub(super) close_requested: bool,
    pub(super) error: Option<Error>,
    pub(super) screenshot_pending: Option<String>,
    pub(super) screenshot_counter: u32,
}

impl App {
    /// Creates a new application for `scene`.
    pub fn new(scene: OverlayScene) -> Self {
        Self {
            scene,
            window: None,
            engine: None,
            prepared: None,
            close_requested: false,
            error: None,
            screenshot_pending: None,
            screenshot_counter: 0,
        }
    }

    /// Requests a screenshot of the next frame.
    pub fn request_screenshot(&mut self, filename: impl Into<String>) {
        self.screenshot_pending = Some(filename.into());
    }

    /// Requests a screenshot with an auto-generated filename.
    pub fn request_auto_screenshot(&mut self) {
        let filename = format!("screenshot_{:04}.png", self.screenshot_counter);
        self.screenshot_counter += 1;
        self.screenshot_pending = Some(filename);
    }

    /// Records a fatal error and asks the event loop to stop.
    pub(super) fn fail(&mut self, error: impl Into<Error>) {
        let error = error.into();
        log::error!("{error}");
        self.error = Some(error);
        self.close_requested = true;
    }
}

/// Opens a window showing `scene` and runs until it is closed.
///
/// Returns the first fatal error raised while setting up or drawing.
pub fn run_app(scene: OverlayScene) -> Result<()> {
    let _ = env_logger::try_init();

    let event_loop = EventLoop::new()?;
    let mut app = App::new(scene);

    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(error) => Err(error),
        None => Ok(()),
    }
}
