//! Error type for the viewer and the headless renderer.

use camreg_core::CamregError;
use camreg_render::{RenderError, ScreenshotError};
use thiserror::Error;

/// Errors raised while assembling, rendering or saving a scene.
///
/// Failures from the core and render crates are carried unchanged, so their
/// variants can still be matched.
#[derive(Error, Debug)]
pub enum Error {
    /// Calibration, image or overlay data was rejected.
    #[error(transparent)]
    Core(#[from] CamregError),

    /// The GPU layer failed.
    #[error(transparent)]
    Render(#[from] RenderError),

    /// A captured frame could not be read back or encoded.
    #[error(transparent)]
    Screenshot(#[from] ScreenshotError),

    /// The window could not be created.
    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),

    /// The event loop could not be created or exited with an error.
    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
}

/// A specialized Result type for scene and viewer operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_variants_survive_conversion() {
        let err = Error::from(RenderError::UnknownUniform("overlay.model".into()));
        assert!(matches!(
            &err,
            Error::Render(RenderError::UnknownUniform(name)) if name == "overlay.model"
        ));
        assert_eq!(err.to_string(), "unknown uniform: overlay.model");
    }

    #[test]
    fn test_core_variants_survive_conversion() {
        let err = Error::from(CamregError::BehindCamera { depth: -2.0 });
        assert!(matches!(
            err,
            Error::Core(CamregError::BehindCamera { depth }) if depth == -2.0
        ));
    }
}
