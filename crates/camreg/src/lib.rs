//! camreg: draw a calibrated camera's view of a cuboid over the photograph
//! the camera was calibrated from.
//!
//! The overlay is projected with a 4x4 camera matrix built from the pinhole
//! intrinsics, so the cuboid stays registered with the board in the photo
//! while still writing usable depth.
//!
//! # Quick Start
//!
//! ```no_run
//! use camreg::*;
//!
//! fn main() -> Result<()> {
//!     let calibration = Calibration::from_path("calibration.json")?;
//!     let scene = OverlayScene::checkerboard(&calibration, Options::default())?;
//!     run_app(scene)
//! }
//! ```
//!
//! Without a window, [`render_to_image`] and [`render_to_file`] produce the
//! same frame offscreen.

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]

mod app;
mod error;
mod headless;
mod scene;

pub use app::{run_app, App};
pub use error::{Error, Result};
pub use headless::{render_to_file, render_to_image};
pub use scene::{OverlayScene, PreparedScene, DEFAULT_IMAGE_SIZE};

pub use camreg_core::{
    board, build_intrinsic_matrix, build_pose_matrix, composite, ndc_to_pixel,
    perspective_divide_xy, project_to_pixel, project_vertex, viewport_projection, BoardLayout,
    Calibration, CameraIntrinsics, CameraPose, CamregError, CheckerboardSource, CompositeTransform,
    Cuboid, CuboidOverlay, DepthRange, EdgeColors, FaceColors, FaceSet, FileImageSource, FrameInfo,
    GrayImage, ImageSource, Mat3, Mat4, Options, OverlayGeometry, OverlaySource, OverlayStyle,
    ProjectionBuilder, RowOrder, Topology, Vec2, Vec3, Vec4,
};
pub use camreg_render::{
    CompositePolicy, Compositor, DrawTarget, FrameMatrices, Layer, RasterState, RenderError,
    ScopedRasterState, ScreenshotError, ShaderSources,
};
