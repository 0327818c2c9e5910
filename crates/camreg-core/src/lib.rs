//! Core math and data model for camreg.
//!
//! This crate turns a pinhole calibration into something a rasterizer can draw:
//! - [`projection`]: the 4x4 camera matrix, the pose matrix, the viewport
//!   projection and their composition
//! - [`CameraIntrinsics`], [`CameraPose`] and [`Calibration`] files
//! - [`ImageSource`] implementations for the background photograph
//! - [`OverlayGeometry`] for the cuboid drawn on the board

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
// Builder patterns return Self which doesn't need must_use
#![allow(clippy::must_use_candidate)]
// Matrix entries are named after the math (fx, cx, ...)
#![allow(clippy::many_single_char_names)]
#![allow(clippy::similar_names)]
// Vertex counts are far below u32::MAX
#![allow(clippy::cast_possible_truncation)]

pub mod board;
pub mod calibration;
pub mod error;
pub mod frame;
pub mod geometry;
pub mod gray_image;
pub mod intrinsics;
pub mod options;
pub mod pose;
pub mod projection;

pub use board::{BoardLayout, CheckerboardSource};
pub use calibration::Calibration;
pub use error::{CamregError, Result};
pub use frame::FrameInfo;
pub use geometry::{
    Cuboid, CuboidOverlay, EdgeColors, FaceColors, FaceSet, OverlayGeometry, OverlaySource,
    OverlayStyle, Topology,
};
pub use gray_image::{FileImageSource, GrayImage, ImageSource, RowOrder};
pub use intrinsics::CameraIntrinsics;
pub use options::Options;
pub use pose::CameraPose;
pub use projection::{
    build_intrinsic_matrix, build_pose_matrix, composite, ndc_to_pixel, perspective_divide_xy,
    project_to_pixel, project_vertex, viewport_projection, CompositeTransform, DepthRange,
    ProjectionBuilder,
};

// Re-export glam types for convenience
pub use glam::{Mat3, Mat4, Vec2, Vec3, Vec4};
