//! Rendering backend for camreg.
//!
//! This crate provides the wgpu-based rendering engine, including:
//! - Windowed and headless engines with offscreen capture
//! - The background (photo) and overlay (projected geometry) layers
//! - The compositor that orders the layers and scopes their raster state
//! - Shader sources (WGSL) and screenshot encoding

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
// Builder patterns return Self which doesn't need must_use
#![allow(clippy::must_use_candidate)]
// GPU structs mirror WGSL field names
#![allow(clippy::pub_underscore_fields)]
// Render data getters are named after the resource they return
#![allow(clippy::module_name_repetitions)]

pub mod background_render;
pub mod buffer;
pub mod compositor;
pub mod engine;
pub mod error;
pub mod overlay_render;
pub mod pipeline;
pub mod screenshot;
pub mod shader;

pub use background_render::{background_transform, BackgroundRenderData, BackgroundUniforms};
pub use compositor::{
    CompositePolicy, Compositor, DrawTarget, FrameMatrices, Layer, RasterState, ScopedRasterState,
    BACKGROUND_MVP, OVERLAY_CAMERA, OVERLAY_VIEWPORT,
};
pub use engine::{CaptureTarget, FrameLayers, GpuDrawTarget, RenderEngine};
pub use error::{RenderError, RenderResult};
pub use overlay_render::{OverlayRenderData, OverlayUniforms, OverlayVertex};
pub use pipeline::TargetFormats;
pub use screenshot::{save_image, save_to_buffer, ScreenshotError};
pub use shader::{ShaderBuilder, ShaderSources};
