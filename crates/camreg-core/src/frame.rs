//! Per-frame viewport information.

/// Framebuffer dimensions delivered once per frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameInfo {
    /// Framebuffer width in pixels.
    pub width: u32,
    /// Framebuffer height in pixels.
    pub height: u32,
}

impl FrameInfo {
    /// Creates frame info, clamping both dimensions to at least one pixel.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
        }
    }

    /// Returns the dimensions as floats.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn size_f32(&self) -> (f32, f32) {
        (self.width as f32, self.height as f32)
    }

    /// Returns width / height.
    #[must_use]
    pub fn aspect_ratio(&self) -> f32 {
        let (w, h) = self.size_f32();
        w / h
    }
}
