//! Offscreen render targets and pixel readback.

use super::RenderEngine;
use crate::screenshot::ScreenshotError;

/// An offscreen color target sized to the engine's viewport, plus the
/// staging buffer it is read back through.
pub struct CaptureTarget {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    buffer: wgpu::Buffer,
    format: wgpu::TextureFormat,
    width: u32,
    height: u32,
}

impl CaptureTarget {
    /// Returns the view to render into.
    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    /// Returns the target dimensions.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Calculates bytes per row with proper alignment for wgpu buffer copies.
pub(crate) fn aligned_bytes_per_row(width: u32) -> u32 {
    let bytes_per_pixel = 4u32; // RGBA8
    let unaligned = width * bytes_per_pixel;
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    unaligned.div_ceil(align) * align
}

/// Converts tightly packed pixels of `format` to RGBA in place.
pub(crate) fn to_rgba(format: wgpu::TextureFormat, pixels: &mut [u8]) {
    if matches!(
        format,
        wgpu::TextureFormat::Bgra8Unorm | wgpu::TextureFormat::Bgra8UnormSrgb
    ) {
        for chunk in pixels.chunks_exact_mut(4) {
            chunk.swap(0, 2); // Swap B and R
        }
    }
}

impl RenderEngine {
    /// Creates an offscreen target in the engine's color format.
    pub fn create_capture_target(&self) -> CaptureTarget {
        let format = self.surface_config.format;
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("capture texture"),
            size: wgpu::Extent3d {
                width: self.width,
                height: self.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("capture buffer"),
            size: u64::from(aligned_bytes_per_row(self.width)) * u64::from(self.height),
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        CaptureTarget {
            texture,
            view,
            buffer,
            format,
            width: self.width,
            height: self.height,
        }
    }

    /// Reads back a capture target after its frame has been submitted.
    ///
    /// Returns tightly packed RGBA pixels, top row first.
    pub fn read_capture(&self, target: &CaptureTarget) -> Result<Vec<u8>, ScreenshotError> {
        let bytes_per_row = aligned_bytes_per_row(target.width);

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("capture copy encoder"),
            });

        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &target.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &target.buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(bytes_per_row),
                    rows_per_image: Some(target.height),
                },
            },
            wgpu::Extent3d {
                width: target.width,
                height: target.height,
                depth_or_array_layers: 1,
            },
        );

        self.queue.submit(std::iter::once(encoder.finish()));

        // Map buffer and read data
        let buffer_slice = target.buffer.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
            // The receiver outlives the poll below.
            let _ = tx.send(result);
        });
        let _ = self.device.poll(wgpu::PollType::wait_indefinitely());
        rx.recv()
            .map_err(|_| ScreenshotError::BufferMapFailed)?
            .map_err(|_| ScreenshotError::BufferMapFailed)?;

        // Copy data, removing row padding
        let data = buffer_slice.get_mapped_range();
        let row_bytes = (target.width * 4) as usize;
        let mut result = Vec::with_capacity(row_bytes * target.height as usize);

        for row in 0..target.height {
            let start = (row * bytes_per_row) as usize;
            let end = start + row_bytes;
            result.extend_from_slice(&data[start..end]);
        }

        drop(data);
        target.buffer.unmap();

        to_rgba(target.format, &mut result);
        Ok(result)
    }
}
