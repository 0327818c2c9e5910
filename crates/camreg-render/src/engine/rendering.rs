//! Frame encoding: one render pass driven by the compositor.

use camreg_core::{Mat4, Vec3};

use super::RenderEngine;
use crate::background_render::BackgroundRenderData;
use crate::compositor::{
    Compositor, DrawTarget, FrameMatrices, Layer, RasterState, BACKGROUND_MVP, OVERLAY_CAMERA,
    OVERLAY_VIEWPORT,
};
use crate::error::{RenderError, RenderResult};
use crate::overlay_render::OverlayRenderData;

/// The layers a frame draws from.
#[derive(Clone, Copy)]
pub struct FrameLayers<'a> {
    /// Photograph layer.
    pub background: &'a BackgroundRenderData,
    /// Projected geometry layer.
    pub overlay: &'a OverlayRenderData,
}

/// [`DrawTarget`] recording into a wgpu render pass.
///
/// Named uniforms go through the queue and land before the pass executes,
/// so each name should be written once per frame.
pub struct GpuDrawTarget<'a, 'pass> {
    queue: &'a wgpu::Queue,
    pass: &'a mut wgpu::RenderPass<'pass>,
    layers: FrameLayers<'a>,
    state: RasterState,
}

impl<'a, 'pass> GpuDrawTarget<'a, 'pass> {
    /// Wraps an open render pass.
    pub fn new(
        queue: &'a wgpu::Queue,
        pass: &'a mut wgpu::RenderPass<'pass>,
        layers: FrameLayers<'a>,
    ) -> Self {
        Self {
            queue,
            pass,
            layers,
            state: RasterState::DEFAULT,
        }
    }

    fn missing_pipeline(&self, layer: Layer) -> RenderError {
        RenderError::MissingPipeline {
            layer: layer.to_string(),
            state: self.state.to_string(),
        }
    }
}

impl DrawTarget for GpuDrawTarget<'_, '_> {
    fn upload_matrix(&mut self, name: &str, matrix: Mat4) -> RenderResult<()> {
        match name {
            BACKGROUND_MVP => self.layers.background.set_transform(self.queue, matrix),
            OVERLAY_CAMERA => self.layers.overlay.set_camera(self.queue, matrix),
            OVERLAY_VIEWPORT => self.layers.overlay.set_viewport(self.queue, matrix),
            _ => return Err(RenderError::UnknownUniform(name.to_string())),
        }
        Ok(())
    }

    fn raster_state(&self) -> RasterState {
        self.state
    }

    fn set_raster_state(&mut self, state: RasterState) {
        self.state = state;
    }

    fn draw(&mut self, layer: Layer) -> RenderResult<()> {
        match layer {
            Layer::Background => {
                let background = self.layers.background;
                let pipeline = background
                    .pipeline(self.state)
                    .ok_or_else(|| self.missing_pipeline(layer))?;
                self.pass.set_pipeline(pipeline);
                self.pass.set_bind_group(0, background.bind_group(), &[]);
                self.pass
                    .set_vertex_buffer(0, background.vertex_buffer().slice(..));
                self.pass.draw(0..4, 0..1);
            }
            Layer::Overlay => {
                let overlay = self.layers.overlay;
                let pipeline = overlay
                    .pipeline(self.state)
                    .ok_or_else(|| self.missing_pipeline(layer))?;
                self.pass.set_pipeline(pipeline);
                self.pass.set_bind_group(0, overlay.bind_group(), &[]);
                self.pass
                    .set_vertex_buffer(0, overlay.vertex_buffer().slice(..));
                if let Some(index_buffer) = overlay.index_buffer() {
                    self.pass
                        .set_index_buffer(index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                    self.pass.draw_indexed(0..overlay.draw_count(), 0, 0..1);
                } else {
                    self.pass.draw(0..overlay.draw_count(), 0..1);
                }
            }
        }
        Ok(())
    }
}

impl RenderEngine {
    /// Records one frame into `view`: clear, then the compositor's draws.
    pub fn encode_frame(
        &self,
        view: &wgpu::TextureView,
        clear_color: Vec3,
        layers: FrameLayers<'_>,
        compositor: &Compositor,
        matrices: &FrameMatrices,
    ) -> RenderResult<wgpu::CommandBuffer> {
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("composite pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: f64::from(clear_color.x),
                            g: f64::from(clear_color.y),
                            b: f64::from(clear_color.z),
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });

            let mut target = GpuDrawTarget::new(&self.queue, &mut render_pass, layers);
            compositor.draw_frame(&mut target, matrices)?;
        }

        Ok(encoder.finish())
    }
}
