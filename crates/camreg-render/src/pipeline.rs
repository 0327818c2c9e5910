//! Render pipelines, one per [`RasterState`].
//!
//! wgpu bakes depth and blend state into the pipeline, so toggling them
//! between draws means switching pipelines.

use std::collections::HashMap;

use crate::compositor::RasterState;

/// Color and depth formats of the render target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetFormats {
    /// Color attachment format.
    pub color: wgpu::TextureFormat,
    /// Depth attachment format.
    pub depth: wgpu::TextureFormat,
}

impl RasterState {
    /// Depth state: `Less` with writes when testing, otherwise `Always`
    /// without writes.
    #[must_use]
    pub fn depth_stencil(self, format: wgpu::TextureFormat) -> wgpu::DepthStencilState {
        let (depth_write_enabled, depth_compare) = if self.depth_test {
            (true, wgpu::CompareFunction::Less)
        } else {
            (false, wgpu::CompareFunction::Always)
        };
        wgpu::DepthStencilState {
            format,
            depth_write_enabled,
            depth_compare,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }
    }

    /// Blend state: standard alpha blending or replace.
    #[must_use]
    pub fn blend_state(self) -> Option<wgpu::BlendState> {
        self.blend.then_some(wgpu::BlendState::ALPHA_BLENDING)
    }
}

/// Everything but the raster state that describes a layer pipeline.
pub struct LayerPipelineDescriptor<'a> {
    /// Debug label prefix.
    pub label: &'a str,
    /// Shader module holding `vs_main` and `fs_main`.
    pub shader: &'a wgpu::ShaderModule,
    /// Bind group layout for group 0.
    pub bind_group_layout: &'a wgpu::BindGroupLayout,
    /// Vertex buffer layout for slot 0.
    pub vertex_layout: wgpu::VertexBufferLayout<'a>,
    /// Primitive topology.
    pub topology: wgpu::PrimitiveTopology,
    /// Target formats.
    pub formats: TargetFormats,
}

/// Builds the layer pipeline for every raster state.
pub fn create_layer_pipelines(
    device: &wgpu::Device,
    desc: &LayerPipelineDescriptor<'_>,
) -> HashMap<RasterState, wgpu::RenderPipeline> {
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(desc.label),
        bind_group_layouts: &[desc.bind_group_layout],
        push_constant_ranges: &[],
    });

    RasterState::ALL
        .into_iter()
        .map(|state| {
            let label = format!("{} pipeline ({state})", desc.label);
            let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(&label),
                layout: Some(&layout),
                vertex: wgpu::VertexState {
                    module: desc.shader,
                    entry_point: Some("vs_main"),
                    buffers: std::slice::from_ref(&desc.vertex_layout),
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: desc.shader,
                    entry_point: Some("fs_main"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: desc.formats.color,
                        blend: state.blend_state(),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: desc.topology,
                    cull_mode: None,
                    ..wgpu::PrimitiveState::default()
                },
                depth_stencil: Some(state.depth_stencil(desc.formats.depth)),
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            });
            (state, pipeline)
        })
        .collect()
}
