//! Overlay layer: board-space geometry projected through the calibrated camera.
//!
//! Vertices stay in board space on the GPU. `overlay.wgsl` applies the
//! `camera` matrix, divides x and y by camera depth and maps the result with
//! `viewport`, mirroring [`camreg_core::project_vertex`].

use std::collections::HashMap;

use camreg_core::{CompositeTransform, Mat4, OverlayGeometry, Topology};

use crate::buffer::{create_index_buffer, create_uniform_buffer, create_vertex_buffer, write_matrix};
use crate::compositor::RasterState;
use crate::error::RenderResult;
use crate::pipeline::{create_layer_pipelines, LayerPipelineDescriptor, TargetFormats};
use crate::shader::ShaderBuilder;

/// Byte offset of `camera` in [`OverlayUniforms`].
pub const CAMERA_OFFSET: u64 = 0;
/// Byte offset of `viewport` in [`OverlayUniforms`].
pub const VIEWPORT_OFFSET: u64 = 64;

/// GPU representation of overlay uniforms.
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct OverlayUniforms {
    pub camera: [[f32; 4]; 4],
    pub viewport: [[f32; 4]; 4],
}

impl Default for OverlayUniforms {
    fn default() -> Self {
        Self {
            camera: Mat4::IDENTITY.to_cols_array_2d(),
            viewport: Mat4::IDENTITY.to_cols_array_2d(),
        }
    }
}

impl From<&CompositeTransform> for OverlayUniforms {
    fn from(transform: &CompositeTransform) -> Self {
        Self {
            camera: transform.camera.to_cols_array_2d(),
            viewport: transform.viewport.to_cols_array_2d(),
        }
    }
}

/// Overlay vertex: board-space position and RGBA color.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct OverlayVertex {
    pub position: [f32; 3],
    pub color: [f32; 4],
}

impl OverlayVertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x4];

    /// Vertex buffer layout matching `overlay.wgsl`.
    #[must_use]
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Self>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Interleaves positions and colors for upload.
#[must_use]
pub fn interleave(geometry: &OverlayGeometry) -> Vec<OverlayVertex> {
    geometry
        .positions()
        .iter()
        .zip(geometry.colors())
        .map(|(p, c)| OverlayVertex {
            position: p.to_array(),
            color: c.to_array(),
        })
        .collect()
}

fn primitive_topology(topology: Topology) -> wgpu::PrimitiveTopology {
    match topology {
        Topology::Lines => wgpu::PrimitiveTopology::LineList,
        Topology::Triangles => wgpu::PrimitiveTopology::TriangleList,
    }
}

/// Overlay layer resources. The geometry is uploaded once.
pub struct OverlayRenderData {
    vertex_buffer: wgpu::Buffer,
    index_buffer: Option<wgpu::Buffer>,
    draw_count: u32,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    pipelines: HashMap<RasterState, wgpu::RenderPipeline>,
}

impl OverlayRenderData {
    /// Uploads `geometry` and builds the overlay pipelines.
    pub fn new(
        device: &wgpu::Device,
        geometry: &OverlayGeometry,
        shader_source: &str,
        formats: TargetFormats,
    ) -> RenderResult<Self> {
        let vertex_buffer =
            create_vertex_buffer(device, &interleave(geometry), Some("overlay vertices"));
        let index_label = Some("overlay indices");
        let index_buffer = geometry
            .indices()
            .map(|indices| create_index_buffer(device, indices, index_label));
        let uniform_buffer = create_uniform_buffer(
            device,
            &OverlayUniforms::default(),
            Some("overlay uniforms"),
        );

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("overlay bind group layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("overlay bind group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let shader = ShaderBuilder::new()
            .with_source(shader_source)
            .with_label("overlay shader")
            .build_module(device)?;
        let pipelines = create_layer_pipelines(
            device,
            &LayerPipelineDescriptor {
                label: "overlay",
                shader: &shader,
                bind_group_layout: &bind_group_layout,
                vertex_layout: OverlayVertex::layout(),
                topology: primitive_topology(geometry.topology()),
                formats,
            },
        );

        log::debug!(
            "overlay layer ready ({} vertices, {:?})",
            geometry.positions().len(),
            geometry.topology()
        );

        Ok(Self {
            vertex_buffer,
            index_buffer,
            draw_count: geometry.draw_count(),
            uniform_buffer,
            bind_group,
            pipelines,
        })
    }

    /// Writes the intrinsics-times-pose matrix.
    pub fn set_camera(&self, queue: &wgpu::Queue, camera: Mat4) {
        write_matrix(queue, &self.uniform_buffer, CAMERA_OFFSET, camera);
    }

    /// Writes the viewport projection.
    pub fn set_viewport(&self, queue: &wgpu::Queue, viewport: Mat4) {
        write_matrix(queue, &self.uniform_buffer, VIEWPORT_OFFSET, viewport);
    }

    /// Returns the pipeline for a raster state.
    pub fn pipeline(&self, state: RasterState) -> Option<&wgpu::RenderPipeline> {
        self.pipelines.get(&state)
    }

    /// Returns the bind group for rendering.
    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }

    /// Returns the vertex buffer.
    pub fn vertex_buffer(&self) -> &wgpu::Buffer {
        &self.vertex_buffer
    }

    /// Returns the index buffer, if the geometry is indexed.
    pub fn index_buffer(&self) -> Option<&wgpu::Buffer> {
        self.index_buffer.as_ref()
    }

    /// Returns the number of vertices or indices per draw.
    pub fn draw_count(&self) -> u32 {
        self.draw_count
    }
}
