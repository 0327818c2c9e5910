//! Background layer: the grayscale photograph on a full-screen quad.

use std::collections::HashMap;

use camreg_core::{GrayImage, Mat4, RowOrder};

use crate::buffer::{create_gray_texture, create_uniform_buffer, create_vertex_buffer, write_matrix};
use crate::compositor::RasterState;
use crate::error::{RenderError, RenderResult};
use crate::pipeline::{create_layer_pipelines, LayerPipelineDescriptor, TargetFormats};
use crate::shader::ShaderBuilder;

/// GPU representation of background uniforms.
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct BackgroundUniforms {
    pub mvp: [[f32; 4]; 4],
}

impl Default for BackgroundUniforms {
    fn default() -> Self {
        Self {
            mvp: background_transform().to_cols_array_2d(),
        }
    }
}

/// Quad vertex: position in the unit square, texture coordinate.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct BackgroundVertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
}

impl BackgroundVertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x2];

    /// Vertex buffer layout matching `background.wgsl`.
    #[must_use]
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Self>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Maps the unit square, y down, onto the whole viewport.
///
/// The quad does not depend on the framebuffer size or the calibration.
#[must_use]
pub fn background_transform() -> Mat4 {
    Mat4::orthographic_lh(0.0, 1.0, 1.0, 0.0, -1.0, 1.0)
}

/// Triangle-strip quad covering the unit square, with texture coordinates
/// matched to the pixel buffer's row order.
#[must_use]
pub fn quad_vertices(row_order: RowOrder) -> [BackgroundVertex; 4] {
    [(0.0, 0.0), (0.0, 1.0), (1.0, 0.0), (1.0, 1.0)].map(|(x, y)| BackgroundVertex {
        position: [x, y, 0.0],
        uv: [x, row_order.texcoord_v(y)],
    })
}

/// Background layer resources.
pub struct BackgroundRenderData {
    _texture: wgpu::Texture,
    vertex_buffer: wgpu::Buffer,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    pipelines: HashMap<RasterState, wgpu::RenderPipeline>,
    image_size: (u32, u32),
}

impl BackgroundRenderData {
    /// Uploads `image` and builds the background pipelines.
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        image: &GrayImage,
        shader_source: &str,
        formats: TargetFormats,
    ) -> RenderResult<Self> {
        let limit = device.limits().max_texture_dimension_2d;
        if image.width() > limit || image.height() > limit {
            return Err(RenderError::TextureCreationFailed(format!(
                "{}x{} image exceeds the {limit} pixel texture limit",
                image.width(),
                image.height()
            )));
        }

        let texture = create_gray_texture(
            device,
            queue,
            image.width(),
            image.height(),
            image.pixels(),
            Some("background texture"),
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("background sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let vertex_buffer = create_vertex_buffer(
            device,
            &quad_vertices(image.row_order()),
            Some("background vertices"),
        );
        let uniform_buffer = create_uniform_buffer(
            device,
            &BackgroundUniforms::default(),
            Some("background uniforms"),
        );

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("background bind group layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("background bind group"),
            layout: &bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
            ],
        });

        let shader = ShaderBuilder::new()
            .with_source(shader_source)
            .with_label("background shader")
            .build_module(device)?;
        let pipelines = create_layer_pipelines(
            device,
            &LayerPipelineDescriptor {
                label: "background",
                shader: &shader,
                bind_group_layout: &bind_group_layout,
                vertex_layout: BackgroundVertex::layout(),
                topology: wgpu::PrimitiveTopology::TriangleStrip,
                formats,
            },
        );

        log::debug!(
            "background layer ready ({}x{})",
            image.width(),
            image.height()
        );

        Ok(Self {
            _texture: texture,
            vertex_buffer,
            uniform_buffer,
            bind_group,
            pipelines,
            image_size: (image.width(), image.height()),
        })
    }

    /// Writes the quad transform.
    pub fn set_transform(&self, queue: &wgpu::Queue, mvp: Mat4) {
        write_matrix(queue, &self.uniform_buffer, 0, mvp);
    }

    /// Returns the pipeline for a raster state.
    pub fn pipeline(&self, state: RasterState) -> Option<&wgpu::RenderPipeline> {
        self.pipelines.get(&state)
    }

    /// Returns the bind group for rendering.
    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }

    /// Returns the quad vertex buffer.
    pub fn vertex_buffer(&self) -> &wgpu::Buffer {
        &self.vertex_buffer
    }

    /// Returns the size of the uploaded image.
    pub fn image_size(&self) -> (u32, u32) {
        self.image_size
    }
}
