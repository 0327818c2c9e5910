//! Shader management.

use crate::error::{RenderError, RenderResult};

/// WGSL sources for the two layers.
///
/// Each source holds both `vs_main` and `fs_main`. Replace them to restyle a
/// layer; the uniform block and vertex layout must stay as in the bundled
/// shaders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderSources {
    /// Textured full-screen quad.
    pub background: String,
    /// Projected overlay geometry.
    pub overlay: String,
}

impl Default for ShaderSources {
    fn default() -> Self {
        Self {
            background: include_str!("../shaders/background.wgsl").to_string(),
            overlay: include_str!("../shaders/overlay.wgsl").to_string(),
        }
    }
}

/// Builder for creating shader modules.
pub struct ShaderBuilder {
    vertex_source: Option<String>,
    fragment_source: Option<String>,
    label: Option<String>,
}

impl ShaderBuilder {
    /// Creates a new shader builder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            vertex_source: None,
            fragment_source: None,
            label: None,
        }
    }

    /// Sets the vertex shader source (WGSL).
    pub fn with_vertex(mut self, source: impl Into<String>) -> Self {
        self.vertex_source = Some(source.into());
        self
    }

    /// Sets the fragment shader source (WGSL).
    pub fn with_fragment(mut self, source: impl Into<String>) -> Self {
        self.fragment_source = Some(source.into());
        self
    }

    /// Sets both stages from one WGSL source.
    pub fn with_source(self, source: impl Into<String>) -> Self {
        let source = source.into();
        self.with_vertex(source.clone()).with_fragment(source)
    }

    /// Sets the shader label for debugging.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Builds the shader module (does not create pipeline).
    pub fn build_module(self, device: &wgpu::Device) -> RenderResult<wgpu::ShaderModule> {
        let source = self.combined_source()?;

        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: self.label.as_deref(),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        });

        Ok(module)
    }

    fn combined_source(&self) -> RenderResult<String> {
        let Some(vertex) = &self.vertex_source else {
            return Err(missing_stage("vertex"));
        };
        let Some(fragment) = &self.fragment_source else {
            return Err(missing_stage("fragment"));
        };

        let stages = [
            ("vertex", vertex, "vs_main"),
            ("fragment", fragment, "fs_main"),
        ];
        for (stage, source, entry) in stages {
            if !source.contains(entry) {
                return Err(RenderError::ShaderCompilationFailed(format!(
                    "{stage} shader has no `{entry}` entry point"
                )));
            }
        }

        // If sources are the same file, just return one
        if vertex == fragment {
            return Ok(vertex.clone());
        }

        Ok(format!("{vertex}\n\n{fragment}"))
    }
}

impl Default for ShaderBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn missing_stage(stage: &str) -> RenderError {
    RenderError::ShaderCompilationFailed(format!("missing {stage} shader"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_sources_have_entry_points() {
        let sources = ShaderSources::default();
        for source in [&sources.background, &sources.overlay] {
            let combined = ShaderBuilder::new()
                .with_source(source.clone())
                .combined_source()
                .unwrap();
            assert_eq!(&combined, source);
        }
    }

    #[test]
    fn test_overlay_source_divides_only_xy() {
        let overlay = ShaderSources::default().overlay;
        assert!(overlay.contains("q.x / q.z"));
        assert!(overlay.contains("q.y / q.z"));
        assert!(!overlay.contains("q.z / q.z"));
    }

    #[test]
    fn test_missing_stage_is_an_error() {
        let err = ShaderBuilder::new()
            .with_vertex("@vertex fn vs_main() {}")
            .combined_source()
            .unwrap_err();
        assert!(matches!(err, RenderError::ShaderCompilationFailed(_)));
    }

    #[test]
    fn test_missing_entry_point_is_an_error() {
        let err = ShaderBuilder::new()
            .with_source("@vertex fn main() {}")
            .combined_source()
            .unwrap_err();
        assert!(matches!(err, RenderError::ShaderCompilationFailed(_)));
    }
}
