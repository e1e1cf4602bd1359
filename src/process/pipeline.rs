use crate::primitives::texture::Texture;
use crate::primitives::vertex::Vertex;

const SHADER_STRUCTS: &str = include_str!("../shaders/structs.wgsl");
const SHADER_MATERIAL: &str = include_str!("../shaders/material.wgsl");
const STANDARD_VERTEX: &str = include_str!("../shaders/standard.wgsl");
const SHADOW_SHADER: &str = include_str!("../shaders/shadow.wgsl");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShadingModel {
    UvColor,
    Gray,
    Textured,
    /// Unlit blit of a camera framebuffer, drawn without depth testing.
    Screen,
}

impl ShadingModel {
    pub const ALL: [ShadingModel; 4] = [
        ShadingModel::UvColor,
        ShadingModel::Gray,
        ShadingModel::Textured,
        ShadingModel::Screen,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ShadingModel::UvColor => "UV Color",
            ShadingModel::Gray => "Gray",
            ShadingModel::Textured => "Textured",
            ShadingModel::Screen => "Screen",
        }
    }

    fn fragment_source(&self) -> &'static str {
        match self {
            ShadingModel::UvColor => include_str!("../shaders/uvcolor.wgsl"),
            ShadingModel::Gray => include_str!("../shaders/gray.wgsl"),
            ShadingModel::Textured => include_str!("../shaders/textured.wgsl"),
            ShadingModel::Screen => include_str!("../shaders/textured_unlit.wgsl"),
        }
    }

    pub fn depth_tested(&self) -> bool {
        !matches!(self, ShadingModel::Screen)
    }

    pub fn shader_source(&self) -> String {
        format!(
            "{}\n{}\n{}\n{}",
            SHADER_STRUCTS,
            SHADER_MATERIAL,
            STANDARD_VERTEX,
            self.fragment_source()
        )
    }
}

pub fn shadow_shader_source() -> String {
    format!("{}\n{}", SHADER_STRUCTS, SHADOW_SHADER)
}

/// Group 0 is the camera, group 1 the mesh transform, group 2 its textures.
pub struct BindGroupLayouts {
    pub camera: wgpu::BindGroupLayout,
    pub model: wgpu::BindGroupLayout,
    pub material: wgpu::BindGroupLayout,
}

impl BindGroupLayouts {
    pub fn new(device: &wgpu::Device) -> Self {
        let uniform_entry = |visibility| wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };

        let camera = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[uniform_entry(wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT)],
            label: Some("camera_bind_group_layout"),
        });

        let model = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[uniform_entry(wgpu::ShaderStages::VERTEX)],
            label: Some("model_bind_group_layout"),
        });

        let material = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        multisampled: false,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        multisampled: false,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        sample_type: wgpu::TextureSampleType::Depth,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 3,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Comparison),
                    count: None,
                },
            ],
            label: Some("material_bind_group_layout"),
        });

        Self {
            camera,
            model,
            material,
        }
    }

    pub fn create_camera_bind_group(
        &self,
        device: &wgpu::Device,
        buffer: &wgpu::Buffer,
        label: &str,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &self.camera,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some(label),
        })
    }

    /// `secondary` is the depth texture sampled at bindings 2 and 3: the sun's
    /// shadow map for lit meshes, the camera depth for the screen quad.
    pub fn create_material_bind_group(
        &self,
        device: &wgpu::Device,
        diffuse: &Texture,
        secondary: &Texture,
        label: &str,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &self.material,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&diffuse.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&diffuse.sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(&secondary.view),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::Sampler(&secondary.sampler),
                },
            ],
            label: Some(label),
        })
    }
}

pub fn create_pipeline(
    device: &wgpu::Device,
    layouts: &BindGroupLayouts,
    shading: ShadingModel,
    color_format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(shading.label()),
        source: wgpu::ShaderSource::Wgsl(shading.shader_source().into()),
    });

    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(&format!("{} Pipeline Layout", shading.label())),
        bind_group_layouts: &[&layouts.camera, &layouts.model, &layouts.material],
        push_constant_ranges: &[],
    });

    let depth_stencil = if shading.depth_tested() {
        Some(wgpu::DepthStencilState {
            format: Texture::DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        })
    } else {
        None
    };

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(&format!("{} Pipeline", shading.label())),
        layout: Some(&pipeline_layout),
        vertex: wgpu::VertexState {
            module: &module,
            entry_point: "vs_main",
            buffers: &[Vertex::desc()],
        },
        fragment: Some(wgpu::FragmentState {
            module: &module,
            entry_point: "fs_main",
            targets: &[Some(wgpu::ColorTargetState {
                format: color_format,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil,
        multisample: wgpu::MultisampleState {
            count: 1,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },
        multiview: None,
    })
}

/// Depth-only pipeline rendering meshes from the sun into the shadow map.
pub fn create_shadow_pipeline(
    device: &wgpu::Device,
    layouts: &BindGroupLayouts,
) -> wgpu::RenderPipeline {
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("Shadow Shader"),
        source: wgpu::ShaderSource::Wgsl(shadow_shader_source().into()),
    });

    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Shadow Pipeline Layout"),
        bind_group_layouts: &[&layouts.camera, &layouts.model],
        push_constant_ranges: &[],
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("Shadow Pipeline"),
        layout: Some(&pipeline_layout),
        vertex: wgpu::VertexState {
            module: &module,
            entry_point: "vs_shadow",
            buffers: &[Vertex::desc()],
        },
        fragment: None,
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: Texture::DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::LessEqual,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState {
                constant: 2,
                slope_scale: 2.0,
                clamp: 0.0,
            },
        }),
        multisample: wgpu::MultisampleState {
            count: 1,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },
        multiview: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_shading_model_has_both_entry_points() {
        for shading in ShadingModel::ALL {
            let source = shading.shader_source();
            assert!(source.contains("fn vs_main"), "{:?}", shading);
            assert!(source.contains("fn fs_main"), "{:?}", shading);
            assert_eq!(source.matches("fn fs_main").count(), 1);
        }
    }

    #[test]
    fn only_screen_skips_depth() {
        let untested: Vec<ShadingModel> = ShadingModel::ALL
            .iter()
            .copied()
            .filter(|s| !s.depth_tested())
            .collect();
        assert_eq!(untested, vec![ShadingModel::Screen]);
    }

    #[test]
    fn shadow_shader_has_no_material_bindings() {
        let source = shadow_shader_source();
        assert!(source.contains("fn vs_shadow"));
        assert!(!source.contains("@group(2)"));
    }
}
