use std::path::Path;

use anyhow::{Context, Result};
use cgmath::{prelude::*, Matrix3, Matrix4, Vector3};
use wgpu::util::DeviceExt;

use crate::primitives::vertex::Vertex;
use crate::process::geometry::{cube_vertices, quad_vertices};
use crate::process::obj::parse_obj;
use crate::process::pipeline::{BindGroupLayouts, ShadingModel};

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ModelUniform {
    pub model: [[f32; 4]; 4],
    // mat3x3 columns are padded to vec4 in uniform buffers
    pub normal_model: [[f32; 4]; 3],
}

impl ModelUniform {
    pub fn from(model: &Matrix4<f32>) -> Self {
        let linear = Matrix3::from_cols(model.x.truncate(), model.y.truncate(), model.z.truncate());
        let normal = linear
            .invert()
            .map(|inverse| inverse.transpose())
            .unwrap_or_else(Matrix3::identity);

        Self {
            model: (*model).into(),
            normal_model: [
                normal.x.extend(0.0).into(),
                normal.y.extend(0.0).into(),
                normal.z.extend(0.0).into(),
            ],
        }
    }
}

pub struct Mesh {
    pub label: String,
    pub model: Matrix4<f32>,
    pub shading: ShadingModel,
    vertex_count: u32,
    vertex_buffer: wgpu::Buffer,
    model_buffer: wgpu::Buffer,
    model_bind_group: wgpu::BindGroup,
    material_bind_group: wgpu::BindGroup,
}

impl Mesh {
    pub fn new(
        device: &wgpu::Device,
        layouts: &BindGroupLayouts,
        label: &str,
        vertices: &[Vertex],
        shading: ShadingModel,
        material_bind_group: wgpu::BindGroup,
    ) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Vertex Buffer", label)),
            contents: bytemuck::cast_slice(vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let model = Matrix4::identity();
        let model_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Model Buffer", label)),
            contents: bytemuck::bytes_of(&ModelUniform::from(&model)),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let model_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &layouts.model,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: model_buffer.as_entire_binding(),
            }],
            label: Some(&format!("{} Model Bind Group", label)),
        });

        Self {
            label: label.to_string(),
            model,
            shading,
            vertex_count: vertices.len() as u32,
            vertex_buffer,
            model_buffer,
            model_bind_group,
            material_bind_group,
        }
    }

    pub fn create_quad(
        device: &wgpu::Device,
        layouts: &BindGroupLayouts,
        label: &str,
        corners: [Vector3<f32>; 4],
        shading: ShadingModel,
        material_bind_group: wgpu::BindGroup,
    ) -> Self {
        let [top_left, top_right, bottom_right, bottom_left] = corners;
        let vertices = quad_vertices(top_left, top_right, bottom_right, bottom_left);
        Self::new(device, layouts, label, &vertices, shading, material_bind_group)
    }

    pub fn create_cube(
        device: &wgpu::Device,
        layouts: &BindGroupLayouts,
        label: &str,
        center: Vector3<f32>,
        edge: f32,
        shading: ShadingModel,
        material_bind_group: wgpu::BindGroup,
    ) -> Self {
        let vertices = cube_vertices(center, edge);
        Self::new(device, layouts, label, &vertices, shading, material_bind_group)
    }

    pub fn create_from_obj(
        device: &wgpu::Device,
        layouts: &BindGroupLayouts,
        path: &Path,
        shading: ShadingModel,
        material_bind_group: wgpu::BindGroup,
    ) -> Result<Self> {
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read OBJ file {}", path.display()))?;
        let vertices = parse_obj(&source)
            .with_context(|| format!("Failed to parse OBJ file {}", path.display()))?;
        log::info!("Loaded {} ({} vertices)", path.display(), vertices.len());

        let label = path.to_string_lossy();
        Ok(Self::new(device, layouts, &label, &vertices, shading, material_bind_group))
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    pub fn set_material(&mut self, material_bind_group: wgpu::BindGroup) {
        self.material_bind_group = material_bind_group;
    }

    pub fn update_buffer(&self, queue: &wgpu::Queue) {
        let uniform = ModelUniform::from(&self.model);
        queue.write_buffer(&self.model_buffer, 0, bytemuck::bytes_of(&uniform));
    }

    /// Draws with whatever pipeline and group 0 the pass has bound.
    pub fn draw_geometry<'a>(&'a self, render_pass: &mut wgpu::RenderPass<'a>) {
        render_pass.set_bind_group(1, &self.model_bind_group, &[]);
        render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        render_pass.draw(0..self.vertex_count, 0..1);
    }

    pub fn draw<'a>(&'a self, render_pass: &mut wgpu::RenderPass<'a>) {
        render_pass.set_bind_group(2, &self.material_bind_group, &[]);
        self.draw_geometry(render_pass);
    }
}
