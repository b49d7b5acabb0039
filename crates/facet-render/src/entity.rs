//! GPU-resident drawables.
//!
//! An [`Entity`] exclusively owns its vertex/index buffers, its uniform and
//! at most one texture. Replacing the mesh or the texture destroys the old
//! GPU resource before the new one is installed.

use facet_geometry::ModelTransform;

use crate::buffer::{BufferAllocator, MeshBuffer, MeshData};
use crate::pipeline::{EntityUniform, ProgramTable};
use crate::shader::Program;
use crate::texture::TileTexture;

pub struct Entity {
    label: String,
    program: Program,
    mesh: MeshBuffer,
    texture: Option<TileTexture>,
    transform: ModelTransform,
    color: [f32; 4],
    uniform: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    dirty: bool,
}

impl Entity {
    pub fn new(device: &wgpu::Device, programs: &ProgramTable, label: &str, program: Program, mesh: &MeshData) -> Self {
        let allocator = BufferAllocator::new(device);
        let transform = ModelTransform::default();
        let color = [1.0; 4];
        let uniform = allocator.create_uniform(&format!("{label}-uniform"), bytemuck::bytes_of(&entity_uniform(&transform, color)));
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("{label}-bind-group")),
            layout: &programs.entity_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform.as_entire_binding(),
            }],
        });
        Self {
            label: label.to_string(),
            program,
            mesh: allocator.create_mesh(label, mesh),
            texture: None,
            transform,
            color,
            uniform,
            bind_group,
            dirty: false,
        }
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[must_use]
    pub fn program(&self) -> Program {
        self.program
    }

    #[must_use]
    pub fn index_count(&self) -> u32 {
        self.mesh.index_count
    }

    #[must_use]
    pub fn texture(&self) -> Option<&TileTexture> {
        self.texture.as_ref()
    }

    /// Textured entities draw only once their texture arrived.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        !self.program.textured || self.texture.is_some()
    }

    pub fn set_mesh(&mut self, device: &wgpu::Device, mesh: &MeshData) {
        self.mesh.destroy();
        self.mesh = BufferAllocator::new(device).create_mesh(&self.label, mesh);
    }

    pub fn set_texture(&mut self, texture: TileTexture) {
        if let Some(old) = self.texture.replace(texture) {
            old.destroy();
        }
    }

    pub fn set_transform(&mut self, transform: ModelTransform) {
        self.transform = transform;
        self.dirty = true;
    }

    pub fn set_color(&mut self, color: [f32; 4]) {
        self.color = color;
        self.dirty = true;
    }

    /// Upload a changed transform or colour.
    pub fn sync(&mut self, queue: &wgpu::Queue) {
        if self.dirty {
            queue.write_buffer(&self.uniform, 0, bytemuck::bytes_of(&entity_uniform(&self.transform, self.color)));
            self.dirty = false;
        }
    }

    /// Record the draw; bind group 0 (camera) must already be set.
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>, programs: &ProgramTable) {
        if !self.is_ready() {
            return;
        }
        let Some(pipeline) = programs.pipeline(self.program) else {
            return;
        };
        pass.set_pipeline(pipeline);
        pass.set_bind_group(1, &self.bind_group, &[]);
        if let Some(texture) = &self.texture {
            pass.set_bind_group(2, &texture.bind_group, &[]);
        }
        self.mesh.draw(pass);
    }

    /// Release every GPU resource now.
    pub fn destroy(self) {
        self.mesh.destroy();
        if let Some(texture) = &self.texture {
            texture.destroy();
        }
        self.uniform.destroy();
    }
}

fn entity_uniform(transform: &ModelTransform, color: [f32; 4]) -> EntityUniform {
    EntityUniform {
        model: transform.matrix().as_mat4().to_cols_array_2d(),
        color,
    }
}
