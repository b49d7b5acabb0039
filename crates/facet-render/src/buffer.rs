//! Globe vertex format, CPU mesh data and GPU vertex/index buffers.

use bytemuck::{Pod, Zeroable};
use facet_shapes::TileModel;
use glam::DVec3;
use wgpu::util::DeviceExt;

/// Position plus texture coordinate; untextured programs ignore the UV.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct GlobeVertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
}

impl GlobeVertex {
    #[must_use]
    pub fn new(position: DVec3, uv: [f64; 2]) -> Self {
        Self {
            position: position.as_vec3().to_array(),
            uv: [uv[0] as f32, uv[1] as f32],
        }
    }

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        const ATTRIBUTES: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x2];
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<GlobeVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &ATTRIBUTES,
        }
    }
}

/// Mesh geometry before upload.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<GlobeVertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    /// The textured triangles of one tile.
    #[must_use]
    pub fn from_tile_model(model: &TileModel) -> Self {
        let vertices = model
            .positions
            .iter()
            .enumerate()
            .map(|(idx, p)| {
                let uv = model.uvs.get(idx).map_or([0.0, 0.0], |uv| uv.to_array());
                GlobeVertex::new(*p, uv)
            })
            .collect();
        Self {
            vertices,
            indices: model.indices.clone(),
        }
    }

    /// Closed polygon outlines as a line list.
    #[must_use]
    pub fn outlines<'a>(rings: impl IntoIterator<Item = &'a [DVec3]>) -> Self {
        let mut mesh = Self::default();
        for ring in rings {
            if ring.len() < 2 {
                continue;
            }
            let base = mesh.vertices.len() as u32;
            mesh.vertices.extend(ring.iter().map(|p| GlobeVertex::new(*p, [0.0, 0.0])));
            let n = ring.len() as u32;
            for idx in 0..n {
                mesh.indices.push(base + idx);
                mesh.indices.push(base + (idx + 1) % n);
            }
        }
        mesh
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Uploaded vertex and index buffers of one entity.
#[derive(Debug)]
pub struct MeshBuffer {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
}

impl MeshBuffer {
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        if self.index_count == 0 {
            return;
        }
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        pass.draw_indexed(0..self.index_count, 0, 0..1);
    }

    /// Free the GPU memory now instead of when the last handle drops.
    pub fn destroy(&self) {
        self.vertex_buffer.destroy();
        self.index_buffer.destroy();
    }
}

pub struct BufferAllocator<'a> {
    device: &'a wgpu::Device,
}

impl<'a> BufferAllocator<'a> {
    pub fn new(device: &'a wgpu::Device) -> Self {
        Self { device }
    }

    pub fn create_mesh(&self, label: &str, mesh: &MeshData) -> MeshBuffer {
        MeshBuffer {
            vertex_buffer: self.create_buffer(&format!("{label}-vertices"), bytemuck::cast_slice(&mesh.vertices), wgpu::BufferUsages::VERTEX),
            index_buffer: self.create_buffer(&format!("{label}-indices"), bytemuck::cast_slice(&mesh.indices), wgpu::BufferUsages::INDEX),
            index_count: mesh.indices.len() as u32,
        }
    }

    /// A uniform buffer that is rewritten through the queue.
    pub fn create_uniform(&self, label: &str, contents: &[u8]) -> wgpu::Buffer {
        self.create_buffer(label, contents, wgpu::BufferUsages::UNIFORM)
    }

    fn create_buffer(&self, label: &str, contents: &[u8], usage: wgpu::BufferUsages) -> wgpu::Buffer {
        self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents,
            usage: usage | wgpu::BufferUsages::COPY_DST,
        })
    }
}
