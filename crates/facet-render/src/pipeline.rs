//! Render pipelines for every [`Program`], plus the uniform layouts they share.

use std::collections::HashMap;
use std::num::NonZeroU64;

use bytemuck::{Pod, Zeroable};

use crate::buffer::GlobeVertex;
use crate::depth::DepthBuffer;
use crate::shader::{Program, ShaderError, ShaderLibrary};
use crate::texture::TextureBinder;

/// Group 0: the camera's view-projection matrix.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
}

/// Group 1: per-entity model matrix and tint.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct EntityUniform {
    pub model: [[f32; 4]; 4],
    pub color: [f32; 4],
}

fn uniform_layout(device: &wgpu::Device, label: &str, size: u64) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(label),
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: NonZeroU64::new(size),
            },
            count: None,
        }],
    })
}

/// Name to compiled program, built once per device.
pub struct ProgramTable {
    pub camera_layout: wgpu::BindGroupLayout,
    pub entity_layout: wgpu::BindGroupLayout,
    pub textures: TextureBinder,
    pipelines: HashMap<Program, wgpu::RenderPipeline>,
}

impl ProgramTable {
    /// Compile both shaders and build all six pipelines.
    ///
    /// A shader that fails to compile is fatal for the globe view.
    pub fn new(device: &wgpu::Device, surface_format: wgpu::TextureFormat) -> Result<Self, ShaderError> {
        let library = ShaderLibrary::with_builtin(device)?;
        let camera_layout = uniform_layout(device, "camera-layout", std::mem::size_of::<CameraUniform>() as u64);
        let entity_layout = uniform_layout(device, "entity-layout", std::mem::size_of::<EntityUniform>() as u64);
        let textures = TextureBinder::new(device);

        let flat_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("flat-pipeline-layout"),
            bind_group_layouts: &[&camera_layout, &entity_layout],
            immediate_size: 0,
        });
        let textured_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("textured-pipeline-layout"),
            bind_group_layouts: &[&camera_layout, &entity_layout, textures.layout()],
            immediate_size: 0,
        });

        let mut pipelines = HashMap::new();
        for program in Program::all() {
            let shader = library.get(program.shader_name())?;
            let layout = if program.textured { &textured_layout } else { &flat_layout };
            let pipeline = create_pipeline(device, program, &shader, layout, surface_format);
            pipelines.insert(program, pipeline);
        }
        log::info!("built {} globe programs", pipelines.len());

        Ok(Self {
            camera_layout,
            entity_layout,
            textures,
            pipelines,
        })
    }

    pub fn pipeline(&self, program: Program) -> Option<&wgpu::RenderPipeline> {
        self.pipelines.get(&program)
    }

    pub fn len(&self) -> usize {
        self.pipelines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pipelines.is_empty()
    }
}

fn create_pipeline(
    device: &wgpu::Device,
    program: Program,
    shader: &wgpu::ShaderModule,
    layout: &wgpu::PipelineLayout,
    surface_format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    let label = program.to_string();
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(&label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            buffers: &[GlobeVertex::layout()],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        primitive: wgpu::PrimitiveState {
            topology: program.primitive.topology(),
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            // Tile windings differ between solids; depth sorts the far side.
            cull_mode: None,
            unclipped_depth: false,
            polygon_mode: wgpu::PolygonMode::Fill,
            conservative: false,
        },
        depth_stencil: Some(DepthBuffer::stencil_state()),
        multisample: wgpu::MultisampleState::default(),
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format: surface_format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        multiview_mask: None,
        cache: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::create_test_device_queue;

    #[test]
    fn test_uniform_sizes() {
        assert_eq!(std::mem::size_of::<CameraUniform>(), 64);
        assert_eq!(std::mem::size_of::<EntityUniform>(), 80, "mat4x4 + vec4");
    }

    #[test]
    fn test_program_table_builds_every_pipeline() {
        let Some((device, _queue)) = create_test_device_queue() else {
            return;
        };
        let table = ProgramTable::new(&device, wgpu::TextureFormat::Bgra8UnormSrgb).expect("programs");
        assert_eq!(table.len(), 6);
        assert!(Program::all().all(|p| table.pipeline(p).is_some()));
    }
}
