//! WGSL programs and the table of compiled shader modules.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use log::{debug, info};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ShaderError {
    #[error("shader '{name}' failed to compile: {message}")]
    CompilationFailed { name: String, message: String },

    #[error("shader '{name}' not found in library")]
    NotLoaded { name: String },
}

/// Which primitive an entity is drawn as.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Primitive {
    Points,
    Lines,
    Polygons,
}

impl Primitive {
    pub const ALL: [Primitive; 3] = [Primitive::Points, Primitive::Lines, Primitive::Polygons];

    #[must_use]
    pub fn topology(self) -> wgpu::PrimitiveTopology {
        match self {
            Primitive::Points => wgpu::PrimitiveTopology::PointList,
            Primitive::Lines => wgpu::PrimitiveTopology::LineList,
            Primitive::Polygons => wgpu::PrimitiveTopology::TriangleList,
        }
    }
}

/// One entry of the program table: a primitive, flat coloured or textured.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Program {
    pub primitive: Primitive,
    pub textured: bool,
}

impl Program {
    pub const TILE: Program = Program::textured(Primitive::Polygons);
    pub const OUTLINE: Program = Program::flat(Primitive::Lines);

    #[must_use]
    pub const fn flat(primitive: Primitive) -> Self {
        Self {
            primitive,
            textured: false,
        }
    }

    #[must_use]
    pub const fn textured(primitive: Primitive) -> Self {
        Self {
            primitive,
            textured: true,
        }
    }

    /// Every primitive in both variants.
    pub fn all() -> impl Iterator<Item = Program> {
        Primitive::ALL
            .into_iter()
            .flat_map(|p| [Program::flat(p), Program::textured(p)])
    }

    #[must_use]
    pub fn shader_name(self) -> &'static str {
        if self.textured { TEXTURED_SHADER } else { FLAT_SHADER }
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let primitive = match self.primitive {
            Primitive::Points => "points",
            Primitive::Lines => "lines",
            Primitive::Polygons => "polygons",
        };
        if self.textured {
            write!(f, "{primitive}-textured")
        } else {
            f.write_str(primitive)
        }
    }
}

pub const FLAT_SHADER: &str = "flat";
pub const TEXTURED_SHADER: &str = "textured";

/// Entity drawn in its uniform colour.
pub const FLAT_SHADER_SOURCE: &str = r#"
struct Camera {
    view_proj: mat4x4<f32>,
};

struct Entity {
    model: mat4x4<f32>,
    color: vec4<f32>,
};

@group(0) @binding(0) var<uniform> camera: Camera;
@group(1) @binding(0) var<uniform> entity: Entity;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) uv: vec2<f32>,
};

@vertex
fn vs_main(in: VertexInput) -> @builtin(position) vec4<f32> {
    return camera.view_proj * entity.model * vec4<f32>(in.position, 1.0);
}

@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return entity.color;
}
"#;

/// Entity sampling its tile texture; transparent texels leave no depth.
pub const TEXTURED_SHADER_SOURCE: &str = r#"
struct Camera {
    view_proj: mat4x4<f32>,
};

struct Entity {
    model: mat4x4<f32>,
    color: vec4<f32>,
};

@group(0) @binding(0) var<uniform> camera: Camera;
@group(1) @binding(0) var<uniform> entity: Entity;
@group(2) @binding(0) var tile_texture: texture_2d<f32>;
@group(2) @binding(1) var tile_sampler: sampler;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) uv: vec2<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_main(in: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    out.clip_position = camera.view_proj * entity.model * vec4<f32>(in.position, 1.0);
    out.uv = in.uv;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let texel = textureSample(tile_texture, tile_sampler, in.uv) * entity.color;
    if texel.a < 0.01 {
        discard;
    }
    return texel;
}
"#;

/// Compiled shader modules by name.
pub struct ShaderLibrary {
    modules: HashMap<String, Arc<wgpu::ShaderModule>>,
}

impl ShaderLibrary {
    pub fn new() -> Self {
        Self {
            modules: HashMap::new(),
        }
    }

    /// The library with both globe programs compiled.
    pub fn with_builtin(device: &wgpu::Device) -> Result<Self, ShaderError> {
        let mut library = Self::new();
        library.load_from_source(device, FLAT_SHADER, FLAT_SHADER_SOURCE)?;
        library.load_from_source(device, TEXTURED_SHADER, TEXTURED_SHADER_SOURCE)?;
        Ok(library)
    }

    /// Compile WGSL and keep the module under `name`.
    ///
    /// Compilation errors are reported instead of installed, so a broken
    /// program never replaces a working one.
    pub fn load_from_source(
        &mut self,
        device: &wgpu::Device,
        name: &str,
        source: &str,
    ) -> Result<Arc<wgpu::ShaderModule>, ShaderError> {
        debug!("compiling shader '{name}'");
        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(name),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        });
        let compilation = pollster::block_on(module.get_compilation_info());
        let errors: Vec<String> = compilation
            .messages
            .iter()
            .filter(|m| matches!(m.message_type, wgpu::CompilationMessageType::Error))
            .map(|m| m.message.clone())
            .collect();
        if !errors.is_empty() {
            return Err(ShaderError::CompilationFailed {
                name: name.to_string(),
                message: errors.join("; "),
            });
        }

        let module = Arc::new(module);
        if self.modules.insert(name.to_string(), Arc::clone(&module)).is_some() {
            info!("replaced shader '{name}'");
        } else {
            info!("loaded shader '{name}'");
        }
        Ok(module)
    }

    pub fn get(&self, name: &str) -> Result<Arc<wgpu::ShaderModule>, ShaderError> {
        self.modules.get(name).cloned().ok_or_else(|| ShaderError::NotLoaded {
            name: name.to_string(),
        })
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

impl Default for ShaderLibrary {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::create_test_device_queue;

    #[test]
    fn test_program_table_covers_every_variant() {
        let programs: Vec<Program> = Program::all().collect();
        assert_eq!(programs.len(), 6);
        assert!(programs.contains(&Program::TILE));
        assert!(programs.contains(&Program::OUTLINE));
        let names: Vec<String> = programs.iter().map(ToString::to_string).collect();
        assert!(names.contains(&"points-textured".to_string()), "{names:?}");
        assert_eq!(Program::TILE.shader_name(), TEXTURED_SHADER);
        assert_eq!(Program::OUTLINE.shader_name(), FLAT_SHADER);
    }

    #[test]
    fn test_topologies() {
        assert_eq!(Primitive::Points.topology(), wgpu::PrimitiveTopology::PointList);
        assert_eq!(Primitive::Lines.topology(), wgpu::PrimitiveTopology::LineList);
        assert_eq!(Primitive::Polygons.topology(), wgpu::PrimitiveTopology::TriangleList);
    }

    #[test]
    fn test_sources_declare_entry_points() {
        for source in [FLAT_SHADER_SOURCE, TEXTURED_SHADER_SOURCE] {
            assert!(source.contains("fn vs_main"));
            assert!(source.contains("fn fs_main"));
        }
    }

    #[test]
    fn test_missing_shader_is_an_error() {
        let library = ShaderLibrary::new();
        assert!(library.is_empty());
        assert!(matches!(library.get("flat"), Err(ShaderError::NotLoaded { .. })));
    }

    #[test]
    fn test_builtin_programs_compile() {
        let Some((device, _queue)) = create_test_device_queue() else {
            return;
        };
        let library = ShaderLibrary::with_builtin(&device).expect("builtin shaders compile");
        assert_eq!(library.len(), 2);
        let a = library.get(TEXTURED_SHADER).expect("textured");
        let b = library.get(TEXTURED_SHADER).expect("textured");
        assert!(Arc::ptr_eq(&a, &b), "modules are shared, not recompiled");
    }
}
