//! wgpu substrate for the live globe.
//!
//! One program per primitive kind, each in a flat and a textured variant,
//! draws GPU-owned entities: textured tile meshes first, then graticule
//! lines. Frames are paced by [`FrameClock`] independently of tile loading.

mod buffer;
mod camera;
mod depth;
mod entity;
mod frame_loop;
mod globe;
mod gpu;
mod pass;
mod pipeline;
mod shader;
mod texture;

pub use buffer::{BufferAllocator, GlobeVertex, MeshBuffer, MeshData};
pub use camera::{Camera, Orbit, Projection};
pub use depth::DepthBuffer;
pub use entity::Entity;
pub use frame_loop::{DEFAULT_FPS, FrameClock, FrameTick, MAX_FRAME_TIME};
pub use globe::{GRATICULE_COLOR, GlobeRenderer, graticule_mesh};
pub use gpu::{RenderContext, RenderContextError, SurfaceError, init_render_context_blocking};
pub use pass::{DEFAULT_BACKGROUND, FrameEncoder, RenderPassBuilder, clear_color};
pub use pipeline::{CameraUniform, EntityUniform, ProgramTable};
pub use shader::{
    FLAT_SHADER, FLAT_SHADER_SOURCE, Primitive, Program, ShaderError, ShaderLibrary, TEXTURED_SHADER,
    TEXTURED_SHADER_SOURCE,
};
pub use texture::{TILE_FORMAT, TextureBinder, TextureError, TileTexture};
