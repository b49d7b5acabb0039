//! The live globe: tile entities, graticule and the per-frame draw.

use std::collections::BTreeMap;

use facet_geometry::Solid;
use facet_shapes::{Tile, TileId};
use glam::DVec3;
use image::RgbaImage;

use crate::buffer::{BufferAllocator, MeshData};
use crate::camera::Camera;
use crate::depth::DepthBuffer;
use crate::entity::Entity;
use crate::gpu::{RenderContext, SurfaceError};
use crate::pass::{FrameEncoder, RenderPassBuilder};
use crate::pipeline::{CameraUniform, ProgramTable};
use crate::shader::{Program, ShaderError};
use crate::texture::TextureError;

/// Graticule line colour.
pub const GRATICULE_COLOR: [f32; 4] = [0.25, 0.25, 0.25, 1.0];

/// Lines sit this far outside the surface so tiles never hide them.
const GRATICULE_LIFT: f64 = 1.002;

/// Outlines of every solid face and every current tile.
#[must_use]
pub fn graticule_mesh(solid: &Solid, tiles: &[Tile]) -> MeshData {
    let lifted = |ring: &[DVec3]| ring.iter().map(|p| *p * GRATICULE_LIFT).collect::<Vec<_>>();
    let rings: Vec<Vec<DVec3>> = solid
        .planes
        .iter()
        .map(|plane| lifted(plane))
        .chain(tiles.iter().map(|tile| lifted(&tile.surface)))
        .collect();
    MeshData::outlines(rings.iter().map(Vec::as_slice))
}

/// Owns every GPU resource of the view.
///
/// Tile entities are created and destroyed in step with the tile set and
/// drawn before the graticule.
pub struct GlobeRenderer {
    programs: ProgramTable,
    depth: DepthBuffer,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    tiles: BTreeMap<TileId, Entity>,
    graticule: Option<Entity>,
}

impl GlobeRenderer {
    pub fn new(ctx: &RenderContext) -> Result<Self, ShaderError> {
        let programs = ProgramTable::new(&ctx.device, ctx.surface_format)?;
        let (width, height) = ctx.size();
        let depth = DepthBuffer::new(&ctx.device, width, height);
        let camera_buffer = BufferAllocator::new(&ctx.device)
            .create_uniform("camera-uniform", bytemuck::bytes_of(&CameraUniform { view_proj: [[0.0; 4]; 4] }));
        let camera_bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("camera-bind-group"),
            layout: &programs.camera_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
        });
        Ok(Self {
            programs,
            depth,
            camera_buffer,
            camera_bind_group,
            tiles: BTreeMap::new(),
            graticule: None,
        })
    }

    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.depth.resize(device, width, height);
    }

    /// Make the tile entities match `tiles`: new ids get a mesh, ids no
    /// longer visible are destroyed, the rest keep their texture.
    pub fn sync_tiles(&mut self, device: &wgpu::Device, tiles: &[Tile]) {
        let keep: BTreeMap<TileId, &Tile> = tiles.iter().map(|t| (t.id, t)).collect();
        let stale: Vec<TileId> = self.tiles.keys().filter(|id| !keep.contains_key(id)).copied().collect();
        for id in stale {
            if let Some(entity) = self.tiles.remove(&id) {
                entity.destroy();
            }
        }
        for (id, tile) in keep {
            self.tiles.entry(id).or_insert_with(|| {
                Entity::new(device, &self.programs, &id.key(), Program::TILE, &MeshData::from_tile_model(&tile.model))
            });
        }
        log::debug!("{} tile entities live", self.tiles.len());
    }

    /// Install a freshly composited texture; unknown tiles are ignored.
    pub fn set_tile_texture(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        id: &TileId,
        image: &RgbaImage,
    ) -> Result<bool, TextureError> {
        let Some(entity) = self.tiles.get_mut(id) else {
            return Ok(false);
        };
        let texture = self.programs.textures.upload(device, queue, &id.key(), image)?;
        entity.set_texture(texture);
        Ok(true)
    }

    /// Replace the graticule lines; an empty mesh removes them.
    pub fn set_graticule(&mut self, device: &wgpu::Device, mesh: &MeshData) {
        if let Some(old) = self.graticule.take() {
            old.destroy();
        }
        if mesh.is_empty() {
            return;
        }
        let mut entity = Entity::new(device, &self.programs, "graticule", Program::OUTLINE, mesh);
        entity.set_color(GRATICULE_COLOR);
        self.graticule = Some(entity);
    }

    /// Destroy every entity, as a shape change requires.
    pub fn clear(&mut self) {
        for (_, entity) in std::mem::take(&mut self.tiles) {
            entity.destroy();
        }
        if let Some(old) = self.graticule.take() {
            old.destroy();
        }
    }

    #[must_use]
    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    /// Tiles still waiting for a texture.
    #[must_use]
    pub fn pending_textures(&self) -> usize {
        self.tiles.values().filter(|e| !e.is_ready()).count()
    }

    #[must_use]
    pub fn needs_texture(&self, id: &TileId) -> bool {
        self.tiles.get(id).is_some_and(|e| !e.is_ready())
    }

    /// Draw one frame: camera upload, clear, tiles, then graticule.
    pub fn render(&mut self, ctx: &RenderContext, camera: &Camera, background: wgpu::Color) -> Result<(), SurfaceError> {
        let (width, height) = ctx.size();
        let uniform = camera.to_uniform(f64::from(width), f64::from(height));
        ctx.queue.write_buffer(&self.camera_buffer, 0, bytemuck::bytes_of(&uniform));
        for entity in self.tiles.values_mut().chain(self.graticule.as_mut()) {
            entity.sync(&ctx.queue);
        }

        let surface_texture = ctx.get_current_texture()?;
        let mut frame = FrameEncoder::new(&ctx.device, &ctx.queue, surface_texture);
        let builder = RenderPassBuilder::new().clear_color(background).with_depth().label("globe-pass");
        {
            let mut pass = frame.begin_render_pass(&builder, Some(&self.depth));
            pass.set_bind_group(0, &self.camera_bind_group, &[]);
            for entity in self.tiles.values().chain(self.graticule.as_ref()) {
                entity.draw(&mut pass, &self.programs);
            }
        }
        frame.submit();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use facet_shapes::{ShapeKind, TileQuery, TilingEngine, TilingParams};
    use glam::DVec2;

    use super::*;

    #[test]
    fn test_graticule_outlines_faces_and_tiles() {
        let mut engine = TilingEngine::new(ShapeKind::Cube, None, TilingParams::default());
        engine.update(&TileQuery::new(0, DVec2::ZERO));
        let mesh = graticule_mesh(engine.solid(), engine.tiles());
        let corners: usize = engine.solid().planes.iter().map(Vec::len).sum::<usize>()
            + engine.tiles().iter().map(|t| t.surface.len()).sum::<usize>();
        assert_eq!(mesh.vertices.len(), corners);
        assert_eq!(mesh.indices.len(), corners * 2, "one segment per corner");

        let radius = engine.solid().planes[0][0].length();
        let lifted = glam::Vec3::from_array(mesh.vertices[0].position).length() as f64;
        assert!(lifted > radius, "lines float above the faces");
    }
}
