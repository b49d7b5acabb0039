//! Per-selection state: the built solid and the tile cache.

use facet_geometry::{EARTH_RADIUS, ModelTransform, Solid};
use glam::DVec3;
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::kind::ShapeKind;
use crate::strategy::ShapeStrategy;
use crate::tile::{Tile, TileId, TileQuery};

/// Tunables for adaptive tile search.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TilingParams {
    /// Upper bound on tiles returned by a neighbor search.
    pub neighbor_cap: usize,
    /// Search radius as a multiple of `radius / 2^zoom`.
    pub neighbor_distance_factor: f64,
}

impl Default for TilingParams {
    fn default() -> Self {
        Self {
            neighbor_cap: 20,
            neighbor_distance_factor: 2.5,
        }
    }
}

/// Owns the solid and tile cache for one shape selection.
///
/// Changing shape, rotation or zoom means building a fresh context rather
/// than mutating this one.
#[derive(Debug)]
pub struct ShapeContext {
    kind: ShapeKind,
    rotation: DVec3,
    solid: Solid,
    params: TilingParams,
    tiles: FxHashMap<TileId, Tile>,
}

impl ShapeContext {
    /// Build the solid for `kind`, rotated by `rotation` or the shape default.
    #[must_use]
    pub fn setup(kind: ShapeKind, rotation: Option<DVec3>, params: TilingParams) -> Self {
        let strategy = kind.strategy();
        let rotation = rotation.unwrap_or_else(|| strategy.default_rotation());
        let solid = Solid::build(
            &strategy.faces(),
            &strategy.vertices(),
            &ModelTransform::rotated(rotation),
            EARTH_RADIUS,
        );
        debug!(shape = %kind, faces = solid.face_count(), "solid built");
        Self {
            kind,
            rotation,
            solid,
            params,
            tiles: FxHashMap::default(),
        }
    }

    #[inline]
    #[must_use]
    pub fn kind(&self) -> ShapeKind {
        self.kind
    }

    #[inline]
    #[must_use]
    pub fn rotation(&self) -> DVec3 {
        self.rotation
    }

    #[inline]
    #[must_use]
    pub fn solid(&self) -> &Solid {
        &self.solid
    }

    #[inline]
    #[must_use]
    pub fn params(&self) -> &TilingParams {
        &self.params
    }

    #[inline]
    #[must_use]
    pub fn strategy(&self) -> &'static dyn ShapeStrategy {
        self.kind.strategy()
    }

    /// Visible tiles for `query`; zoom is clamped to the shape's maximum.
    pub fn tiles(&mut self, query: &TileQuery) -> Vec<Tile> {
        let strategy = self.strategy();
        let query = TileQuery {
            zoom: query.zoom.min(strategy.max_zoom()),
            ..*query
        };
        strategy.tiles(self, &query)
    }

    #[must_use]
    pub fn cached_tiles(&self) -> usize {
        self.tiles.len()
    }

    /// A cached tile, or one built from the solid and remembered.
    pub(crate) fn tile_or_insert_with(&mut self, id: TileId, build: impl FnOnce(&Solid) -> Tile) -> Tile {
        let Self { solid, tiles, .. } = self;
        tiles.entry(id).or_insert_with(|| build(solid)).clone()
    }
}

#[cfg(test)]
mod tests {
    use glam::DVec2;

    use super::*;

    #[test]
    fn test_tiles_are_memoized() {
        let mut ctx = ShapeContext::setup(ShapeKind::Cube, None, TilingParams::default());
        let first = ctx.tiles(&TileQuery::new(0, DVec2::ZERO));
        assert_eq!(ctx.cached_tiles(), 6);
        let second = ctx.tiles(&TileQuery::new(0, DVec2::new(40.0, 10.0)));
        assert_eq!(first, second, "same zoom returns identical tiles");
        assert_eq!(ctx.cached_tiles(), 6);
    }

    #[test]
    fn test_zoom_clamped_to_shape_maximum() {
        let mut ctx = ShapeContext::setup(ShapeKind::Pyramid, None, TilingParams::default());
        let tiles = ctx.tiles(&TileQuery::new(9, DVec2::ZERO));
        assert!(tiles.iter().all(|t| t.id.zoom == 2), "pyramid stops at zoom 2");
    }

    #[test]
    fn test_default_rotation_used() {
        let ctx = ShapeContext::setup(ShapeKind::Icosahedron, None, TilingParams::default());
        assert_eq!(ctx.rotation(), DVec3::splat(30.0));
        let ctx = ShapeContext::setup(ShapeKind::Icosahedron, Some(DVec3::ZERO), TilingParams::default());
        assert_eq!(ctx.rotation(), DVec3::ZERO);
    }
}
