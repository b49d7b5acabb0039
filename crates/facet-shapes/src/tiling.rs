//! View-driven tile enumeration on top of a [`ShapeContext`].

use facet_geometry::{Solid, rings_to_wkt};
use glam::DVec3;
use tracing::{debug, info};

use crate::context::{ShapeContext, TilingParams};
use crate::kind::ShapeKind;
use crate::strategy::ShapeStrategy;
use crate::tile::{Tile, TileFrame, TileQuery, TileSize};

/// Tracks the current view and its tile set.
///
/// A zoom or shape change starts over with a fresh context so stale tiles
/// from the previous selection never leak into the cache.
#[derive(Debug)]
pub struct TilingEngine {
    ctx: ShapeContext,
    rotation: Option<DVec3>,
    params: TilingParams,
    query: Option<TileQuery>,
    tiles: Vec<Tile>,
}

impl TilingEngine {
    #[must_use]
    pub fn new(kind: ShapeKind, rotation: Option<DVec3>, params: TilingParams) -> Self {
        Self {
            ctx: ShapeContext::setup(kind, rotation, params),
            rotation,
            params,
            query: None,
            tiles: Vec::new(),
        }
    }

    #[inline]
    #[must_use]
    pub fn kind(&self) -> ShapeKind {
        self.ctx.kind()
    }

    #[inline]
    #[must_use]
    pub fn strategy(&self) -> &'static dyn ShapeStrategy {
        self.ctx.strategy()
    }

    #[inline]
    #[must_use]
    pub fn solid(&self) -> &Solid {
        self.ctx.solid()
    }

    #[inline]
    #[must_use]
    pub fn context(&self) -> &ShapeContext {
        &self.ctx
    }

    #[must_use]
    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    /// The last query, with its zoom clamped to the shape.
    #[must_use]
    pub fn query(&self) -> Option<&TileQuery> {
        self.query.as_ref()
    }

    #[must_use]
    pub fn zoom(&self) -> u32 {
        self.query.map_or(0, |q| q.zoom)
    }

    /// Switch to another solid, dropping every cached tile.
    pub fn set_shape(&mut self, kind: ShapeKind, rotation: Option<DVec3>) {
        info!(shape = %kind, "shape selected");
        self.rotation = rotation;
        self.ctx = ShapeContext::setup(kind, rotation, self.params);
        self.query = None;
        self.tiles.clear();
    }

    /// Recompute the visible tiles for a new view.
    pub fn update(&mut self, query: &TileQuery) -> &[Tile] {
        let query = TileQuery {
            zoom: query.zoom.min(self.strategy().max_zoom()),
            ..*query
        };
        if self.query.is_some_and(|last| last.zoom != query.zoom) {
            debug!(from = self.zoom(), to = query.zoom, "zoom changed, resetting tile cache");
            self.ctx = ShapeContext::setup(self.kind(), self.rotation, self.params);
        }
        let mut tiles = self.ctx.tiles(&query);
        for tile in &mut tiles {
            if tile.wkt.is_empty() {
                tile.wkt = rings_to_wkt(&tile.bounds);
            }
        }
        debug!(shape = %self.kind(), zoom = query.zoom, count = tiles.len(), "tiles updated");
        self.query = Some(query);
        self.tiles = tiles;
        &self.tiles
    }

    /// Texture size per current tile, multiplied by `scale`.
    #[must_use]
    pub fn sizes(&self, scale: f64) -> Vec<TileSize> {
        self.strategy()
            .sizes(&self.tiles, self.zoom())
            .into_iter()
            .map(|size| size.scaled(scale))
            .collect()
    }

    #[must_use]
    pub fn frames(&self, sizes: &[TileSize]) -> Vec<TileFrame> {
        self.strategy().frames(&self.tiles, sizes)
    }
}

#[cfg(test)]
mod tests {
    use facet_geometry::geo_to_xyz;
    use glam::DVec2;

    use super::*;

    #[test]
    fn test_update_fills_wkt() {
        let mut engine = TilingEngine::new(ShapeKind::Cube, None, TilingParams::default());
        let tiles = engine.update(&TileQuery::new(0, DVec2::ZERO));
        assert_eq!(tiles.len(), 6);
        for tile in tiles {
            assert_eq!(tile.wkt.len(), tile.bounds.len(), "{}: one polygon per ring", tile.id);
            assert!(tile.wkt.iter().all(|w| w.starts_with("POLYGON((")));
        }
    }

    #[test]
    fn test_identities_stable_across_updates() {
        let mut engine = TilingEngine::new(ShapeKind::Icosahedron, None, TilingParams::default());
        let query = TileQuery::new(2, DVec2::new(12.0, 45.0));
        let first: Vec<_> = engine.update(&query).iter().map(|t| t.id).collect();
        let second: Vec<_> = engine.update(&query).iter().map(|t| t.id).collect();
        assert_eq!(first, second);
        let mut other = TilingEngine::new(ShapeKind::Icosahedron, None, TilingParams::default());
        other.update(&TileQuery::new(0, DVec2::ZERO));
        let third: Vec<_> = other.update(&query).iter().map(|t| t.id).collect();
        assert_eq!(first, third, "a zoom round trip reproduces the same ids");
    }

    #[test]
    fn test_zoom_change_resets_cache() {
        let mut engine = TilingEngine::new(ShapeKind::Pyramid, None, TilingParams::default());
        engine.update(&TileQuery::new(0, DVec2::ZERO));
        assert_eq!(engine.context().cached_tiles(), 4);
        engine.update(&TileQuery::new(1, DVec2::ZERO));
        assert_eq!(engine.context().cached_tiles(), 4, "zoom 0 tiles dropped");
        assert!(engine.tiles().iter().all(|t| t.id.zoom == 1));
    }

    #[test]
    fn test_zoom_is_clamped() {
        let mut engine = TilingEngine::new(ShapeKind::Lily, None, TilingParams::default());
        engine.update(&TileQuery::new(7, DVec2::ZERO));
        assert_eq!(engine.zoom(), 2);
        assert_eq!(engine.sizes(1.0)[0], TileSize::new(1024.0, 394.582 * 4.0));
        assert_eq!(engine.sizes(0.5)[0], TileSize::new(512.0, 394.582 * 2.0));
    }

    #[test]
    fn test_shape_switch() {
        let mut engine = TilingEngine::new(ShapeKind::Cube, None, TilingParams::default());
        engine.update(&TileQuery::new(0, DVec2::ZERO));
        engine.set_shape(ShapeKind::Spinner, None);
        assert!(engine.tiles().is_empty());
        let camera = geo_to_xyz(DVec2::new(20.0, 30.0)) * 3.0;
        let visible = engine.update(&TileQuery::new(0, DVec2::ZERO).with_camera(camera)).len();
        assert!(visible < 24 && visible > 0, "spinner culls against the camera");
        assert_eq!(engine.frames(&engine.sizes(1.0)).len(), visible);
    }
}
