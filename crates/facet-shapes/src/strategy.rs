//! The capability surface every shape implements, and helpers shared by the
//! fixed-topology shapes.

use facet_geometry::{GeoBBox, map_range};
use facet_raster::Canvas;
use glam::{DVec2, DVec3};

use crate::context::ShapeContext;
use crate::densify::Densify;
use crate::error::PrintError;
use crate::kind::ShapeKind;
use crate::print::PrintSheet;
use crate::tile::{Tile, TileFrame, TileId, TileModel, TileQuery, TileSize};

/// Which kind of geometry a transform is applied to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransformKind {
    /// The tile outline, already in raster space.
    Background,
    /// Geographic feature coordinates.
    Feature,
}

pub trait ShapeStrategy: Send + Sync {
    fn kind(&self) -> ShapeKind;

    fn max_zoom(&self) -> u32;

    /// Euler rotation in degrees applied when no other is requested.
    fn default_rotation(&self) -> DVec3 {
        DVec3::ZERO
    }

    fn faces(&self) -> Vec<Vec<usize>>;

    /// Unit vertices before scaling to the sphere radius.
    fn vertices(&self) -> Vec<DVec3>;

    /// Visible tiles for `query`, memoized in the context's tile cache.
    fn tiles(&self, ctx: &mut ShapeContext, query: &TileQuery) -> Vec<Tile>;

    /// Texture size of each tile at `zoom`.
    fn sizes(&self, tiles: &[Tile], zoom: u32) -> Vec<TileSize>;

    /// Raster frame each tile maps to.
    fn frames(&self, tiles: &[Tile], sizes: &[TileSize]) -> Vec<TileFrame> {
        sizes.iter().take(tiles.len()).map(|size| TileFrame::rect(*size)).collect()
    }

    /// Map coordinates into the raster space of `tile`.
    ///
    /// Background input is already in raster space and passes through.
    fn transform(&self, coords: &[DVec2], tile: &Tile, frame: &TileFrame, kind: TransformKind) -> Vec<DVec2> {
        match kind {
            TransformKind::Background => coords.to_vec(),
            TransformKind::Feature => coords
                .iter()
                .map(|c| self.project(*c, tile, frame))
                .collect(),
        }
    }

    /// Raster position of one geographic coordinate.
    fn project(&self, lon_lat: DVec2, tile: &Tile, frame: &TileFrame) -> DVec2;

    /// Segment densification applied to freshly loaded features.
    fn densify(&self) -> Densify {
        Densify::new(10.0, 10)
    }

    /// Arrange rendered tile textures into printable sheets.
    fn pages(&self, sheet: &PrintSheet<'_>) -> Result<Vec<Canvas>, PrintError>;
}

/// One tile per face with fixed geographic boxes.
///
/// `model` receives the face index and the tile surface.
pub(crate) fn face_tiles(
    ctx: &mut ShapeContext,
    zoom: u32,
    bounds: &[&[[f64; 4]]],
    mut include: impl FnMut(usize) -> bool,
    mut surface: impl FnMut(usize, &[DVec3]) -> Vec<DVec3>,
    mut model: impl FnMut(usize, Vec<DVec3>) -> TileModel,
) -> Vec<Tile> {
    let kind = ctx.kind();
    (0..ctx.solid().face_count())
        .filter(|face| include(*face))
        .map(|face| {
            let id = TileId::face(kind, zoom, face);
            ctx.tile_or_insert_with(id, |solid| {
                let surface = surface(face, &solid.planes[face]);
                let boxes = bounds.get(face).copied().unwrap_or(&[]);
                Tile::from_face(id, surface.clone(), solid.centers[face], boxes, model(face, surface))
            })
        })
        .collect()
}

/// Every face's tile size scaled by `multiplier`.
pub(crate) fn scaled_sizes(tiles: &[Tile], multiplier: f64, base: impl Fn(&Tile) -> TileSize) -> Vec<TileSize> {
    tiles.iter().map(|tile| base(tile).scaled(multiplier)).collect()
}

#[inline]
pub(crate) fn zoom_scale(zoom: u32) -> f64 {
    f64::from(1u32 << zoom.min(16))
}

/// Where a longitude falls across a tile's boxes, spread over `span` degrees.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Strip {
    pub bbox: GeoBBox,
    pub index: usize,
    /// Angle within the matched box.
    pub angle: f64,
    /// `angle` plus the share of the preceding box.
    pub alpha: f64,
}

/// Locate `lon` across `boxes`; the last matching box wins.
pub(crate) fn strip(lon: f64, boxes: &[GeoBBox], span: f64) -> Option<Strip> {
    let total: f64 = boxes.iter().map(|b| b.width().abs()).sum();
    let (index, bbox) = boxes
        .iter()
        .enumerate()
        .filter(|(_, b)| lon >= b.min.x && lon <= b.max.x)
        .last()?;
    let angle = if total == span {
        lon - bbox.min.x
    } else {
        map_range(lon - bbox.min.x, 0.0, total, 0.0, span)
    };
    let delta = match index.checked_sub(1).and_then(|i| boxes.get(i)) {
        Some(prev) => map_range(prev.width().abs(), 0.0, total, 0.0, span),
        None => 0.0,
    };
    Some(Strip {
        bbox: *bbox,
        index,
        angle,
        alpha: angle + delta,
    })
}

/// Polar offset of `unit` at `degrees`, measured clockwise from the raster's
/// downward axis.
#[inline]
pub(crate) fn polar(unit: f64, degrees: f64) -> DVec2 {
    let rad = degrees.to_radians();
    DVec2::new(unit * rad.sin(), unit * rad.cos())
}

/// Fit two coordinates of each surface point to the raster box.
pub(crate) fn fit_surface(
    points: &[DVec3],
    axes: (usize, usize),
    size: TileSize,
    flip_y: bool,
) -> Vec<DVec2> {
    let xs: Vec<f64> = points.iter().map(|p| p[axes.0]).collect();
    let ys: Vec<f64> = points.iter().map(|p| p[axes.1]).collect();
    let (min_x, max_x) = min_max(&xs);
    let (min_y, max_y) = min_max(&ys);
    xs.iter()
        .zip(&ys)
        .map(|(x, y)| {
            let px = map_range(*x, min_x, max_x, 0.0, size.width);
            let py = if flip_y {
                map_range(*y, min_y, max_y, size.height, 0.0)
            } else {
                map_range(*y, min_y, max_y, 0.0, size.height)
            };
            DVec2::new(px, py)
        })
        .collect()
}

fn min_max(values: &[f64]) -> (f64, f64) {
    values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(*v), hi.max(*v)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_single_box() {
        let boxes = [GeoBBox::new(-180.0, 45.0, 180.0, 90.0)];
        let s = strip(0.0, &boxes, 360.0).expect("inside");
        assert_eq!(s.angle, 180.0);
        assert_eq!(s.alpha, 180.0);
        assert!(strip(0.0, &[GeoBBox::new(10.0, 0.0, 20.0, 10.0)], 90.0).is_none());
    }

    #[test]
    fn test_strip_split_box_continues_angle() {
        let boxes = [
            GeoBBox::new(135.0, 0.0, 180.0, 90.0),
            GeoBBox::new(-180.0, 0.0, -90.0, 90.0),
        ];
        let east = strip(180.0, &boxes, 90.0).expect("on the seam");
        assert_eq!(east.index, 0, "only the first box reaches +180");
        assert!((east.alpha - 30.0).abs() < 1e-12);
        let west = strip(-180.0, &boxes, 90.0).expect("on the seam");
        assert!((west.alpha - 30.0).abs() < 1e-12, "seam maps to the same angle from both sides");
        let end = strip(-90.0, &boxes, 90.0).expect("far edge");
        assert!((end.alpha - 90.0).abs() < 1e-12);
    }

    #[test]
    fn test_fit_surface() {
        let points = [DVec3::new(0.0, 0.0, -1.0), DVec3::new(0.0, 2.0, 1.0)];
        let fitted = fit_surface(&points, (2, 1), TileSize::new(10.0, 20.0), true);
        assert_eq!(fitted, vec![DVec2::new(0.0, 20.0), DVec2::new(10.0, 0.0)]);
    }
}
