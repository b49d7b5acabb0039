//! Flexicube: two half cubes hinged at their pyramidal hollows, six square
//! tiles and twelve triangles.

use facet_geometry::map_range;
use facet_raster::Canvas;
use glam::{DVec2, DVec3};

use crate::context::ShapeContext;
use crate::densify::Densify;
use crate::error::PrintError;
use crate::kind::ShapeKind;
use crate::print::{PAGE_BORDER, PrintSheet, blank, border, place};
use crate::strategy::{ShapeStrategy, face_tiles, polar, strip, zoom_scale};
use crate::tile::{Tile, TileFrame, TileModel, TileQuery, TileSize};

const BOUNDS: [&[[f64; 4]]; 18] = [
    &[[-60.0, -90.0, 60.0, 0.0]],
    &[[-180.0, -90.0, -60.0, 0.0]],
    &[[60.0, -90.0, 180.0, 0.0]],
    &[[-180.0, 0.0, -120.0, 90.0]],
    &[[-120.0, 0.0, -60.0, 90.0]],
    &[[-60.0, 0.0, 0.0, 90.0]],
    &[[60.0, 0.0, 120.0, 90.0]],
    &[[120.0, 0.0, 180.0, 90.0]],
    &[[0.0, 0.0, 60.0, 90.0]],
    &[[120.0, 0.0, 180.0, 90.0], [-180.0, 0.0, -120.0, 90.0]],
    &[[-120.0, 0.0, 0.0, 90.0]],
    &[[0.0, 0.0, 120.0, 90.0]],
    &[[120.0, -90.0, 180.0, 0.0]],
    &[[60.0, -90.0, 120.0, 0.0]],
    &[[-120.0, -90.0, -60.0, 0.0]],
    &[[-180.0, -90.0, -120.0, 0.0]],
    &[[0.0, -90.0, 60.0, 0.0]],
    &[[-60.0, -90.0, 0.0, 0.0]],
];

/// Triangle tiles are shorter than they are wide by this ratio.
const TRIANGLE_ASPECT: f64 = 0.7140740033710573;

/// Tiles on each A4-proportioned print page.
const PAGE_UNITS: [[usize; 4]; 6] = [
    [17, 9, 12, 11],
    [16, 13, 14, 12],
    [15, 10, 11, 14],
    [8, 5, 2, 4],
    [7, 3, 0, 2],
    [6, 1, 4, 0],
];
const A4_RATIO: f64 = 29.7 / 21.0;

pub struct Flexicube;

impl ShapeStrategy for Flexicube {
    fn kind(&self) -> ShapeKind {
        ShapeKind::Flexicube
    }

    fn max_zoom(&self) -> u32 {
        2
    }

    fn faces(&self) -> Vec<Vec<usize>> {
        vec![
            vec![0, 3, 6, 4],
            vec![0, 1, 2, 3],
            vec![0, 4, 5, 1],
            vec![7, 1, 2],
            vec![7, 2, 3],
            vec![7, 3, 6],
            vec![7, 4, 5],
            vec![7, 5, 1],
            vec![7, 6, 4],
            vec![10, 11, 8, 5],
            vec![10, 9, 12, 11],
            vec![10, 5, 4, 9],
            vec![13, 8, 5],
            vec![13, 5, 4],
            vec![13, 12, 11],
            vec![13, 11, 8],
            vec![13, 4, 9],
            vec![13, 9, 12],
        ]
    }

    fn vertices(&self) -> Vec<DVec3> {
        [
            [-0.5, -0.5, 1.0],
            [-0.5, 0.5, 1.0],
            [0.5, 0.5, 1.0],
            [0.5, -0.5, 1.0],
            [-0.5, -0.5, 0.0],
            [-0.5, 0.5, 0.0],
            [0.5, -0.5, 0.0],
            [0.0, 0.0, 0.5],
            [0.5, 0.5, 0.0],
            [-0.5, -0.5, -1.0],
            [-0.5, 0.5, -1.0],
            [0.5, 0.5, -1.0],
            [0.5, -0.5, -1.0],
            [0.0, 0.0, -0.5],
        ]
        .into_iter()
        .map(DVec3::from_array)
        .collect()
    }

    fn tiles(&self, ctx: &mut ShapeContext, query: &TileQuery) -> Vec<Tile> {
        face_tiles(
            ctx,
            query.zoom,
            &BOUNDS,
            |_| true,
            |_, plane| plane.to_vec(),
            |_, surface| {
                if surface.len() == 4 {
                    TileModel::new(
                        surface,
                        &[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]],
                        &[0, 3, 1, 3, 2, 1],
                    )
                } else {
                    TileModel::new(surface, &[[0.5, 0.0], [0.0, 1.0], [1.0, 1.0]], &[0, 1, 2])
                }
            },
        )
    }

    fn sizes(&self, tiles: &[Tile], zoom: u32) -> Vec<TileSize> {
        let scale = zoom_scale(zoom);
        tiles
            .iter()
            .map(|tile| {
                let base = if tile.surface.len() == 4 {
                    TileSize::new(512.0, 512.0)
                } else {
                    TileSize::new(512.0, 512.0 * TRIANGLE_ASPECT)
                };
                base.scaled(scale)
            })
            .collect()
    }

    /// Squares fan from a corner over 90 degrees, triangles from their apex
    /// over 70.
    fn project(&self, lon_lat: DVec2, tile: &Tile, frame: &TileFrame) -> DVec2 {
        let (w, h) = (frame.size.width, frame.size.height);
        let square = tile.surface.len() == 4;
        let (span, origin_x, rot) = if square {
            (90.0, 0.0, if tile.face() > 4 { 0.0 } else { 90.0 })
        } else {
            (70.0, w / 2.0, 35.0)
        };
        let Some(s) = strip(lon_lat.x, &tile.bbox, span) else {
            return DVec2::ZERO;
        };
        let reach = match (square, s.index) {
            (true, 1) => h / (45.0 - s.angle).to_radians().cos(),
            (true, _) => {
                let off = if s.angle > 45.0 { 90.0 - s.angle } else { s.angle };
                h / off.to_radians().cos()
            }
            (false, _) => h,
        };
        if s.bbox.max.y > 0.0 {
            let unit = map_range(lon_lat.y, s.bbox.max.y, s.bbox.min.y, 0.0, reach);
            let p = polar(unit, s.alpha - rot);
            DVec2::new(origin_x + p.x, p.y)
        } else {
            let unit = map_range(lon_lat.y, s.bbox.max.y, s.bbox.min.y, reach, 0.0);
            let p = polar(unit, s.alpha - rot);
            DVec2::new(origin_x - p.x, p.y)
        }
    }

    fn densify(&self) -> Densify {
        Densify::new(10.0, 20)
    }

    fn pages(&self, sheet: &PrintSheet<'_>) -> Result<Vec<Canvas>, PrintError> {
        let (tex_w, _) = sheet.reference(0)?;
        let (w, h) = (tex_w * 2.0, tex_w * 2.0 * A4_RATIO);
        let fold = DVec2::new(0.0, h / 2.0);
        let height_of = |idx: usize| sheet.texture(idx).map_or(0.0, |t| f64::from(t.height()));

        PAGE_UNITS
            .iter()
            .map(|[a, b, c, d]| {
                let mut page = blank(w, h)?;
                place(&mut page, sheet, *a, fold, 0.0, DVec2::new(0.0, -1.0));
                place(&mut page, sheet, *b, fold + DVec2::X * w / 2.0, 180.0, DVec2::new(0.0, -1.0));
                place(&mut page, sheet, *c, fold + DVec2::X * w / 2.0, 180.0, DVec2::new(-1.0, -1.0));
                let flap = DVec2::new(w / 4.0, h / 2.0 + height_of(*d));
                place(&mut page, sheet, *d, flap, 110.0, DVec2::new(-0.5, 0.0));
                border(&mut page, PAGE_BORDER);
                Ok(page)
            })
            .collect()
    }
}
