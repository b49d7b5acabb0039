//! Lotus: a square base fanned into four southern triangles, four outer
//! petals and four square northern petals.

use std::f64::consts::FRAC_PI_4;

use facet_geometry::map_range;
use facet_raster::Canvas;
use glam::{DMat3, DVec2, DVec3};

use crate::context::ShapeContext;
use crate::densify::Densify;
use crate::error::PrintError;
use crate::kind::ShapeKind;
use crate::print::{PAGE_BORDER, PrintSheet, blank, border, place};
use crate::strategy::{ShapeStrategy, face_tiles, fit_surface, polar, zoom_scale};
use crate::tile::{Tile, TileFrame, TileModel, TileQuery, TileSize};

const BOUNDS: [&[[f64; 4]]; 12] = [
    &[[-90.0, -90.0, 0.0, 0.0]],
    &[[-180.0, -90.0, -90.0, 0.0]],
    &[[90.0, -90.0, 180.0, 0.0]],
    &[[0.0, -90.0, 90.0, 0.0]],
    &[[-90.0, 0.0, 0.0, 90.0]],
    &[[-180.0, 0.0, -90.0, 90.0]],
    &[[90.0, 0.0, 180.0, 90.0]],
    &[[0.0, 0.0, 90.0, 90.0]],
    &[[-45.0, 0.0, 45.0, 90.0]],
    &[[-135.0, 0.0, -45.0, 90.0]],
    &[[135.0, 0.0, 180.0, 90.0], [-180.0, 0.0, -135.0, 90.0]],
    &[[45.0, 0.0, 135.0, 90.0]],
];

/// Base unit of the petal tiles: the quarter side of a `unit` square.
struct Dimensions {
    quarter: f64,
    eighth: f64,
    triangle_height: f64,
    triangle_width: f64,
}

impl Dimensions {
    fn new(unit: f64) -> Self {
        let quarter = unit / 4.0;
        Self {
            quarter,
            eighth: unit / 8.0,
            triangle_height: quarter * FRAC_PI_4.sin(),
            triangle_width: quarter * 2f64.sqrt(),
        }
    }
}

/// Size of the two triangular petal rows, shared with the butterfly.
pub(crate) fn triangle_size() -> TileSize {
    let d = Dimensions::new(256.0);
    TileSize::new(d.triangle_width, d.triangle_height)
}

#[inline]
fn row(face: usize) -> usize {
    face / 4
}

pub struct Lotus;

impl ShapeStrategy for Lotus {
    fn kind(&self) -> ShapeKind {
        ShapeKind::Lotus
    }

    fn max_zoom(&self) -> u32 {
        2
    }

    fn faces(&self) -> Vec<Vec<usize>> {
        vec![
            vec![0, 1, 2],
            vec![0, 2, 3],
            vec![0, 3, 4],
            vec![0, 4, 1],
            vec![5, 1, 2],
            vec![6, 2, 3],
            vec![7, 3, 4],
            vec![8, 4, 1],
            vec![1, 10, 9, 11],
            vec![2, 14, 12, 13],
            vec![3, 17, 15, 16],
            vec![4, 19, 18, 20],
        ]
    }

    fn vertices(&self) -> Vec<DVec3> {
        let d = Dimensions::new(2.0);
        let (q, e) = (d.quarter, d.eighth);
        let floor = -q / 2.0;
        let rise = d.triangle_height * FRAC_PI_4.sin();
        let side = e + rise * FRAC_PI_4.sin();
        vec![
            DVec3::new(0.0, floor, 0.0),
            DVec3::new(0.0, floor, q),
            DVec3::new(q, floor, 0.0),
            DVec3::new(0.0, floor, -q),
            DVec3::new(-q, floor, 0.0),
            DVec3::new(side, floor + rise, side),
            DVec3::new(side, floor + rise, -side),
            DVec3::new(-side, floor + rise, -side),
            DVec3::new(-side, floor + rise, side),
            DVec3::new(0.0, q / 2.0, q),
            DVec3::new(-e, 0.0, q),
            DVec3::new(e, 0.0, q),
            DVec3::new(q, q / 2.0, 0.0),
            DVec3::new(q, 0.0, -e),
            DVec3::new(q, 0.0, e),
            DVec3::new(0.0, q / 2.0, -q),
            DVec3::new(-e, 0.0, -q),
            DVec3::new(e, 0.0, -q),
            DVec3::new(-q, q / 2.0, 0.0),
            DVec3::new(-q, 0.0, -e),
            DVec3::new(-q, 0.0, e),
        ]
    }

    fn tiles(&self, ctx: &mut ShapeContext, query: &TileQuery) -> Vec<Tile> {
        face_tiles(
            ctx,
            query.zoom,
            &BOUNDS,
            |_| true,
            |_, plane| plane.to_vec(),
            |face, surface| match row(face) {
                0 => TileModel::new(surface, &[[0.5, 1.0], [1.0, 0.0], [0.0, 0.0]], &[0, 1, 2]),
                1 => TileModel::new(surface, &[[0.5, 0.0], [1.0, 1.0], [0.0, 1.0]], &[0, 2, 1]),
                _ => TileModel::new(
                    surface,
                    &[[0.5, 1.0], [1.0, 0.5], [0.5, 0.0], [0.0, 0.5]],
                    &[0, 1, 3, 3, 1, 2],
                ),
            },
        )
    }

    fn sizes(&self, tiles: &[Tile], zoom: u32) -> Vec<TileSize> {
        let factor = zoom_scale(zoom) + 4.0;
        let d = Dimensions::new(256.0);
        tiles
            .iter()
            .map(|tile| match row(tile.face()) {
                0 | 1 => triangle_size().scaled(factor),
                _ => TileSize::new(d.quarter, d.quarter).scaled(factor),
            })
            .collect()
    }

    fn frames(&self, tiles: &[Tile], sizes: &[TileSize]) -> Vec<TileFrame> {
        tiles
            .iter()
            .zip(sizes)
            .map(|(tile, size)| {
                let idx = tile.face();
                let even = idx % 2 == 0;
                let surface = if row(idx) < 2 {
                    let turn = DMat3::from_rotation_y(((idx % 4) as f64 * 90.0 - 45.0).to_radians());
                    let turned: Vec<DVec3> = tile.surface.iter().map(|p| turn * *p).collect();
                    fit_surface(&turned, (0, 2), *size, even)
                } else {
                    let axes = if even { (0, 1) } else { (1, 2) };
                    fit_surface(&tile.surface, axes, *size, true)
                };
                TileFrame {
                    size: *size,
                    surface,
                    plane: None,
                }
            })
            .collect()
    }

    fn project(&self, lon_lat: DVec2, tile: &Tile, frame: &TileFrame) -> DVec2 {
        let (w, h) = (frame.size.width, frame.size.height);
        let [lon, lat] = lon_lat.to_array();
        let Some(first) = tile.bbox.first() else {
            return DVec2::ZERO;
        };
        match row(tile.face()) {
            0 => {
                let unit = map_range(lat, first.max.y, first.min.y, h, 0.0);
                let p = polar(unit, lon - first.min.x - 45.0);
                DVec2::new(w / 2.0 + p.x, h - p.y)
            }
            1 => {
                let unit = map_range(lat, first.max.y, first.min.y, 0.0, h);
                DVec2::new(w / 2.0, 0.0) + polar(unit, lon - first.min.x - 45.0)
            }
            _ => {
                let reach = w / 2.0 / FRAC_PI_4.cos();
                // The seam petal continues its angle into the second box.
                let (bbox, bearing) = match tile.bbox.get(1) {
                    Some(second) if !(lon >= first.min.x && lon <= first.max.x) => (second, lon - second.min.x),
                    _ => (first, lon - first.min.x - 45.0),
                };
                let unit = map_range(lat, bbox.max.y, bbox.min.y, 0.0, reach);
                DVec2::new(w / 2.0, 0.0) + polar(unit, bearing)
            }
        }
    }

    fn densify(&self) -> Densify {
        Densify::new(45.0, 10)
    }

    /// The whole flower on one square sheet, base in the middle.
    fn pages(&self, sheet: &PrintSheet<'_>) -> Result<Vec<Canvas>, PrintError> {
        let (w, h0) = sheet.reference(0)?;
        let s = w * 4.0;
        let dim = |idx: usize| {
            sheet
                .texture(idx)
                .map_or((0.0, 0.0), |t| (f64::from(t.width()), f64::from(t.height())))
        };
        let mut page = blank(s, s)?;
        border(&mut page, PAGE_BORDER);

        let centered = DVec2::splat(-0.5);
        place(&mut page, sheet, 0, DVec2::new(s / 2.0, h0 / 2.0), 0.0, centered);
        place(&mut page, sheet, 1, DVec2::new(s - dim(1).0 / 2.0, s / 2.0), 90.0, centered);
        place(&mut page, sheet, 2, DVec2::new(s / 2.0, s - h0 / 2.0), 180.0, centered);
        place(&mut page, sheet, 3, DVec2::new(dim(3).0 / 2.0, s / 2.0), 270.0, centered);

        let hang = DVec2::new(-0.5, 0.0);
        place(&mut page, sheet, 4, DVec2::ZERO, -45.0, hang);
        place(&mut page, sheet, 5, DVec2::new(s, 0.0), 45.0, hang);
        place(&mut page, sheet, 6, DVec2::splat(s), 135.0, hang);
        place(&mut page, sheet, 7, DVec2::new(0.0, s), 225.0, hang);

        let (left, right) = (DVec2::new(-1.0, 0.0), DVec2::ZERO);
        let petals = [
            (8, [(DVec2::new(s / 2.0, w), 45.0, left), (DVec2::new(w, s / 2.0), -135.0, right)]),
            (9, [(DVec2::new(s / 2.0, w), -45.0, right), (DVec2::new(s - w, s / 2.0), 135.0, left)]),
            (10, [(DVec2::new(s - w, s / 2.0), 45.0, right), (DVec2::new(s / 2.0, s - w), -135.0, left)]),
            (11, [(DVec2::new(s / 2.0, s - w), 135.0, right), (DVec2::new(w, s / 2.0), -45.0, left)]),
        ];
        for (idx, halves) in petals {
            for (at, degrees, anchor) in halves {
                place(&mut page, sheet, idx, at, degrees, anchor);
            }
        }
        Ok(vec![page])
    }
}

#[cfg(test)]
mod tests {
    use image::RgbaImage;

    use super::*;
    use crate::context::TilingParams;

    fn lotus_tiles() -> Vec<Tile> {
        let mut ctx = ShapeContext::setup(ShapeKind::Lotus, None, TilingParams::default());
        ctx.tiles(&TileQuery::new(0, DVec2::ZERO))
    }

    #[test]
    fn test_twelve_tiles_in_three_rows() {
        let tiles = lotus_tiles();
        assert_eq!(tiles.len(), 12);
        assert_eq!(tiles[10].bbox.len(), 2, "the seam petal straddles the antimeridian");
        let sizes = Lotus.sizes(&tiles, 0);
        assert_eq!(sizes[0], sizes[7]);
        assert!((sizes[8].width - 64.0 * 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_south_pole_is_base_apex() {
        let tiles = lotus_tiles();
        let frame = TileFrame::rect(triangle_size());
        let p = Lotus.project(DVec2::new(-45.0, -90.0), &tiles[0], &frame);
        assert!((p - DVec2::new(frame.size.width / 2.0, frame.size.height)).length() < 1e-9, "{p}");
    }

    #[test]
    fn test_seam_petal_is_continuous() {
        let tiles = lotus_tiles();
        let frame = TileFrame::rect(TileSize::new(64.0, 64.0));
        let east = Lotus.project(DVec2::new(180.0, 30.0), &tiles[10], &frame);
        let west = Lotus.project(DVec2::new(-180.0, 30.0), &tiles[10], &frame);
        assert!((east - west).length() < 1e-9, "{east} vs {west}");
    }

    #[test]
    fn test_frames_stay_in_raster() {
        let tiles = lotus_tiles();
        let sizes = Lotus.sizes(&tiles, 0);
        for (frame, size) in Lotus.frames(&tiles, &sizes).iter().zip(&sizes) {
            assert!(
                frame
                    .surface
                    .iter()
                    .all(|p| p.x > -1e-9 && p.x < size.width + 1e-9 && p.y > -1e-9 && p.y < size.height + 1e-9)
            );
        }
    }

    #[test]
    fn test_single_sheet() {
        let tiles = lotus_tiles();
        let sizes = Lotus.sizes(&tiles, 0);
        let textures: Vec<RgbaImage> = sizes
            .iter()
            .map(|s| {
                let (w, h) = s.pixels();
                RgbaImage::new(w, h)
            })
            .collect();
        let pages = Lotus.pages(&PrintSheet::new(&tiles, &sizes, &textures)).expect("pages");
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].width(), textures[0].width() * 4);
    }
}
