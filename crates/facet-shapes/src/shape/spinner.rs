//! Spinner: an octahedron split into 24 double-sided triangular vanes that
//! all meet at the center.

use facet_geometry::map_range;
use facet_raster::Canvas;
use glam::{DVec2, DVec3};

use crate::context::ShapeContext;
use crate::error::PrintError;
use crate::kind::ShapeKind;
use crate::print::{PrintSheet, SHEET_BORDER, blank, border, grid, place};
use crate::strategy::{ShapeStrategy, face_tiles, polar, scaled_sizes, strip, zoom_scale};
use crate::tile::{Tile, TileFrame, TileModel, TileQuery, TileSize};

const BOUNDS: [&[[f64; 4]]; 24] = [
    &[[-90.0, -90.0, 0.0, 0.0]],
    &[[-90.0, 0.0, 0.0, 90.0]],
    &[[-180.0, -90.0, -90.0, 0.0]],
    &[[-180.0, 0.0, -90.0, 90.0]],
    &[[90.0, -90.0, 180.0, 0.0]],
    &[[90.0, 0.0, 180.0, 90.0]],
    &[[0.0, -90.0, 90.0, 0.0]],
    &[[0.0, 0.0, 90.0, 90.0]],
    &[[0.0, 0.0, 135.0, 90.0]],
    &[[-135.0, 0.0, 0.0, 90.0]],
    &[[0.0, -90.0, 135.0, 0.0]],
    &[[-135.0, -90.0, 0.0, 0.0]],
    &[[45.0, -90.0, 180.0, 0.0]],
    &[[-180.0, -90.0, -45.0, 0.0]],
    &[[45.0, 0.0, 180.0, 90.0]],
    &[[-180.0, 0.0, -45.0, 90.0]],
    &[[135.0, 0.0, 180.0, 90.0], [-180.0, 0.0, -90.0, 90.0]],
    &[[-90.0, 0.0, 45.0, 90.0]],
    &[[135.0, -90.0, 180.0, 0.0], [-180.0, -90.0, -90.0, 0.0]],
    &[[-90.0, -90.0, 45.0, 0.0]],
    &[[90.0, -90.0, 180.0, 0.0], [-180.0, -90.0, -135.0, 0.0]],
    &[[-45.0, -90.0, 90.0, 0.0]],
    &[[90.0, 0.0, 180.0, 90.0], [-180.0, 0.0, -135.0, 90.0]],
    &[[-45.0, 0.0, 90.0, 90.0]],
];

/// Vanes on each of the six square print pages, by reversed texture slot.
const PAGE_VANES: [[usize; 8]; 6] = [
    [0, 1, 8, 9, 10, 11, 7, 6],
    [3, 2, 12, 13, 14, 15, 4, 5],
    [1, 0, 18, 19, 16, 17, 2, 3],
    [5, 4, 21, 20, 23, 22, 6, 7],
    [9, 8, 16, 17, 22, 23, 14, 15],
    [10, 11, 20, 21, 18, 19, 13, 12],
];

/// Where each of a page's eight vanes hangs, as fractions of the page side,
/// and its turn.
const PAGE_SLOTS: [([f64; 2], f64); 8] = [
    ([0.0, 0.5], -135.0),
    ([0.5, 0.0], 45.0),
    ([0.5, 0.0], -45.0),
    ([1.0, 0.5], 135.0),
    ([0.0, 0.5], -45.0),
    ([0.5, 1.0], 135.0),
    ([1.0, 0.5], 45.0),
    ([0.5, 1.0], -135.0),
];

pub struct Spinner;

impl ShapeStrategy for Spinner {
    fn kind(&self) -> ShapeKind {
        ShapeKind::Spinner
    }

    fn max_zoom(&self) -> u32 {
        2
    }

    fn faces(&self) -> Vec<Vec<usize>> {
        let vanes = [
            [1, 2], [2, 3], [3, 4], [4, 1], [1, 5], [6, 1],
            [3, 6], [5, 3], [5, 2], [2, 6], [6, 4], [4, 5],
        ];
        // Each vane twice, once per winding, so both sides carry a texture.
        vanes
            .iter()
            .flat_map(|[a, b]| [vec![0, *a, *b], vec![0, *b, *a]])
            .collect()
    }

    fn vertices(&self) -> Vec<DVec3> {
        [
            DVec3::ZERO,
            DVec3::X,
            DVec3::Z,
            DVec3::NEG_X,
            DVec3::NEG_Z,
            DVec3::Y,
            DVec3::NEG_Y,
        ]
        .into_iter()
        .map(|v| v * 0.5 * 2.5)
        .collect()
    }

    /// With a camera, only vanes facing it are returned.
    fn tiles(&self, ctx: &mut ShapeContext, query: &TileQuery) -> Vec<Tile> {
        let facing: Vec<bool> = match query.camera {
            Some(camera) => {
                let view = camera.normalize_or_zero();
                ctx.solid().normals.iter().map(|n| n.dot(view) > 0.0).collect()
            }
            None => vec![true; ctx.solid().face_count()],
        };
        face_tiles(
            ctx,
            query.zoom,
            &BOUNDS,
            |face| facing.get(face).copied().unwrap_or(false),
            |_, plane| plane.to_vec(),
            |_, surface| TileModel::new(surface, &[[0.5, 0.0], [0.0, 1.0], [1.0, 1.0]], &[0, 1, 2]),
        )
    }

    fn sizes(&self, tiles: &[Tile], zoom: u32) -> Vec<TileSize> {
        let quarter = 2048.0 / 4.0;
        let base = TileSize::new(quarter * 2f64.sqrt(), quarter * std::f64::consts::FRAC_PI_4.sin());
        scaled_sizes(tiles, zoom_scale(zoom), |_| base)
    }

    fn frames(&self, _tiles: &[Tile], sizes: &[TileSize]) -> Vec<TileFrame> {
        sizes.iter().map(|size| TileFrame::apex(*size)).collect()
    }

    fn project(&self, lon_lat: DVec2, tile: &Tile, frame: &TileFrame) -> DVec2 {
        let (w, h) = (frame.size.width, frame.size.height);
        let Some(s) = strip(lon_lat.x, &tile.bbox, 90.0) else {
            return DVec2::ZERO;
        };
        if s.bbox.max.y > 0.0 {
            let unit = map_range(lon_lat.y, s.bbox.max.y, s.bbox.min.y, 0.0, h);
            let p = polar(unit, s.alpha - 45.0);
            DVec2::new(w / 2.0 + p.x, p.y)
        } else {
            let unit = map_range(lon_lat.y, s.bbox.max.y, s.bbox.min.y, h, 0.0);
            let p = polar(unit, s.alpha - 45.0);
            DVec2::new(w / 2.0 - p.x, p.y)
        }
    }

    /// Six pages of eight vanes, returned as one contact sheet.
    fn pages(&self, sheet: &PrintSheet<'_>) -> Result<Vec<Canvas>, PrintError> {
        let last = sheet.textures.len().checked_sub(1).ok_or(PrintError::Empty)?;
        let (_, tex_h) = sheet.reference(last)?;
        let s = tex_h / std::f64::consts::FRAC_PI_4.cos() * 2.0;
        let hang = DVec2::new(-0.5, 0.0);

        let mut pages = Vec::with_capacity(PAGE_VANES.len());
        for vanes in PAGE_VANES {
            let mut page = blank(s, s)?;
            for (slot, ([fx, fy], degrees)) in vanes.iter().zip(PAGE_SLOTS) {
                if let Some(index) = last.checked_sub(*slot) {
                    place(&mut page, sheet, index, DVec2::new(fx * s, fy * s), degrees, hang);
                }
            }
            border(&mut page, SHEET_BORDER);
            pages.push(page);
        }
        Ok(vec![grid(&pages, 2, s, 3)?])
    }
}

#[cfg(test)]
mod tests {
    use image::RgbaImage;

    use super::*;
    use crate::context::TilingParams;

    #[test]
    fn test_camera_culls_back_faces() {
        let mut ctx = ShapeContext::setup(ShapeKind::Spinner, None, TilingParams::default());
        let all = ctx.tiles(&TileQuery::new(0, DVec2::ZERO));
        assert_eq!(all.len(), 24);
        let camera = DVec3::new(3.0, 5.0, 7.0) * 1e7;
        let visible = ctx.tiles(&TileQuery::new(0, DVec2::ZERO).with_camera(camera));
        assert_eq!(visible.len(), 12, "exactly one side of each vane faces an off-axis camera");
        for tile in &visible {
            assert!(ctx.solid().normals[tile.face()].dot(camera) > 0.0, "{}", tile.id);
        }
    }

    #[test]
    fn test_split_vane_spans_ninety_degrees() {
        let mut ctx = ShapeContext::setup(ShapeKind::Spinner, None, TilingParams::default());
        let tiles = ctx.tiles(&TileQuery::new(0, DVec2::ZERO));
        let frame = TileFrame::apex(Spinner.sizes(&tiles, 0)[16]);
        let (w, h) = (frame.size.width, frame.size.height);
        // Both ends of the equator sit on the rim, mirrored about the apex.
        let apex = DVec2::new(w / 2.0, 0.0);
        let start = Spinner.project(DVec2::new(135.0, 0.0), &tiles[16], &frame);
        let end = Spinner.project(DVec2::new(-90.0, 0.0), &tiles[16], &frame);
        assert!((start.distance(apex) - h).abs() < 1e-6, "{start}");
        assert!((end.distance(apex) - h).abs() < 1e-6, "{end}");
        assert!((start.x + end.x - w).abs() < 1e-6 && (start.y - end.y).abs() < 1e-6);
        assert!(start.x < end.x);
        assert_eq!(Spinner.project(DVec2::new(0.0, 10.0), &tiles[16], &frame), DVec2::ZERO);
    }

    #[test]
    fn test_pages_form_one_sheet() {
        let mut ctx = ShapeContext::setup(ShapeKind::Spinner, None, TilingParams::default());
        let tiles = ctx.tiles(&TileQuery::new(0, DVec2::ZERO));
        let sizes = Spinner.sizes(&tiles, 0);
        let textures = vec![RgbaImage::new(8, 4); 24];
        let pages = Spinner.pages(&PrintSheet::new(&tiles, &sizes, &textures)).expect("pages");
        assert_eq!(pages.len(), 1);
        let side = (4.0 / std::f64::consts::FRAC_PI_4.cos() * 2.0) as u32;
        assert_eq!((pages[0].width(), pages[0].height()), (side * 2, side * 3));
    }
}
