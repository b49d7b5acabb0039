//! Paper crane: two wing pentagons below a pair of back-to-back neck
//! triangles.

use facet_geometry::map_range;
use facet_raster::Canvas;
use glam::{DVec2, DVec3};

use crate::context::ShapeContext;
use crate::error::PrintError;
use crate::kind::ShapeKind;
use crate::print::{PAGE_BORDER, PrintSheet, blank, border, place};
use crate::strategy::{ShapeStrategy, face_tiles, fit_surface, zoom_scale};
use crate::tile::{Tile, TileFrame, TileModel, TileQuery, TileSize};

/// Latitude of the fold between the neck and the wings.
const FOLD_LAT: f64 = 38.012466749;

const BOUNDS: [[f64; 4]; 4] = [
    [-180.0, FOLD_LAT, 0.0, 90.0],
    [0.0, FOLD_LAT, 180.0, 90.0],
    [-180.0, -90.0, 0.0, FOLD_LAT],
    [0.0, -90.0, 180.0, FOLD_LAT],
];

const WING_SPAN: f64 = 1.20713;
const WING_BASE: f64 = 0.43648;
const BODY: f64 = 0.31913;

/// Textures per sheet edge, relative to a wing texture's width.
const SHEET_SCALE: f64 = 4.261847937;

pub struct Crane;

impl ShapeStrategy for Crane {
    fn kind(&self) -> ShapeKind {
        ShapeKind::Crane
    }

    fn max_zoom(&self) -> u32 {
        2
    }

    fn faces(&self) -> Vec<Vec<usize>> {
        vec![vec![4, 3, 5], vec![7, 8, 6], vec![0, 2, 1, 5, 3], vec![6, 8, 10, 11, 9]]
    }

    fn vertices(&self) -> Vec<DVec3> {
        let neck = [
            DVec3::new(0.0, BODY, -WING_BASE),
            DVec3::new(0.0, 0.75560, 0.0),
            DVec3::new(0.0, BODY, WING_BASE),
        ];
        let mut vertices = vec![
            DVec3::new(WING_BASE, BODY, -0.5),
            DVec3::new(WING_BASE, BODY, 0.5),
            DVec3::new(WING_SPAN + WING_BASE, BODY, 0.0),
        ];
        vertices.extend(neck);
        vertices.extend(neck);
        vertices.extend([
            DVec3::new(-WING_BASE, BODY, -0.5),
            DVec3::new(-WING_BASE, BODY, 0.5),
            DVec3::new(-WING_SPAN - WING_BASE, BODY, 0.0),
        ]);
        vertices
    }

    fn tiles(&self, ctx: &mut ShapeContext, query: &TileQuery) -> Vec<Tile> {
        let bounds: Vec<&[[f64; 4]]> = BOUNDS.iter().map(std::slice::from_ref).collect();
        face_tiles(
            ctx,
            query.zoom,
            &bounds,
            |_| true,
            |_, plane| plane.iter().rev().copied().collect(),
            |face, surface| match face {
                0 | 1 => TileModel::new(surface, &[[0.0, 1.0], [1.0, 1.0], [0.5, 0.0]], &[0, 1, 2]),
                2 => TileModel::new(
                    surface,
                    &[[0.93650, 0.0], [0.06352, 0.0], [0.0, 0.20910], [0.5, 1.0], [1.0, 0.20910]],
                    &[0, 1, 2, 0, 2, 3, 0, 3, 4],
                ),
                _ => TileModel::new(
                    surface,
                    &[[0.0, 0.20910], [0.5, 1.0], [1.0, 0.20910], [0.93650, 0.0], [0.06352, 0.0]],
                    &[0, 1, 2, 0, 2, 3, 0, 3, 4],
                ),
            },
        )
    }

    fn sizes(&self, tiles: &[Tile], zoom: u32) -> Vec<TileSize> {
        let factor = zoom_scale(zoom) + 4.0;
        tiles
            .iter()
            .map(|tile| {
                let base = if tile.face() > 1 {
                    TileSize::new(100.0, 152.627)
                } else {
                    TileSize::new(87.296, 43.647)
                };
                base.scaled(factor)
            })
            .collect()
    }

    fn frames(&self, tiles: &[Tile], sizes: &[TileSize]) -> Vec<TileFrame> {
        tiles
            .iter()
            .zip(sizes)
            .map(|(tile, size)| {
                let idx = tile.face();
                let axes = (2, if idx > 1 { 0 } else { 1 });
                TileFrame {
                    size: *size,
                    surface: fit_surface(&tile.surface, axes, *size, idx != 2),
                    plane: None,
                }
            })
            .collect()
    }

    /// Rows narrow toward the beak and tail, so each latitude gets its own
    /// horizontal margin.
    fn project(&self, lon_lat: DVec2, tile: &Tile, frame: &TileFrame) -> DVec2 {
        let (w, h) = (frame.size.width, frame.size.height);
        let Some(bbox) = tile.bbox.first() else {
            return DVec2::ZERO;
        };
        let [lon, lat] = lon_lat.to_array();
        let y = map_range(lat, bbox.min.y, bbox.max.y, h, 0.0);
        let body = h * BODY / (WING_SPAN + BODY);
        let margin = if lat < 0.0 {
            (22.5f64.to_radians().tan() * (y - body)).abs()
        } else if lat <= FOLD_LAT {
            (11.25f64.to_radians().tan() * (body - y)).abs()
        } else {
            h - y
        };
        DVec2::new(map_range(lon, bbox.min.x, bbox.max.x, margin, w - margin), y)
    }

    fn pages(&self, sheet: &PrintSheet<'_>) -> Result<Vec<Canvas>, PrintError> {
        let (wing_w, _) = sheet.reference(2)?;
        let s = wing_w * SHEET_SCALE;
        let mut page = blank(s, s)?;
        border(&mut page, PAGE_BORDER);
        let hang = DVec2::new(-0.5, -1.0);
        let drop = DVec2::new(-0.5, 0.0);
        place(&mut page, sheet, 0, DVec2::ZERO, 135.0, hang);
        place(&mut page, sheet, 1, DVec2::splat(s), -45.0, hang);
        place(&mut page, sheet, 2, DVec2::splat(s / 2.0), 135.0, drop);
        place(&mut page, sheet, 3, DVec2::splat(s / 2.0), -45.0, drop);
        Ok(vec![page])
    }
}

#[cfg(test)]
mod tests {
    use image::RgbaImage;

    use super::*;
    use crate::context::TilingParams;

    fn crane_tiles() -> Vec<Tile> {
        let mut ctx = ShapeContext::setup(ShapeKind::Crane, None, TilingParams::default());
        ctx.tiles(&TileQuery::new(1, DVec2::ZERO))
    }

    #[test]
    fn test_sizes_grow_with_zoom_plus_four() {
        let tiles = crane_tiles();
        let sizes = Crane.sizes(&tiles, 1);
        assert_eq!(sizes[0], TileSize::new(87.296 * 6.0, 43.647 * 6.0));
        assert_eq!(sizes[3], TileSize::new(600.0, 152.627 * 6.0));
    }

    #[test]
    fn test_neck_margins_close_at_the_top() {
        let tiles = crane_tiles();
        let frame = TileFrame::rect(TileSize::new(100.0, 50.0));
        let top = Crane.project(DVec2::new(-180.0, 90.0), &tiles[0], &frame);
        assert!((top - DVec2::new(50.0, 0.0)).length() < 1e-9, "neck tip: {top}");
        let west = Crane.project(DVec2::new(-180.0, FOLD_LAT), &tiles[0], &frame);
        let east = Crane.project(DVec2::new(0.0, FOLD_LAT), &tiles[0], &frame);
        assert!((west.y - 50.0).abs() < 1e-9, "fold sits on the bottom row: {west}");
        assert!((west.x + east.x - 100.0).abs() < 1e-9, "margins are symmetric: {west} {east}");
        assert!(west.x > 0.0);
    }

    #[test]
    fn test_wing_rows_stay_within_the_raster() {
        let tiles = crane_tiles();
        let frame = TileFrame::rect(TileSize::new(100.0, 152.627));
        for lat in [-90.0, -45.0, 0.0, 20.0, FOLD_LAT] {
            for lon in [0.0, 90.0, 180.0] {
                let p = Crane.project(DVec2::new(lon, lat), &tiles[3], &frame);
                assert!(
                    (-1e-9..=100.0 + 1e-9).contains(&p.x) && (-1e-9..=152.627 + 1e-9).contains(&p.y),
                    "({lon}, {lat}) -> {p}"
                );
            }
        }
    }

    #[test]
    fn test_frames_fit_the_raster() {
        let tiles = crane_tiles();
        let sizes = Crane.sizes(&tiles, 1);
        for (frame, size) in Crane.frames(&tiles, &sizes).iter().zip(&sizes) {
            assert!(frame.surface.iter().all(|p| p.x >= -1e-9 && p.x <= size.width + 1e-9));
            assert!(frame.surface.iter().all(|p| p.y >= -1e-9 && p.y <= size.height + 1e-9));
        }
    }

    #[test]
    fn test_single_page() {
        let tiles = crane_tiles();
        let sizes = Crane.sizes(&tiles, 0);
        let textures = vec![RgbaImage::new(10, 10); 4];
        let pages = Crane.pages(&PrintSheet::new(&tiles, &sizes, &textures)).expect("pages");
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].width(), 42);
    }
}
