//! Cube: four equatorial faces plus two polar caps.

use facet_geometry::map_range;
use facet_raster::Canvas;
use glam::{DVec2, DVec3};

use crate::context::ShapeContext;
use crate::densify::Densify;
use crate::error::PrintError;
use crate::kind::ShapeKind;
use crate::print::{PAGE_BORDER, PrintSheet, blank, border, grid, place};
use crate::strategy::{ShapeStrategy, face_tiles, polar, scaled_sizes, strip, zoom_scale};
use crate::tile::{Tile, TileFrame, TileModel, TileQuery, TileSize};

const BOUNDS: [[f64; 4]; 6] = [
    [-180.0, 45.0, 180.0, 90.0],
    [-180.0, -90.0, 180.0, -45.0],
    [-90.0, -45.0, 0.0, 45.0],
    [0.0, -45.0, 90.0, 45.0],
    [90.0, -45.0, 180.0, 45.0],
    [-180.0, -45.0, -90.0, 45.0],
];

/// Faces glued to each page's center face, and the turns that line them up.
const PAGE_NEAR: [[usize; 2]; 6] = [[1, 3], [4, 5], [3, 1], [4, 5], [0, 2], [0, 2]];
const PAGE_TURNS: [[f64; 3]; 6] = [
    [0.0, 0.0, 0.0],
    [0.0, -180.0, -180.0],
    [0.0, 0.0, 0.0],
    [0.0, 0.0, 0.0],
    [0.0, -90.0, 90.0],
    [-90.0, 0.0, -180.0],
];

pub struct Cube;

impl ShapeStrategy for Cube {
    fn kind(&self) -> ShapeKind {
        ShapeKind::Cube
    }

    fn max_zoom(&self) -> u32 {
        2
    }

    /// Turns the side faces onto their longitude bands.
    fn default_rotation(&self) -> DVec3 {
        DVec3::new(0.0, -135.0, 0.0)
    }

    fn faces(&self) -> Vec<Vec<usize>> {
        vec![
            vec![6, 2, 1, 5],
            vec![3, 7, 4, 0],
            vec![2, 3, 0, 1],
            vec![1, 0, 4, 5],
            vec![5, 4, 7, 6],
            vec![6, 7, 3, 2],
        ]
    }

    fn vertices(&self) -> Vec<DVec3> {
        [
            [-0.5, -0.5, -0.5],
            [-0.5, 0.5, -0.5],
            [0.5, 0.5, -0.5],
            [0.5, -0.5, -0.5],
            [-0.5, -0.5, 0.5],
            [-0.5, 0.5, 0.5],
            [0.5, 0.5, 0.5],
            [0.5, -0.5, 0.5],
        ]
        .into_iter()
        .map(DVec3::from_array)
        .collect()
    }

    fn tiles(&self, ctx: &mut ShapeContext, query: &TileQuery) -> Vec<Tile> {
        let bounds: Vec<&[[f64; 4]]> = BOUNDS.iter().map(std::slice::from_ref).collect();
        face_tiles(
            ctx,
            query.zoom,
            &bounds,
            |_| true,
            |_, plane| plane.to_vec(),
            |_, surface| {
                TileModel::new(
                    surface,
                    &[[0.0, 0.0], [0.0, 1.0], [1.0, 1.0], [1.0, 0.0]],
                    &[0, 2, 3, 0, 1, 2],
                )
            },
        )
    }

    fn sizes(&self, tiles: &[Tile], zoom: u32) -> Vec<TileSize> {
        scaled_sizes(tiles, zoom_scale(zoom), |_| TileSize::new(512.0, 512.0))
    }

    fn project(&self, lon_lat: DVec2, tile: &Tile, frame: &TileFrame) -> DVec2 {
        let (w, h) = (frame.size.width, frame.size.height);
        let Some(bbox) = tile.bbox.first() else {
            return DVec2::ZERO;
        };
        let [lon, lat] = lon_lat.to_array();
        if tile.face() > 1 {
            return DVec2::new(
                map_range(lon, bbox.min.x, bbox.max.x, 0.0, w),
                map_range(lat, bbox.min.y, bbox.max.y, h, 0.0),
            );
        }
        let Some(s) = strip(lon, &tile.bbox, 360.0) else {
            return DVec2::ZERO;
        };
        if s.bbox.max.y > 0.0 {
            let unit = map_range(lat, s.bbox.max.y, s.bbox.min.y, 0.0, h / 2.0);
            polar(unit, s.alpha - 135.0) + DVec2::new(w / 2.0, h / 2.0)
        } else {
            let unit = map_range(lat, s.bbox.max.y, s.bbox.min.y, h / 2.0, 0.0);
            let p = polar(unit, s.alpha - 135.0);
            DVec2::new(p.x + w / 2.0, h / 2.0 - p.y)
        }
    }

    fn densify(&self) -> Densify {
        Densify::new(10.0, 20)
    }

    /// One page per face with its neighbors folded around it, preceded by a
    /// contact sheet of all six.
    fn pages(&self, sheet: &PrintSheet<'_>) -> Result<Vec<Canvas>, PrintError> {
        let (_, tex_h) = sheet.reference(0)?;
        let s = tex_h * std::f64::consts::FRAC_PI_4.cos() * 4.0;
        let centered = DVec2::splat(-0.5);

        let mut pages = Vec::with_capacity(PAGE_NEAR.len());
        for (idx, (near, turns)) in PAGE_NEAR.iter().zip(PAGE_TURNS).enumerate() {
            let mut page = blank(s, s)?;
            let rot = if idx % 2 == 1 { 90.0 } else { 0.0 };
            let main = 45.0 + rot + turns[0];
            place(&mut page, sheet, idx, DVec2::new(s * 0.75, s * 0.25), main, centered);
            place(&mut page, sheet, idx, DVec2::new(s * 0.25, s * 0.75), main, centered);
            place(&mut page, sheet, idx, DVec2::new(s / 2.0, 0.0), main - 90.0, centered);
            place(&mut page, sheet, idx, DVec2::new(s / 2.0, s), main - 90.0, centered);
            place(&mut page, sheet, near[0], DVec2::splat(s * 0.25), -45.0 + rot + turns[1], centered);
            place(&mut page, sheet, near[1], DVec2::splat(s * 0.75), -45.0 + rot + turns[2], centered);
            border(&mut page, PAGE_BORDER);
            pages.push(page);
        }

        let composite = grid(&pages, 2, s, 3)?;
        Ok(std::iter::once(composite).chain(pages).collect())
    }
}

#[cfg(test)]
mod tests {
    use facet_geometry::{GeoBBox, geo_to_xyz, xyz_to_geo};
    use image::RgbaImage;

    use super::*;
    use crate::context::TilingParams;
    use crate::strategy::TransformKind;

    fn cube_tiles() -> (ShapeContext, Vec<Tile>) {
        let mut ctx = ShapeContext::setup(ShapeKind::Cube, None, TilingParams::default());
        let tiles = ctx.tiles(&TileQuery::new(0, DVec2::ZERO));
        (ctx, tiles)
    }

    #[test]
    fn test_six_tiles_with_fixed_bounds() {
        let (_, tiles) = cube_tiles();
        assert_eq!(tiles.len(), 6);
        for (tile, expected) in tiles.iter().zip(BOUNDS) {
            let [x0, y0, x1, y1] = expected;
            assert_eq!(tile.bbox, vec![GeoBBox::new(x0, y0, x1, y1)], "{}", tile.id);
        }
    }

    #[test]
    fn test_faces_sit_under_their_bounds() {
        let (ctx, tiles) = cube_tiles();
        for tile in &tiles[2..] {
            let center = xyz_to_geo(ctx.solid().centers[tile.face()]);
            let bbox = tile.bbox[0];
            assert!((center - bbox.center()).length() < 1e-6, "{}: face center {center}", tile.id);
        }
        assert!(xyz_to_geo(ctx.solid().centers[0]).y > 89.0, "face 0 is the north cap");
        assert!(xyz_to_geo(ctx.solid().centers[1]).y < -89.0, "face 1 is the south cap");
    }

    #[test]
    fn test_side_face_center_maps_to_raster_center() {
        let (_, tiles) = cube_tiles();
        let sizes = Cube.sizes(&tiles, 0);
        let frames = Cube.frames(&tiles, &sizes);
        for ((tile, frame), size) in tiles.iter().zip(&frames).zip(&sizes).skip(2) {
            let center = DVec2::new(size.width / 2.0, size.height / 2.0);
            let p = Cube.transform(&[tile.bbox[0].center()], tile, frame, TransformKind::Feature);
            assert!((p[0] - center).length() < 1.0, "{}: {}", tile.id, p[0]);
        }
    }

    #[test]
    fn test_origin_lands_on_edge_between_side_faces() {
        let (ctx, tiles) = cube_tiles();
        let sizes = Cube.sizes(&tiles, 0);
        let frames = Cube.frames(&tiles, &sizes);
        let origin = [DVec2::ZERO];
        let size = sizes[2];

        let west = Cube.transform(&origin, &tiles[2], &frames[2], TransformKind::Feature)[0];
        assert!((west - DVec2::new(size.width, size.height / 2.0)).length() < 1.0, "east edge of face 2: {west}");
        let east = Cube.transform(&origin, &tiles[3], &frames[3], TransformKind::Feature)[0];
        assert!((east - DVec2::new(0.0, size.height / 2.0)).length() < 1.0, "west edge of face 3: {east}");

        // The face under the origin is one of the two sharing that edge.
        let face = ctx.solid().face_of(geo_to_xyz(DVec2::ZERO));
        assert!(face == 2 || face == 3, "origin picked face {face}");
    }

    #[test]
    fn test_poles_map_to_cap_center() {
        let (_, tiles) = cube_tiles();
        let frame = TileFrame::rect(TileSize::new(512.0, 512.0));
        let north = Cube.project(DVec2::new(37.0, 90.0), &tiles[0], &frame);
        assert!((north - DVec2::splat(256.0)).length() < 1e-9, "north pole at {north}");
        let south = Cube.project(DVec2::new(-120.0, -90.0), &tiles[1], &frame);
        assert!((south - DVec2::splat(256.0)).length() < 1e-9, "south pole at {south}");
        let rim = Cube.project(DVec2::new(0.0, 45.0), &tiles[0], &frame);
        assert!((rim - DVec2::splat(256.0)).length() - 256.0 < 1e-9, "cap rim sits on the inscribed circle");
    }

    #[test]
    fn test_pages_are_sheet_plus_one_per_face() {
        let (_, tiles) = cube_tiles();
        let sizes = Cube.sizes(&tiles, 0);
        let textures = vec![RgbaImage::new(16, 16); 6];
        let pages = Cube
            .pages(&PrintSheet::new(&tiles, &sizes, &textures))
            .expect("pages");
        assert_eq!(pages.len(), 7);
        assert_eq!(pages[0].width(), pages[1].width() * 2, "contact sheet is two pages wide");
        assert_eq!(pages[0].height(), pages[1].height() * 3);
    }

    #[test]
    fn test_pages_without_textures_fail() {
        let (_, tiles) = cube_tiles();
        let sizes = Cube.sizes(&tiles, 0);
        assert!(matches!(
            Cube.pages(&PrintSheet::new(&tiles, &sizes, &[])),
            Err(PrintError::Empty)
        ));
    }
}
