//! Tetrahedron standing on a southern base: three northern sides and a
//! south polar cap.

use facet_geometry::map_range;
use facet_raster::Canvas;
use glam::{DVec2, DVec3};

use crate::context::ShapeContext;
use crate::densify::Densify;
use crate::error::PrintError;
use crate::kind::ShapeKind;
use crate::print::{PAGE_BORDER, PrintSheet, blank, border, place};
use crate::strategy::{ShapeStrategy, face_tiles, polar, scaled_sizes, strip, zoom_scale};
use crate::tile::{Tile, TileFrame, TileModel, TileQuery, TileSize};

const BOUNDS: [[f64; 4]; 4] = [
    [-180.0, -45.0, -60.0, 90.0],
    [-60.0, -45.0, 60.0, 90.0],
    [60.0, -45.0, 180.0, 90.0],
    [-180.0, -90.0, 180.0, -45.0],
];

pub struct Pyramid;

impl ShapeStrategy for Pyramid {
    fn kind(&self) -> ShapeKind {
        ShapeKind::Pyramid
    }

    fn max_zoom(&self) -> u32 {
        2
    }

    fn faces(&self) -> Vec<Vec<usize>> {
        vec![vec![0, 1, 2], vec![0, 2, 3], vec![0, 3, 1], vec![3, 2, 1]]
    }

    fn vertices(&self) -> Vec<DVec3> {
        let h = 3f64.sqrt();
        vec![
            DVec3::new(0.0, h * 2.0 / 3.0, 0.0),
            DVec3::new(-1.0, -h / 3.0, h / 3.0),
            DVec3::new(1.0, -h / 3.0, h / 3.0),
            DVec3::new(0.0, -h / 3.0, -h * 2.0 / 3.0),
        ]
    }

    fn tiles(&self, ctx: &mut ShapeContext, query: &TileQuery) -> Vec<Tile> {
        let bounds: Vec<&[[f64; 4]]> = BOUNDS.iter().map(std::slice::from_ref).collect();
        face_tiles(
            ctx,
            query.zoom,
            &bounds,
            |_| true,
            |_, plane| plane.to_vec(),
            |_, surface| TileModel::new(surface, &[[0.5, 0.0], [0.0, 1.0], [1.0, 1.0]], &[0, 1, 2]),
        )
    }

    fn sizes(&self, tiles: &[Tile], zoom: u32) -> Vec<TileSize> {
        let base = TileSize::new(512.0, 256.0 * 60f64.to_radians().tan());
        scaled_sizes(tiles, zoom_scale(zoom), |_| base)
    }

    fn project(&self, lon_lat: DVec2, tile: &Tile, frame: &TileFrame) -> DVec2 {
        let (w, h) = (frame.size.width, frame.size.height);
        let base = tile.face() > 2;
        let (span, offset, rot) = if base {
            (-360.0, DVec2::new(w / 2.0, h * 2.0 / 3.0), 120.0)
        } else {
            (60.0, DVec2::new(w / 2.0, 0.0), 30.0)
        };
        let Some(s) = strip(lon_lat.x, &tile.bbox, span) else {
            return DVec2::ZERO;
        };
        // Distance from the pole point to the tile edge along this bearing.
        let reach = if base {
            let part = s.angle % 60.0;
            let sector = (s.angle / 60.0).floor() as i64;
            let off = if sector % 2 == 0 { part } else { -rot / 2.0 - part };
            h / 3.0 / off.to_radians().cos()
        } else {
            h / (rot - s.angle).to_radians().cos()
        };
        if s.bbox.max.y > 0.0 {
            let unit = map_range(lon_lat.y, s.bbox.max.y, s.bbox.min.y, 0.0, reach);
            offset + polar(unit, s.alpha - rot)
        } else {
            let unit = map_range(lon_lat.y, s.bbox.max.y, s.bbox.min.y, reach, 0.0);
            offset - polar(unit, s.alpha - rot)
        }
    }

    fn densify(&self) -> Densify {
        Densify::new(10.0, 20)
    }

    fn pages(&self, sheet: &PrintSheet<'_>) -> Result<Vec<Canvas>, PrintError> {
        let (tex_w, _) = sheet.reference(0)?;
        let side = tex_w * 2.0;
        (0..sheet.tiles.len())
            .map(|idx| {
                let mut page = blank(side, side)?;
                place(&mut page, sheet, idx, DVec2::new(side / 4.0, 0.0), 0.0, DVec2::ZERO);
                border(&mut page, PAGE_BORDER);
                Ok(page)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use image::RgbaImage;

    use super::*;
    use crate::context::TilingParams;

    fn pyramid_tiles() -> Vec<Tile> {
        let mut ctx = ShapeContext::setup(ShapeKind::Pyramid, None, TilingParams::default());
        ctx.tiles(&TileQuery::new(0, DVec2::ZERO))
    }

    #[test]
    fn test_north_pole_is_the_apex_of_each_side() {
        let tiles = pyramid_tiles();
        let sizes = Pyramid.sizes(&tiles, 0);
        let frame = TileFrame::rect(sizes[0]);
        for tile in &tiles[..3] {
            let lon = tile.bbox[0].center().x;
            let p = Pyramid.project(DVec2::new(lon, 90.0), tile, &frame);
            assert!((p - DVec2::new(256.0, 0.0)).length() < 1e-9, "{}: {p}", tile.id);
        }
    }

    #[test]
    fn test_side_bearing_reaches_base_edge() {
        let tiles = pyramid_tiles();
        let frame = TileFrame::rect(Pyramid.sizes(&tiles, 0)[0]);
        // Mid-longitude at the lower bound lands on the bottom edge center.
        let p = Pyramid.project(DVec2::new(0.0, -45.0), &tiles[1], &frame);
        assert!((p - DVec2::new(256.0, frame.size.height)).length() < 1e-6, "{p}");
    }

    #[test]
    fn test_south_pole_is_base_centroid() {
        let tiles = pyramid_tiles();
        let frame = TileFrame::rect(Pyramid.sizes(&tiles, 0)[3]);
        let p = Pyramid.project(DVec2::new(10.0, -90.0), &tiles[3], &frame);
        let expected = DVec2::new(256.0, frame.size.height * 2.0 / 3.0);
        assert!((p - expected).length() < 1e-9, "{p}");
    }

    #[test]
    fn test_one_page_per_face() {
        let tiles = pyramid_tiles();
        let sizes = Pyramid.sizes(&tiles, 0);
        let textures = vec![RgbaImage::new(20, 17); 4];
        let pages = Pyramid
            .pages(&PrintSheet::new(&tiles, &sizes, &textures))
            .expect("pages");
        assert_eq!(pages.len(), 4);
        assert_eq!((pages[0].width(), pages[0].height()), (40, 40));
    }
}
