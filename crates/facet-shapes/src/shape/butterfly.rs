//! Butterfly: six triangular wing panels and two quad hind wings, every
//! tile a quarter hemisphere.

use facet_geometry::map_range;
use facet_raster::Canvas;
use glam::{DVec2, DVec3};

use crate::context::ShapeContext;
use crate::error::PrintError;
use crate::kind::ShapeKind;
use crate::print::{PAGE_BORDER, PrintSheet, blank, border, place};
use crate::shape::lotus::triangle_size;
use crate::strategy::{ShapeStrategy, face_tiles, polar, scaled_sizes, zoom_scale};
use crate::tile::{Tile, TileFrame, TileModel, TileQuery, TileSize};

const BOUNDS: [[f64; 4]; 8] = [
    [-90.0, -90.0, 0.0, 0.0],
    [-90.0, 0.0, 0.0, 90.0],
    [-180.0, 0.0, -90.0, 90.0],
    [0.0, -90.0, 90.0, 0.0],
    [0.0, 0.0, 90.0, 90.0],
    [90.0, 0.0, 180.0, 90.0],
    [90.0, -90.0, 180.0, 0.0],
    [-180.0, -90.0, -90.0, 0.0],
];

const SCALE: f64 = 0.3;

pub struct Butterfly;

impl ShapeStrategy for Butterfly {
    fn kind(&self) -> ShapeKind {
        ShapeKind::Butterfly
    }

    fn max_zoom(&self) -> u32 {
        2
    }

    fn faces(&self) -> Vec<Vec<usize>> {
        vec![
            vec![0, 1, 2],
            vec![3, 2, 1],
            vec![3, 4, 2],
            vec![0, 5, 1],
            vec![6, 1, 5],
            vec![6, 5, 7],
            vec![0, 8, 9, 10],
            vec![0, 13, 12, 11],
        ]
    }

    fn vertices(&self) -> Vec<DVec3> {
        [
            [1.0, 0.0, 0.0],
            [-1.0, 0.0, 0.0],
            [1.0, 0.3473, 1.96962],
            [-1.0, 0.3473, 1.96962],
            [-1.0, 0.3473, 3.96962],
            [1.0, 0.3473, -1.96962],
            [-1.0, 0.3473, -1.96962],
            [-1.0, 0.3473, -3.96962],
            [0.73953, 0.12875, -1.47159],
            [1.81116, 0.10097, -1.15405],
            [2.96962, 0.03027, -0.34597],
            [0.73953, 0.12875, 1.47159],
            [1.81116, 0.10097, 1.15405],
            [2.96962, 0.03027, 0.34597],
        ]
        .into_iter()
        .map(|v| DVec3::from_array(v) * SCALE)
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
            |face, surface| {
                if surface.len() == 3 {
                    return TileModel::new(surface, &[[0.5, 0.0], [0.0, 1.0], [1.0, 1.0]], &[0, 1, 2]);
                }
                let uvs = if face % 2 == 1 {
                    [[0.5, 0.0], [1.0, 1.0], [0.5, 1.0], [0.125, 0.75]]
                } else {
                    [[0.5, 0.0], [0.875, 0.75], [0.5, 1.0], [0.0, 1.0]]
                };
                TileModel::new(surface, &uvs, &[0, 2, 1, 0, 3, 2])
            },
        )
    }

    fn sizes(&self, tiles: &[Tile], zoom: u32) -> Vec<TileSize> {
        scaled_sizes(tiles, zoom_scale(zoom) + 4.0, |_| triangle_size())
    }

    fn frames(&self, _tiles: &[Tile], sizes: &[TileSize]) -> Vec<TileFrame> {
        sizes.iter().map(|size| TileFrame::apex(*size)).collect()
    }

    fn project(&self, lon_lat: DVec2, tile: &Tile, frame: &TileFrame) -> DVec2 {
        let (w, h) = (frame.size.width, frame.size.height);
        let Some(bbox) = tile.bbox.first() else {
            return DVec2::ZERO;
        };
        let bearing = lon_lat.x - bbox.min.x - 45.0;
        if bbox.max.y > 0.0 {
            let unit = map_range(lon_lat.y, bbox.max.y, bbox.min.y, 0.0, h);
            let p = polar(unit, bearing);
            DVec2::new(w / 2.0 + p.x, p.y)
        } else {
            let unit = map_range(lon_lat.y, bbox.max.y, bbox.min.y, h, 0.0);
            let p = polar(unit, bearing);
            DVec2::new(w / 2.0 - p.x, p.y)
        }
    }

    fn pages(&self, sheet: &PrintSheet<'_>) -> Result<Vec<Canvas>, PrintError> {
        let (_, tex_h) = sheet.reference(0)?;
        let s = tex_h / std::f64::consts::FRAC_PI_4.cos() * 4.0;
        let mut page = blank(s, s)?;
        border(&mut page, PAGE_BORDER);

        let hang = DVec2::new(-0.5, 0.0);
        let corner = DVec2::new(0.0, -1.0);
        let layout = [
            (DVec2::new(s / 4.0, s), 135.0, hang),
            (DVec2::new(s * 0.75, s), -135.0, hang),
            (DVec2::new(s * 0.75, 0.0), -45.0, hang),
            (DVec2::new(s * 0.75, 0.0), 45.0, hang),
            (DVec2::new(s * 0.75, s / 4.0), -135.0, corner),
            (DVec2::new(s / 4.0, 0.0), 45.0, hang),
            (DVec2::new(s / 4.0, 0.0), -45.0, hang),
            (DVec2::new(s / 2.0, 0.0), 135.0, corner),
        ];
        for (idx, (at, degrees, anchor)) in layout.into_iter().enumerate() {
            place(&mut page, sheet, idx, at, degrees, anchor);
        }
        Ok(vec![page])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::TilingParams;

    fn butterfly_tiles() -> Vec<Tile> {
        let mut ctx = ShapeContext::setup(ShapeKind::Butterfly, None, TilingParams::default());
        ctx.tiles(&TileQuery::new(0, DVec2::ZERO))
    }

    #[test]
    fn test_hind_wings_are_quads() {
        let tiles = butterfly_tiles();
        assert_eq!(tiles.len(), 8);
        assert_eq!(tiles[6].model.indices, vec![0, 2, 1, 0, 3, 2]);
        assert_eq!(tiles[7].model.uvs[3], DVec2::new(0.125, 0.75));
        assert!(tiles[..6].iter().all(|t| t.model.positions.len() == 3));
    }

    #[test]
    fn test_poles_meet_at_the_apex() {
        let tiles = butterfly_tiles();
        let sizes = Butterfly.sizes(&tiles, 0);
        let frames = Butterfly.frames(&tiles, &sizes);
        let north = Butterfly.project(DVec2::new(-45.0, 90.0), &tiles[1], &frames[1]);
        let south = Butterfly.project(DVec2::new(-45.0, -90.0), &tiles[0], &frames[0]);
        let apex = frames[0].surface[0];
        assert!((north - apex).length() < 1e-9, "{north}");
        assert!((south - apex).length() < 1e-9, "{south}");
    }

    #[test]
    fn test_equator_midpoint_on_base() {
        let tiles = butterfly_tiles();
        let sizes = Butterfly.sizes(&tiles, 0);
        let frame = TileFrame::apex(sizes[4]);
        let p = Butterfly.project(DVec2::new(45.0, 0.0), &tiles[4], &frame);
        assert!((p - DVec2::new(frame.size.width / 2.0, frame.size.height)).length() < 1e-9, "{p}");
    }
}
