//! Lily: four kite-shaped petals, printed on both sides of the sheet so the
//! northern and southern hemispheres share a mesh.

use facet_geometry::map_range;
use facet_raster::Canvas;
use glam::{DVec2, DVec3};

use crate::context::ShapeContext;
use crate::error::PrintError;
use crate::kind::ShapeKind;
use crate::print::{PAGE_BORDER, PrintSheet, blank, border, place};
use crate::strategy::{ShapeStrategy, face_tiles, polar, scaled_sizes, strip, zoom_scale};
use crate::tile::{Tile, TileFrame, TileModel, TileQuery, TileSize};

const BOUNDS: [[f64; 4]; 8] = [
    [-180.0, 0.0, -90.0, 90.0],
    [90.0, 0.0, 180.0, 90.0],
    [0.0, 0.0, 90.0, 90.0],
    [-90.0, 0.0, 0.0, 90.0],
    [-180.0, -90.0, -90.0, 0.0],
    [90.0, -90.0, 180.0, 0.0],
    [0.0, -90.0, 90.0, 0.0],
    [-90.0, -90.0, 0.0, 0.0],
];

/// Petal length from tip to the center notch, in model units.
const PETAL: f64 = 0.78047;
/// Tip to the widest point of the petal.
const SHOULDER: f64 = 0.61129;
const SPREAD: f64 = 45.0;

/// Petals per print sheet slot: the northern four once, the southern four
/// twice as halves.
const SHEET_UNITS: [usize; 12] = [0, 1, 2, 3, 4, 4, 5, 5, 6, 6, 7, 7];
const SHEET_SLOTS: [([f64; 2], f64); 12] = [
    ([0.0, 0.0], -45.0),
    ([0.0, 1.0], -135.0),
    ([1.0, 1.0], 135.0),
    ([1.0, 0.0], 45.0),
    ([0.0, 0.0], 0.0),
    ([0.0, 0.0], -90.0),
    ([0.0, 1.0], 270.0),
    ([0.0, 1.0], 180.0),
    ([1.0, 1.0], 180.0),
    ([1.0, 1.0], -270.0),
    ([1.0, 0.0], 0.0),
    ([1.0, 0.0], 90.0),
];
const SHEET_SCALE: f64 = 3.414251084;

pub struct Lily;

impl ShapeStrategy for Lily {
    fn kind(&self) -> ShapeKind {
        ShapeKind::Lily
    }

    fn max_zoom(&self) -> u32 {
        2
    }

    fn faces(&self) -> Vec<Vec<usize>> {
        let petals = [
            vec![0, 1, 2, 3, 4],
            vec![5, 0, 6, 7, 8],
            vec![9, 5, 10, 11, 12],
            vec![1, 9, 13, 14, 15],
        ];
        petals.iter().chain(&petals).cloned().collect()
    }

    fn vertices(&self) -> Vec<DVec3> {
        [
            [0.21953, 0.21953],
            [-0.21953, 0.21953],
            [-0.25318, 0.38871],
            [0.0, 1.0],
            [0.25318, 0.38871],
            [0.21953, -0.21953],
            [0.38871, 0.25318],
            [1.0, 0.0],
            [0.38871, -0.25318],
            [-0.21953, -0.21953],
            [0.25318, -0.38871],
            [0.0, -1.0],
            [-0.25318, -0.38871],
            [-0.38871, -0.25318],
            [-1.0, 0.0],
            [-0.38871, 0.25318],
        ]
        .into_iter()
        .map(|[x, z]| DVec3::new(x, 0.0, z))
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
                if face > 3 {
                    TileModel::new(
                        surface,
                        &[[0.93354, 1.0], [0.06646, 1.0], [0.0, 0.78324], [0.5, 0.0], [1.0, 0.78324]],
                        &[2, 1, 0, 4, 2, 0, 3, 2, 4],
                    )
                } else {
                    TileModel::new(
                        surface,
                        &[[0.06646, 1.0], [0.93354, 1.0], [1.0, 0.78324], [0.5, 0.0], [0.0, 0.78324]],
                        &[0, 1, 2, 0, 2, 4, 4, 2, 3],
                    )
                }
            },
        )
    }

    fn sizes(&self, tiles: &[Tile], zoom: u32) -> Vec<TileSize> {
        scaled_sizes(tiles, zoom_scale(zoom), |_| TileSize::new(256.0, 394.582))
    }

    /// Fan out from the tip until the petal's shoulders, then taper rows
    /// toward the notch.
    fn project(&self, lon_lat: DVec2, tile: &Tile, frame: &TileFrame) -> DVec2 {
        let (w, h) = (frame.size.width, frame.size.height);
        let shoulder = DVec2::new(0.38871, 0.25318).distance(DVec2::X);
        let limit = map_range(shoulder, 0.0, PETAL, 0.0, h);
        let taper_from = map_range(SHOULDER, 0.0, PETAL, 0.0, h);
        let [lon, lat] = lon_lat.to_array();

        let Some(s) = strip(lon, &tile.bbox, SPREAD) else {
            return DVec2::ZERO;
        };
        let north = s.bbox.max.y > 0.0;
        let unit = if north {
            map_range(lat, s.bbox.max.y, s.bbox.min.y, 0.0, h)
        } else {
            map_range(lat, s.bbox.max.y, s.bbox.min.y, h, 0.0)
        };
        if unit > limit {
            let margin = (11.25f64.to_radians().tan() * (unit - taper_from)).abs();
            let x = if north {
                map_range(lon, s.bbox.min.x, s.bbox.max.x, margin, w - margin)
            } else {
                map_range(lon, s.bbox.max.x, s.bbox.min.x, margin, w - margin)
            };
            return DVec2::new(x, unit);
        }
        let p = polar(unit, s.alpha - SPREAD / 2.0);
        if north {
            DVec2::new(w / 2.0 + p.x, p.y)
        } else {
            DVec2::new(w / 2.0 - p.x, p.y)
        }
    }

    fn pages(&self, sheet: &PrintSheet<'_>) -> Result<Vec<Canvas>, PrintError> {
        let (_, tex_h) = sheet.reference(0)?;
        let s = tex_h * SHEET_SCALE;
        let mut page = blank(s, s)?;
        let hang = DVec2::new(-0.5, 0.0);
        for (unit, ([fx, fy], degrees)) in SHEET_UNITS.iter().zip(SHEET_SLOTS) {
            place(&mut page, sheet, *unit, DVec2::new(fx * s, fy * s), degrees, hang);
        }
        border(&mut page, PAGE_BORDER);
        Ok(vec![page])
    }
}
