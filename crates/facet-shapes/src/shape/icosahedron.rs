//! Icosahedron with adaptive sub-triangle tiles.
//!
//! At zoom `z` every face splits into `4^z` triangles. A point is located by
//! its distance from each face corner, measured along the corner's altitude
//! and bucketed into `2^z` rows; the three row indices name the tile. Tiles
//! around the view are found by a bounded breadth-first walk across edges.

use std::f64::consts::FRAC_PI_6;

use facet_geometry::{
    Projected, Solid, WarpHint, delta_xy, geo_to_xyz, interpolate, project, ring_bbox, split_ring, warp,
};
use facet_raster::Canvas;
use glam::{DVec2, DVec3};
use rustc_hash::FxHashSet;
use tracing::debug;

use crate::context::ShapeContext;
use crate::error::PrintError;
use crate::kind::ShapeKind;
use crate::print::{PrintSheet, edge_pairs};
use crate::strategy::ShapeStrategy;
use crate::tile::{Neighbor, PlaneMap, Tile, TileFrame, TileId, TileModel, TileQuery, TileSize};

const TILE_SIDE: f64 = 512.0;

pub struct Icosahedron;

impl ShapeStrategy for Icosahedron {
    fn kind(&self) -> ShapeKind {
        ShapeKind::Icosahedron
    }

    fn max_zoom(&self) -> u32 {
        4
    }

    fn default_rotation(&self) -> DVec3 {
        DVec3::splat(30.0)
    }

    fn faces(&self) -> Vec<Vec<usize>> {
        [
            [0, 1, 2],
            [0, 2, 3],
            [0, 3, 4],
            [0, 4, 5],
            [0, 5, 1],
            [6, 8, 7],
            [6, 9, 8],
            [6, 10, 9],
            [6, 11, 10],
            [6, 7, 11],
            [1, 9, 10],
            [10, 2, 1],
            [2, 10, 11],
            [11, 3, 2],
            [3, 11, 7],
            [7, 4, 3],
            [4, 7, 8],
            [8, 5, 4],
            [5, 8, 9],
            [9, 1, 5],
        ]
        .iter()
        .map(|f| f.to_vec())
        .collect()
    }

    fn vertices(&self) -> Vec<DVec3> {
        let p = (5f64.sqrt() - 1.0) / 2.0;
        vec![
            DVec3::new(-1.0, p, 0.0),
            DVec3::new(-p, 0.0, -1.0),
            DVec3::new(-1.0, -p, 0.0),
            DVec3::new(-p, 0.0, 1.0),
            DVec3::new(0.0, 1.0, p),
            DVec3::new(0.0, 1.0, -p),
            DVec3::new(1.0, -p, 0.0),
            DVec3::new(p, 0.0, 1.0),
            DVec3::new(1.0, p, 0.0),
            DVec3::new(p, 0.0, -1.0),
            DVec3::new(0.0, -1.0, -p),
            DVec3::new(0.0, -1.0, p),
        ]
    }

    fn tiles(&self, ctx: &mut ShapeContext, query: &TileQuery) -> Vec<Tile> {
        let zoom = query.zoom;
        let params = *ctx.params();
        let start = tile_at(ctx, geo_to_xyz(query.center), zoom);
        let reach = ctx.solid().radius / f64::from(1u32 << zoom) * params.neighbor_distance_factor;
        let near_start = |n: &Neighbor| n.points.iter().any(|p| p.distance(start.center) <= reach);

        let mut seen = FxHashSet::default();
        seen.insert(start.id);
        let mut frontier: Vec<Neighbor> = start.neighbors.iter().filter(|n| near_start(*n)).cloned().collect();
        let mut found = vec![start.clone()];

        while !frontier.is_empty() && found.len() < params.neighbor_cap {
            let mut next = Vec::new();
            for neighbor in frontier {
                if found.len() >= params.neighbor_cap {
                    break;
                }
                if seen.contains(&neighbor.id) {
                    continue;
                }
                let tile = tile_at(ctx, neighbor.center, zoom);
                if !seen.insert(tile.id) {
                    continue;
                }
                next.extend(tile.neighbors.iter().filter(|n| near_start(*n)).cloned());
                found.push(tile);
            }
            frontier = next;
        }
        debug!(start = %start.id, count = found.len(), "icosahedron tiles");
        found
    }

    /// Constant edge length at every zoom; the mesh shrinks instead.
    fn sizes(&self, tiles: &[Tile], _zoom: u32) -> Vec<TileSize> {
        let size = TileSize::new(TILE_SIDE, TILE_SIDE * FRAC_PI_6.cos());
        vec![size; tiles.len()]
    }

    fn frames(&self, tiles: &[Tile], sizes: &[TileSize]) -> Vec<TileFrame> {
        tiles
            .iter()
            .zip(sizes)
            .map(|(tile, size)| tile_frame(tile, *size))
            .collect()
    }

    fn project(&self, lon_lat: DVec2, _tile: &Tile, frame: &TileFrame) -> DVec2 {
        frame.plane.map_or(DVec2::ZERO, |plane| plane.project(lon_lat))
    }

    fn pages(&self, sheet: &PrintSheet<'_>) -> Result<Vec<Canvas>, PrintError> {
        edge_pairs(sheet)
    }
}

/// Up tiles put corner 0 at the top center, down tiles at the bottom center.
fn tile_frame(tile: &Tile, size: TileSize) -> TileFrame {
    let (w, h) = (size.width, size.height);
    let raster = if tile.up {
        [DVec2::new(w / 2.0, 0.0), DVec2::new(0.0, h), DVec2::new(w, h)]
    } else {
        [DVec2::new(w / 2.0, h), DVec2::new(0.0, 0.0), DVec2::new(w, 0.0)]
    };
    let plane = match tile.surface.as_slice() {
        [s0, s1, s2] => {
            let normal = (*s1 - *s0).cross(*s2 - *s0).normalize_or_zero();
            PlaneMap::new([*s0, *s1, *s2], normal, raster)
        }
        _ => None,
    };
    TileFrame {
        size,
        surface: raster.to_vec(),
        plane,
    }
}

/// Tile containing `point`, from cache or freshly built.
fn tile_at(ctx: &mut ShapeContext, point: DVec3, zoom: u32) -> Tile {
    let (id, projected) = locate(ctx.solid(), point, zoom);
    ctx.tile_or_insert_with(id, |solid| build_tile(solid, id, projected))
}

fn locate(solid: &Solid, point: DVec3, zoom: u32) -> (TileId, Projected) {
    let projected = project(point, solid);
    let plane = &solid.planes[projected.face];
    let count = 1u32 << zoom;
    let height = plane[0].distance(plane[1]) * FRAC_PI_6.cos();
    let row = |edge: [DVec3; 2]| -> u32 {
        if zoom == 0 || height <= 0.0 {
            return 0;
        }
        let depth = delta_xy(edge, projected.position).y / height * f64::from(count);
        // NaN and negative depths saturate to row 0.
        (depth.floor() as u32).min(count - 1)
    };
    let sub = [
        row([plane[0], plane[1]]),
        row([plane[1], plane[2]]),
        row([plane[2], plane[0]]),
    ];
    let id = TileId {
        shape: ShapeKind::Icosahedron,
        zoom,
        face: projected.face,
        sub: Some(sub),
    };
    (id, projected)
}

fn build_tile(solid: &Solid, id: TileId, projected: Projected) -> Tile {
    let plane = &solid.planes[id.face];
    let [a, _, c] = id.sub.unwrap_or_default();
    let count = 1u32 << id.zoom;
    let up = id.sub.unwrap_or_default().iter().sum::<u32>() % 2 == 0;
    let surface = tile_surface(plane, a, c, count, up);
    let center = surface.iter().copied().sum::<DVec3>() / 3.0;

    let neighbors = neighbors(solid, &surface, center, id.zoom);

    let height = plane[0].distance(plane[1]) * FRAC_PI_6.cos();
    let hint = WarpHint {
        center,
        tile_height: height / f64::from(count),
    };
    let bounds = warp(&surface, projected.face, solid, Some(hint));
    let bbox = bounds.iter().filter_map(|ring| ring_bbox(ring)).collect();

    let model = if up {
        TileModel::new(surface.clone(), &[[0.5, 0.0], [0.0, 1.0], [1.0, 1.0]], &[0, 1, 2])
    } else {
        TileModel::new(
            vec![surface[2], surface[1], surface[0]],
            &[[1.0, 0.0], [0.0, 0.0], [0.5, 1.0]],
            &[0, 1, 2],
        )
    };

    Tile {
        id,
        surface,
        center,
        bounds,
        bbox,
        up,
        neighbors,
        model,
        wkt: Vec::new(),
    }
}

/// Corners of sub-triangle `(a, c)` on a face.
///
/// Row `a` is counted from corner 0; its column comes from `c`, the row
/// counted from corner 2, so the surface always agrees with the identity.
fn tile_surface(plane: &[DVec3], a: u32, c: u32, count: u32, up: bool) -> Vec<DVec3> {
    let n = f64::from(count);
    let (top, bottom) = (f64::from(a), f64::from(a + 1));
    let edge = |along: DVec3, t: f64| interpolate(plane[0], along, t);
    let rows = [
        [edge(plane[1], top / n), edge(plane[2], top / n)],
        [edge(plane[1], bottom / n), edge(plane[2], bottom / n)],
    ];
    if a == 0 {
        return vec![rows[0][0], rows[1][0], rows[1][1]];
    }
    if up {
        let k = f64::from(count.saturating_sub(1 + c).min(a));
        vec![
            interpolate(rows[0][0], rows[0][1], k / top),
            interpolate(rows[1][0], rows[1][1], k / bottom),
            interpolate(rows[1][0], rows[1][1], (k + 1.0) / bottom),
        ]
    } else {
        let k = f64::from(count.saturating_sub(c).clamp(1, a));
        vec![
            interpolate(rows[1][0], rows[1][1], k / bottom),
            interpolate(rows[0][0], rows[0][1], (k - 1.0) / top),
            interpolate(rows[0][0], rows[0][1], k / top),
        ]
    }
}

/// One neighbor per edge, found by reflecting the edge midpoint through the
/// tile center.
fn neighbors(solid: &Solid, surface: &[DVec3], center: DVec3, zoom: u32) -> Vec<Neighbor> {
    let mut ring = split_ring(surface, 1);
    if let Some(first) = ring.first().copied() {
        ring.push(first);
    }
    (1..ring.len())
        .step_by(2)
        .filter_map(|idx| {
            let (prev, mid, next) = (ring[idx - 1], ring[idx], *ring.get(idx + 1)?);
            let out = center + (mid - center) * 2.0;
            let (id, _) = locate(solid, out, zoom);
            Some(Neighbor {
                id,
                center: out,
                points: [prev, interpolate(center, out, 0.6), next],
            })
        })
        .collect()
}
