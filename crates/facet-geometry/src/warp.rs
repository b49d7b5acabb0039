//! Repair of tile outlines that cross the antimeridian or enclose a pole.
//!
//! A tile outline in solid space becomes a geographic ring whose longitudes
//! jump by ~360 degrees where it crosses +-180. Without a pole inside, the
//! ring is split into two rings on either side of the antimeridian. With a
//! pole inside, a cap running along the pole line is spliced in at the
//! crossing edge instead.

use std::panic::{AssertUnwindSafe, catch_unwind};

use geo::algorithm::line_intersection::{LineIntersection, line_intersection};
use geo::{BooleanOps, Coord, Line, LineString, MultiPolygon, Polygon};
use glam::{DVec2, DVec3};

use crate::coords::geo_to_xyz;
use crate::projection::fence;
use crate::solid::Solid;

/// Samples per edge when turning a tile outline into a geographic ring.
const FENCE_PRECISION: usize = 32;

/// Where the tile sits, used to decide whether it encloses a pole.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WarpHint {
    pub center: DVec3,
    /// Height of the tile; a pole closer than half of it to `center` is inside.
    pub tile_height: f64,
}

/// Geographic bounds of a tile outline on `face`.
///
/// Returns one closed ring, or two when the outline was split at the
/// antimeridian. Every ring except a polar cap spans at most 180 degrees of
/// longitude.
#[must_use]
pub fn warp(vertices: &[DVec3], face: usize, solid: &Solid, hint: Option<WarpHint>) -> Vec<Vec<DVec2>> {
    if vertices.len() < 3 {
        return Vec::new();
    }

    let north = geo_to_xyz(DVec2::new(0.0, 90.0));
    let south = geo_to_xyz(DVec2::new(0.0, -90.0));
    let pole = hint.and_then(|h| {
        if solid.face_of(north) == face && h.center.distance(north) < h.tile_height / 2.0 {
            Some(1.0)
        } else if solid.face_of(south) == face && h.center.distance(south) < h.tile_height / 2.0 {
            Some(-1.0)
        } else {
            None
        }
    });

    let corners: Vec<DVec2> = fence(vertices, 1);
    let max_lon_delta = corners
        .iter()
        .zip(corners.iter().cycle().skip(1))
        .map(|(a, b)| (a.x - b.x).abs())
        .fold(0.0, f64::max);

    let area = fence(vertices, FENCE_PRECISION);

    match pole {
        None if max_lon_delta > 180.0 => split_at_antimeridian(&area).unwrap_or_else(|| {
            tracing::debug!(face, "antimeridian split failed, falling back to pole cap");
            cap_pole(&area, pole, face, solid)
        }),
        Some(_) => cap_pole(&area, pole, face, solid),
        None => vec![closed(area)],
    }
}

fn closed(mut ring: Vec<DVec2>) -> Vec<DVec2> {
    if let (Some(first), Some(last)) = (ring.first().copied(), ring.last()) {
        if first != *last {
            ring.push(first);
        }
    }
    ring
}

fn world_rect() -> Polygon<f64> {
    Polygon::new(
        LineString::from(vec![
            (-180.0, -90.0),
            (-180.0, 90.0),
            (180.0, 90.0),
            (180.0, -90.0),
            (-180.0, -90.0),
        ]),
        vec![],
    )
}

/// Shift the ring into `[0, 360)`, then cut it with the world rectangle.
///
/// Returns `None` when the boolean operation fails or yields nothing usable.
fn split_at_antimeridian(area: &[DVec2]) -> Option<Vec<Vec<DVec2>>> {
    let shifted: Vec<Coord<f64>> = closed(area.to_vec())
        .into_iter()
        .map(|p| Coord {
            x: if p.x >= 0.0 { p.x } else { p.x + 360.0 },
            y: p.y,
        })
        .collect();
    let tile = Polygon::new(LineString::new(shifted), vec![]);
    let world = world_rect();

    let (outside, inside): (MultiPolygon<f64>, MultiPolygon<f64>) =
        catch_unwind(AssertUnwindSafe(|| (tile.difference(&world), tile.intersection(&world)))).ok()?;

    let outside = outside.0.first()?.exterior();
    let inside = inside.0.first()?.exterior();
    if outside.0.len() < 4 || inside.0.len() < 4 {
        return None;
    }

    Some(vec![
        outside.coords().map(|c| DVec2::new(c.x - 360.0, c.y)).collect(),
        inside.coords().map(|c| DVec2::new(c.x, c.y)).collect(),
    ])
}

/// Splice a cap along the pole line into the ring at its antimeridian edge.
fn cap_pole(area: &[DVec2], pole: Option<f64>, face: usize, solid: &Solid) -> Vec<Vec<DVec2>> {
    let n = area.len();
    let Some(index) = (0..n).find(|&i| (area[i].x - area[(i + 1) % n].x).abs() > 180.0) else {
        return vec![closed(area.to_vec())];
    };
    let (from, to) = (area[index], area[(index + 1) % n]);

    let normalize = |p: DVec2| Coord {
        x: if p.x >= 0.0 { p.x } else { p.x + 360.0 },
        y: p.y,
    };
    let edge = Line::new(normalize(from), normalize(to));
    let boundary = world_rect();
    let crossing = boundary.exterior().lines().find_map(|side| {
        match line_intersection(edge, side)? {
            LineIntersection::SinglePoint { intersection, .. } => Some(intersection),
            LineIntersection::Collinear { intersection } => Some(intersection.start),
        }
    });
    let Some(crossing) = crossing else {
        return vec![closed(area.to_vec())];
    };
    let point = DVec2::new(crossing.x, crossing.y);

    let side = pole.unwrap_or_else(|| {
        if solid.face_of(geo_to_xyz(DVec2::new(0.0, 90.0))) == face {
            1.0
        } else if solid.face_of(geo_to_xyz(DVec2::new(0.0, -90.0))) == face {
            -1.0
        } else if point.y >= 0.0 {
            1.0
        } else {
            -1.0
        }
    });

    let mut cap = vec![
        point,
        DVec2::new(180.0, 90.0 * side),
        DVec2::new(-180.0, 90.0 * side),
        DVec2::new(-point.x, point.y),
    ];
    // Westward crossings walk the cap from -180 to +180.
    if from.x < to.x {
        cap.reverse();
    }

    let mut ring = Vec::with_capacity(n + cap.len() + 1);
    ring.extend_from_slice(&area[..=index]);
    ring.extend(cap);
    ring.extend_from_slice(&area[index + 1..]);
    vec![closed(ring)]
}
