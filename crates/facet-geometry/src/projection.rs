//! Gnomonic projection onto solid faces and edge subdivision helpers.

use std::f64::consts::FRAC_PI_6;

use glam::{DVec2, DVec3};

use crate::coords::{geo_to_xyz, xyz_to_geo};
use crate::solid::Solid;

/// Rays whose direction has a smaller component along the plane normal are
/// treated as parallel.
pub const PARALLEL_EPSILON: f64 = 1e-6;

/// A point projected onto the plane of its owning face.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projected {
    pub face: usize,
    /// Position on the face plane, or [`DVec3::ZERO`] when the ray misses it.
    pub position: DVec3,
}

/// Intersect the line through `from` and `through` with the plane given by
/// `normal` and a point `on_plane`.
#[must_use]
pub fn intersect_plane(from: DVec3, through: DVec3, normal: DVec3, on_plane: DVec3) -> Option<DVec3> {
    let dir = through - from;
    let denom = normal.dot(dir);
    if denom.abs() <= PARALLEL_EPSILON {
        return None;
    }
    let t = -normal.dot(from - on_plane) / denom;
    Some(from + dir * t)
}

/// Project a solid-space point onto the plane of the face with the nearest
/// center, along the ray from the origin.
#[must_use]
pub fn project(point: DVec3, solid: &Solid) -> Projected {
    let face = solid.face_of(point);
    let position = match (solid.normals.get(face), solid.centers.get(face)) {
        (Some(normal), Some(center)) => {
            intersect_plane(DVec3::ZERO, point, *normal, *center).unwrap_or(DVec3::ZERO)
        }
        _ => DVec3::ZERO,
    };
    Projected { face, position }
}

#[inline]
#[must_use]
pub fn project_geo(lon_lat: DVec2, solid: &Solid) -> Projected {
    project(geo_to_xyz(lon_lat), solid)
}

/// Chord interpolation between two solid-space points.
///
/// Not a great-circle slerp: callers that need a geographic position convert
/// the result, which normalizes it implicitly.
#[inline]
#[must_use]
pub fn interpolate(a: DVec3, b: DVec3, t: f64) -> DVec3 {
    if t == 1.0 { b } else { a.lerp(b, t) }
}

/// Insert `2^zoom - 1` evenly spaced points on every edge of a closed ring.
///
/// The result is open: the first vertex is not repeated.
#[must_use]
pub fn split_ring(vertices: &[DVec3], zoom: u32) -> Vec<DVec3> {
    densify_ring(vertices, 1 << zoom)
}

/// Geographic outline of a solid-space ring, with `precision - 1` chord
/// samples per edge.
#[must_use]
pub fn fence(vertices: &[DVec3], precision: usize) -> Vec<DVec2> {
    densify_ring(vertices, precision.max(1))
        .into_iter()
        .map(xyz_to_geo)
        .collect()
}

fn densify_ring(vertices: &[DVec3], count: usize) -> Vec<DVec3> {
    let n = vertices.len();
    let mut out = Vec::with_capacity(n * count);
    for (idx, vertex) in vertices.iter().enumerate() {
        let next = vertices[(idx + 1) % n];
        out.push(*vertex);
        for step in 1..count {
            out.push(interpolate(*vertex, next, step as f64 / count as f64));
        }
    }
    out
}

/// Interior angles, in radians, of the triangle `(v0, v1, v2)`.
///
/// `a` is the angle at `v0`, `b` at `v1`, `c` at `v2`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TriangleAngles {
    pub a: f64,
    pub b: f64,
    pub c: f64,
}

#[must_use]
pub fn law_of_cos(v0: DVec3, v1: DVec3, v2: DVec3) -> TriangleAngles {
    let side_c = v0.distance(v1);
    let side_a = v1.distance(v2);
    let side_b = v2.distance(v0);
    let angle = |opposite: f64, s1: f64, s2: f64| {
        ((s1 * s1 + s2 * s2 - opposite * opposite) / (2.0 * s1 * s2))
            .clamp(-1.0, 1.0)
            .acos()
    };
    TriangleAngles {
        a: angle(side_a, side_b, side_c),
        b: angle(side_b, side_c, side_a),
        c: angle(side_c, side_a, side_b),
    }
}

/// Offset of `target` from `edge[0]` measured in the frame of an equilateral
/// triangle built on `edge`.
///
/// `y` is the distance along the altitude from `edge[0]`, which is how far
/// across the triangle's rows the target sits; `x` is the perpendicular part.
#[must_use]
pub fn delta_xy(edge: [DVec3; 2], target: DVec3) -> DVec2 {
    let side = edge[0].distance(target);
    if side == 0.0 {
        return DVec2::ZERO;
    }
    let theta = (law_of_cos(edge[0], edge[1], target).a - FRAC_PI_6).abs();
    DVec2::new(side * theta.sin(), side * theta.cos())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::EARTH_RADIUS;
    use crate::solid::ModelTransform;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    fn octahedron() -> Solid {
        let vertices = [
            DVec3::X,
            DVec3::NEG_X,
            DVec3::Y,
            DVec3::NEG_Y,
            DVec3::Z,
            DVec3::NEG_Z,
        ];
        let faces = vec![
            vec![0, 2, 4],
            vec![4, 2, 1],
            vec![1, 2, 5],
            vec![5, 2, 0],
            vec![4, 3, 0],
            vec![1, 3, 4],
            vec![5, 3, 1],
            vec![0, 3, 5],
        ];
        Solid::build(&faces, &vertices, &ModelTransform::default(), EARTH_RADIUS)
    }

    #[test]
    fn test_project_lands_on_face_plane() {
        let solid = octahedron();
        let p = project_geo(DVec2::new(-45.0, 35.0), &solid);
        let offset = (p.position - solid.centers[p.face]).dot(solid.normals[p.face]);
        assert!(offset.abs() < 1e-6, "point must lie on the plane, offset {offset}");
        assert!(p.position.length() <= EARTH_RADIUS + 1e-6);
    }

    #[test]
    fn test_project_matches_brute_force_face() {
        let solid = octahedron();
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        for _ in 0..10_000 {
            let geo = DVec2::new(rng.random_range(-180.0..180.0), rng.random_range(-90.0..90.0));
            let point = geo_to_xyz(geo);
            let mut best = (usize::MAX, f64::INFINITY);
            for (id, center) in solid.centers.iter().enumerate() {
                let d = center.distance(point);
                if d < best.1 {
                    best = (id, d);
                }
            }
            assert_eq!(project(point, &solid).face, best.0, "face mismatch at {geo:?}");
        }
    }

    #[test]
    fn test_parallel_ray_is_degenerate() {
        let hit = intersect_plane(DVec3::ZERO, DVec3::X, DVec3::Y, DVec3::new(0.0, 1.0, 0.0));
        assert_eq!(hit, None);
        let hit = intersect_plane(DVec3::ZERO, DVec3::new(1.0, 2.0, 0.0), DVec3::Y, DVec3::Y);
        assert_eq!(hit, Some(DVec3::new(0.5, 1.0, 0.0)));
    }

    #[test]
    fn test_split_ring_counts() {
        let tri = [DVec3::X, DVec3::Y, DVec3::Z];
        assert_eq!(split_ring(&tri, 0).len(), 3);
        let split = split_ring(&tri, 1);
        assert_eq!(split.len(), 6);
        assert_eq!(split[1], DVec3::new(0.5, 0.5, 0.0), "midpoint of the first edge");
        assert_eq!(split_ring(&tri, 2).len(), 12);
    }

    #[test]
    fn test_fence_samples_each_edge() {
        let tri = [geo_to_xyz(DVec2::new(0.0, 0.0)), geo_to_xyz(DVec2::new(10.0, 0.0)), geo_to_xyz(DVec2::new(5.0, 10.0))];
        let outline = fence(&tri, 32);
        assert_eq!(outline.len(), 96);
        assert!((outline[16] - DVec2::new(5.0, 0.0)).length() < 1e-9, "chord midpoint keeps the meridian");
    }

    #[test]
    fn test_law_of_cos_equilateral() {
        let h = 3f64.sqrt() / 2.0;
        let angles = law_of_cos(DVec3::ZERO, DVec3::X, DVec3::new(0.5, h, 0.0));
        for angle in [angles.a, angles.b, angles.c] {
            assert!((angle - std::f64::consts::FRAC_PI_3).abs() < 1e-12);
        }
    }

    #[test]
    fn test_delta_xy_measures_altitude() {
        let h = 3f64.sqrt() / 2.0;
        let edge = [DVec3::ZERO, DVec3::X];
        let apex = DVec3::new(0.5, h, 0.0);
        let foot = DVec3::new(0.5, 0.0, 0.0);
        assert!((delta_xy(edge, foot).y - 0.5 * (FRAC_PI_6).cos()).abs() < 1e-12);
        assert!((delta_xy(edge, apex).y - (FRAC_PI_6).cos()).abs() < 1e-12);
        assert_eq!(delta_xy(edge, DVec3::ZERO), DVec2::ZERO);
    }
}
