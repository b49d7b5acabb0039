//! Small numeric helpers shared by the shape transforms.

use glam::{DVec2, DVec3};

/// Linearly remap `value` from `[in_min, in_max]` to `[out_min, out_max]`.
///
/// A zero-width input range maps everything to `out_min`.
#[inline]
#[must_use]
pub fn map_range(value: f64, in_min: f64, in_max: f64, out_min: f64, out_max: f64) -> f64 {
    let span = in_max - in_min;
    if span == 0.0 {
        return out_min;
    }
    out_min + (value - in_min) * (out_max - out_min) / span
}

#[inline]
#[must_use]
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Even-odd containment test for a 2D ring (open or closed).
#[must_use]
pub fn point_in_ring(point: DVec2, ring: &[DVec2]) -> bool {
    let n = ring.len();
    if n < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (a, b) = (ring[i], ring[j]);
        if (a.y > point.y) != (b.y > point.y) {
            let x = (b.x - a.x) * (point.y - a.y) / (b.y - a.y) + a.x;
            if point.x < x {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Area of a planar polygon embedded in 3D.
#[must_use]
pub fn polygon_area(vertices: &[DVec3]) -> f64 {
    if vertices.len() < 3 {
        return 0.0;
    }
    let origin = vertices[0];
    let twice: DVec3 = vertices
        .windows(2)
        .skip(1)
        .map(|w| (w[0] - origin).cross(w[1] - origin))
        .sum();
    twice.length() / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_range() {
        assert_eq!(map_range(5.0, 0.0, 10.0, 0.0, 100.0), 50.0);
        assert_eq!(map_range(-45.0, -90.0, 0.0, 512.0, 0.0), 256.0);
        assert_eq!(map_range(3.0, 1.0, 1.0, 7.0, 9.0), 7.0, "degenerate range");
    }

    #[test]
    fn test_point_in_ring() {
        let square = [
            DVec2::new(0.0, 0.0),
            DVec2::new(4.0, 0.0),
            DVec2::new(4.0, 4.0),
            DVec2::new(0.0, 4.0),
        ];
        assert!(point_in_ring(DVec2::new(2.0, 2.0), &square));
        assert!(!point_in_ring(DVec2::new(5.0, 2.0), &square));
        assert!(!point_in_ring(DVec2::new(1.0, 1.0), &square[..2]));
    }

    #[test]
    fn test_polygon_area() {
        let quad = [
            DVec3::new(0.0, 0.0, 0.0),
            DVec3::new(2.0, 0.0, 0.0),
            DVec3::new(2.0, 0.0, 3.0),
            DVec3::new(0.0, 0.0, 3.0),
        ];
        assert!((polygon_area(&quad) - 6.0).abs() < 1e-12);
        assert!((polygon_area(&quad[..3]) - 3.0).abs() < 1e-12);
    }
}
