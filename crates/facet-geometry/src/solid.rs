//! Polyhedral solid: placed vertices, faces and derived per-face data.

use glam::{DMat4, DVec2, DVec3};

use crate::coords::xyz_to_geo;
use crate::math::polygon_area;

/// Placement of a unit solid in world space, applied as `T * Rx * Ry * Rz * S`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ModelTransform {
    pub translation: DVec3,
    /// Euler angles in degrees.
    pub rotation: DVec3,
    pub scale: DVec3,
}

impl Default for ModelTransform {
    fn default() -> Self {
        Self {
            translation: DVec3::ZERO,
            rotation: DVec3::ZERO,
            scale: DVec3::ONE,
        }
    }
}

impl ModelTransform {
    #[must_use]
    pub fn rotated(rotation: DVec3) -> Self {
        Self {
            rotation,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn matrix(&self) -> DMat4 {
        DMat4::from_translation(self.translation)
            * DMat4::from_rotation_x(self.rotation.x.to_radians())
            * DMat4::from_rotation_y(self.rotation.y.to_radians())
            * DMat4::from_rotation_z(self.rotation.z.to_radians())
            * DMat4::from_scale(self.scale)
    }
}

/// A solid built once per shape selection.
///
/// Per-face vectors (`planes`, `normals`, `centers`, `near`, `rotations`) are
/// all indexed by face id.
#[derive(Clone, Debug)]
pub struct Solid {
    pub vertices: Vec<DVec3>,
    pub faces: Vec<Vec<usize>>,
    /// Face corner positions, in face winding order.
    pub planes: Vec<Vec<DVec3>>,
    pub normals: Vec<DVec3>,
    pub centers: Vec<DVec3>,
    /// The three faces with the nearest centers, closest first.
    pub near: Vec<Vec<usize>>,
    /// Geographic position of each face center.
    pub rotations: Vec<DVec2>,
    pub radius: f64,
}

impl Solid {
    /// Scale unit `vertices` by `radius`, place them with `transform` and
    /// derive the per-face data.
    #[must_use]
    pub fn build(
        faces: &[Vec<usize>],
        vertices: &[DVec3],
        transform: &ModelTransform,
        radius: f64,
    ) -> Self {
        let matrix = transform.matrix();
        let vertices: Vec<DVec3> = vertices
            .iter()
            .map(|v| matrix.transform_point3(*v * radius))
            .collect();

        let planes: Vec<Vec<DVec3>> = faces
            .iter()
            .map(|face| face.iter().map(|&id| vertices[id]).collect())
            .collect();

        let centers: Vec<DVec3> = planes
            .iter()
            .map(|plane| plane.iter().copied().sum::<DVec3>() / plane.len().max(1) as f64)
            .collect();

        let normals = planes
            .iter()
            .map(|plane| match plane.as_slice() {
                [a, b, c, ..] => (*b - *a).cross(*c - *a).normalize_or_zero(),
                _ => DVec3::ZERO,
            })
            .collect();

        let near = centers
            .iter()
            .enumerate()
            .map(|(id, center)| {
                let mut others: Vec<(usize, f64)> = centers
                    .iter()
                    .enumerate()
                    .filter(|(other, _)| *other != id)
                    .map(|(other, c)| (other, center.distance(*c)))
                    .collect();
                others.sort_by(|a, b| a.1.total_cmp(&b.1));
                others.into_iter().take(3).map(|(other, _)| other).collect()
            })
            .collect();

        let rotations = centers.iter().map(|c| xyz_to_geo(*c)).collect();

        Self {
            vertices,
            faces: faces.to_vec(),
            planes,
            normals,
            centers,
            near,
            rotations,
            radius,
        }
    }

    #[inline]
    #[must_use]
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Face whose center is nearest to `point`.
    #[must_use]
    pub fn face_of(&self, point: DVec3) -> usize {
        self.centers
            .iter()
            .enumerate()
            .min_by(|a, b| a.1.distance_squared(point).total_cmp(&b.1.distance_squared(point)))
            .map_or(0, |(id, _)| id)
    }

    #[must_use]
    pub fn face_area(&self, face: usize) -> f64 {
        self.planes.get(face).map_or(0.0, |plane| polygon_area(plane))
    }

    #[must_use]
    pub fn total_surface_area(&self) -> f64 {
        (0..self.face_count()).map(|f| self.face_area(f)).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_cube() -> (Vec<Vec<usize>>, Vec<DVec3>) {
        let vertices = vec![
            DVec3::new(-0.5, -0.5, 0.5),
            DVec3::new(0.5, -0.5, 0.5),
            DVec3::new(0.5, 0.5, 0.5),
            DVec3::new(-0.5, 0.5, 0.5),
            DVec3::new(-0.5, -0.5, -0.5),
            DVec3::new(0.5, -0.5, -0.5),
            DVec3::new(0.5, 0.5, -0.5),
            DVec3::new(-0.5, 0.5, -0.5),
        ];
        let faces = vec![
            vec![0, 1, 2, 3],
            vec![5, 4, 7, 6],
            vec![3, 2, 6, 7],
            vec![4, 5, 1, 0],
            vec![1, 5, 6, 2],
            vec![4, 0, 3, 7],
        ];
        (faces, vertices)
    }

    #[test]
    fn test_build_scales_and_derives() {
        let (faces, vertices) = unit_cube();
        let solid = Solid::build(&faces, &vertices, &ModelTransform::default(), 2.0);
        assert_eq!(solid.face_count(), 6);
        assert!((solid.centers[0] - DVec3::new(0.0, 0.0, 1.0)).length() < 1e-12);
        assert!((solid.normals[0] - DVec3::Z).length() < 1e-12, "outward normal of +Z face");
        assert!((solid.total_surface_area() - 24.0).abs() < 1e-9);
    }

    #[test]
    fn test_near_excludes_self_and_opposite() {
        let (faces, vertices) = unit_cube();
        let solid = Solid::build(&faces, &vertices, &ModelTransform::default(), 1.0);
        for (face, near) in solid.near.iter().enumerate() {
            assert_eq!(near.len(), 3);
            assert!(!near.contains(&face), "face {face} lists itself");
            for other in near {
                let dot = solid.normals[face].dot(solid.normals[*other]);
                assert!(dot.abs() < 1e-9, "near faces of a cube are perpendicular");
            }
        }
    }

    #[test]
    fn test_rotation_moves_centers() {
        let (faces, vertices) = unit_cube();
        let transform = ModelTransform::rotated(DVec3::new(0.0, 90.0, 0.0));
        let solid = Solid::build(&faces, &vertices, &transform, 1.0);
        assert!((solid.centers[0] - DVec3::new(0.5, 0.0, 0.0)).length() < 1e-12);
        assert_eq!(solid.face_of(DVec3::new(10.0, 0.1, 0.0)), 0);
    }

    #[test]
    fn test_rotations_are_geographic_centers() {
        let (faces, vertices) = unit_cube();
        let solid = Solid::build(&faces, &vertices, &ModelTransform::default(), 1.0);
        assert!((solid.rotations[2].y - 90.0).abs() < 1e-9, "top face center is the pole");
    }
}
