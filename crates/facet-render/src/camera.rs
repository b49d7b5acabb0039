//! View and projection matrices, and the orbit that drives them.

use glam::{DMat4, DVec2, DVec3, Mat4};

use crate::pipeline::CameraUniform;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Projection {
    /// `zoom` is pixels per world unit.
    Ortho,
    /// Vertical field of view in degrees, narrowed by `zoom`.
    Perspective { fov_y: f64 },
}

/// One logical camera looking at the solid.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    pub projection: Projection,
    pub position: DVec3,
    pub target: DVec3,
    pub up: DVec3,
    pub near: f64,
    pub far: f64,
    pub zoom: f64,
}

impl Camera {
    /// An orthographic camera at `distance` on +Z, framing a sphere of
    /// `radius` inside a `viewport`-pixel square.
    #[must_use]
    pub fn ortho(radius: f64, distance: f64, viewport: f64) -> Self {
        Self {
            projection: Projection::Ortho,
            position: DVec3::new(0.0, 0.0, distance),
            target: DVec3::ZERO,
            up: DVec3::Y,
            near: (distance - radius * 1.5).max(radius * 0.01),
            far: distance + radius * 1.5,
            zoom: viewport / (radius * 2.4),
        }
    }

    #[must_use]
    pub fn view_matrix(&self) -> DMat4 {
        DMat4::look_at_rh(self.position, self.target, self.up)
    }

    /// Reverse-Z projection: near maps to depth 1, far to 0.
    #[must_use]
    pub fn projection_matrix(&self, width: f64, height: f64) -> DMat4 {
        let (width, height) = (width.max(1.0), height.max(1.0));
        match self.projection {
            Projection::Ortho => {
                let (hw, hh) = (width / 2.0 / self.zoom, height / 2.0 / self.zoom);
                DMat4::orthographic_rh(-hw, hw, -hh, hh, self.far, self.near)
            }
            Projection::Perspective { fov_y } => {
                let fov = (fov_y / self.zoom.max(1.0)).to_radians();
                DMat4::perspective_rh(fov, width / height, self.far, self.near)
            }
        }
    }

    #[must_use]
    pub fn view_projection(&self, width: f64, height: f64) -> Mat4 {
        (self.projection_matrix(width, height) * self.view_matrix()).as_mat4()
    }

    #[must_use]
    pub fn to_uniform(&self, width: f64, height: f64) -> CameraUniform {
        CameraUniform {
            view_proj: self.view_projection(width, height).to_cols_array_2d(),
        }
    }
}

/// Longitude, latitude and zoom of the view, moved by dragging and the wheel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Orbit {
    /// View center `[lon, lat]` in degrees.
    pub center: DVec2,
    pub zoom: u32,
    pub max_zoom: u32,
    pub max_latitude: f64,
    /// Degrees per dragged pixel at zoom 0.
    pub sensitivity: f64,
}

impl Orbit {
    #[must_use]
    pub fn new(center: DVec2, zoom: u32, max_zoom: u32) -> Self {
        let mut orbit = Self {
            center: DVec2::ZERO,
            zoom: zoom.min(max_zoom),
            max_zoom,
            max_latitude: 80.0,
            sensitivity: 0.02,
        };
        orbit.set_center(center);
        orbit
    }

    #[must_use]
    pub fn with_limits(mut self, max_latitude: f64, sensitivity: f64) -> Self {
        self.max_latitude = max_latitude;
        self.sensitivity = sensitivity;
        self.set_center(self.center);
        self
    }

    /// Wrap longitude into `[-180, 180)` and clamp latitude.
    pub fn set_center(&mut self, center: DVec2) {
        let lon = (center.x + 180.0).rem_euclid(360.0) - 180.0;
        let lat = center.y.clamp(-self.max_latitude, self.max_latitude);
        self.center = DVec2::new(lon, lat);
    }

    /// Dragging right or down turns the globe with the pointer.
    pub fn drag(&mut self, delta_px: DVec2) {
        let step = self.sensitivity / f64::from(1u32 << self.zoom.min(31));
        self.set_center(DVec2::new(self.center.x - delta_px.x * step, self.center.y + delta_px.y * step));
    }

    /// Step the zoom level; returns whether it changed.
    pub fn zoom_by(&mut self, steps: i32) -> bool {
        let zoom = (i64::from(self.zoom) + i64::from(steps)).clamp(0, i64::from(self.max_zoom)) as u32;
        let changed = zoom != self.zoom;
        self.zoom = zoom;
        changed
    }

    /// Camera position `Ry(lon + 90) * Rx(-lat) * (0, 0, distance)`.
    #[must_use]
    pub fn eye(&self, distance: f64) -> DVec3 {
        let rotation = DMat4::from_rotation_y((self.center.x + 90.0).to_radians())
            * DMat4::from_rotation_x((-self.center.y).to_radians());
        rotation.transform_point3(DVec3::new(0.0, 0.0, distance))
    }

    /// Place `camera` for this orbit; ortho cameras double their scale per level.
    pub fn apply(&self, camera: &mut Camera, distance: f64, base_zoom: f64) {
        camera.position = self.eye(distance);
        camera.target = DVec3::ZERO;
        camera.up = DVec3::Y;
        camera.zoom = base_zoom * f64::from(1u32 << self.zoom.min(31));
    }
}

#[cfg(test)]
mod tests {
    use facet_geometry::{EARTH_RADIUS, geo_to_xyz};

    use super::*;

    #[test]
    fn test_eye_looks_down_on_center() {
        for center in [DVec2::ZERO, DVec2::new(90.0, 0.0), DVec2::new(-120.0, 45.0), DVec2::new(10.0, -60.0)] {
            let orbit = Orbit::new(center, 0, 4);
            let eye = orbit.eye(3.0 * EARTH_RADIUS);
            let expected = geo_to_xyz(center) * 3.0;
            assert!((eye - expected).length() < 1e-3, "{center}: {eye} vs {expected}");
        }
    }

    #[test]
    fn test_drag_wraps_and_clamps() {
        let mut orbit = Orbit::new(DVec2::new(179.0, 79.0), 0, 4);
        orbit.drag(DVec2::new(-100.0, 100.0));
        assert!((orbit.center.x - -179.0).abs() < 1e-9, "wrapped to {}", orbit.center.x);
        assert_eq!(orbit.center.y, 80.0, "latitude clamped");

        let mut zoomed = Orbit::new(DVec2::ZERO, 2, 4);
        zoomed.drag(DVec2::new(100.0, 0.0));
        assert!((zoomed.center.x - -0.5).abs() < 1e-9, "drag slows with zoom: {}", zoomed.center.x);
    }

    #[test]
    fn test_zoom_clamped_to_shape() {
        let mut orbit = Orbit::new(DVec2::ZERO, 9, 3);
        assert_eq!(orbit.zoom, 3);
        assert!(!orbit.zoom_by(1));
        assert!(orbit.zoom_by(-5));
        assert_eq!(orbit.zoom, 0);
    }

    #[test]
    fn test_center_projects_to_screen_center() {
        let mut camera = Camera::ortho(EARTH_RADIUS, 3.0 * EARTH_RADIUS, 512.0);
        let orbit = Orbit::new(DVec2::new(30.0, 20.0), 0, 4);
        let base = camera.zoom;
        orbit.apply(&mut camera, 3.0 * EARTH_RADIUS, base);
        let vp = camera.projection_matrix(512.0, 512.0) * camera.view_matrix();
        let clip = vp.project_point3(geo_to_xyz(orbit.center));
        assert!(clip.x.abs() < 1e-6 && clip.y.abs() < 1e-6, "center at {clip}");
        assert!(clip.z > 0.0 && clip.z < 1.0, "inside the depth range: {}", clip.z);
        let back = vp.project_point3(-geo_to_xyz(orbit.center));
        assert!(back.z < clip.z, "reverse-Z: the far side is deeper");
    }

    #[test]
    fn test_perspective_matrix_is_finite() {
        let mut camera = Camera::ortho(1.0, 3.0, 100.0);
        camera.projection = Projection::Perspective { fov_y: 60.0 };
        let vp = camera.view_projection(800.0, 0.0);
        assert!(vp.is_finite(), "zero height is clamped");
    }
}
