//! Interactive view state: orbit, camera and when to re-tile.
//!
//! Pointer drags and wheel steps move the orbit at once so the camera
//! follows every frame, but the tile set is only recomputed after the input
//! has been quiet for the debounce period.

use std::time::{Duration, Instant};

use facet_config::Config;
use facet_geometry::EARTH_RADIUS;
use facet_render::{Camera, Orbit};
use facet_shapes::TileQuery;
use glam::{DVec2, DVec3};
use winit::event::MouseScrollDelta;

/// Camera distance from the centre, in solid radii.
pub const CAMERA_DISTANCE: f64 = 3.0;

/// Fires once after the last poke has been quiet for `delay`.
#[derive(Clone, Copy, Debug)]
pub struct Debounce {
    delay: Duration,
    pending: Option<Instant>,
}

impl Debounce {
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self { delay, pending: None }
    }

    pub fn poke(&mut self, now: Instant) {
        self.pending = Some(now + self.delay);
    }

    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.pending
    }

    /// True exactly once per burst, when its quiet period has passed.
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.pending {
            Some(at) if now >= at => {
                self.pending = None;
                true
            }
            _ => false,
        }
    }
}

/// Wheel notches as whole zoom steps; up zooms in.
#[must_use]
pub fn wheel_steps(delta: MouseScrollDelta) -> i32 {
    let y = match delta {
        MouseScrollDelta::LineDelta(_, y) => f64::from(y),
        MouseScrollDelta::PixelDelta(position) => position.y,
    };
    if y > 0.0 {
        1
    } else if y < 0.0 {
        -1
    } else {
        0
    }
}

pub struct View {
    pub orbit: Orbit,
    pub camera: Camera,
    base_zoom: f64,
    debounce: Debounce,
    dragging: bool,
    cursor: Option<DVec2>,
}

impl View {
    #[must_use]
    pub fn new(config: &Config, max_zoom: u32, viewport: (u32, u32)) -> Self {
        let center = DVec2::from_array(config.view.center);
        let orbit = Orbit::new(center, config.view.zoom, max_zoom)
            .with_limits(config.view.max_latitude, config.view.drag_sensitivity);
        let mut view = Self {
            orbit,
            camera: Camera::ortho(EARTH_RADIUS, Self::distance(), 1.0),
            base_zoom: 1.0,
            debounce: Debounce::new(Duration::from_millis(config.view.zoom_debounce_ms)),
            dragging: false,
            cursor: None,
        };
        view.resize(viewport);
        view
    }

    fn distance() -> f64 {
        CAMERA_DISTANCE * EARTH_RADIUS
    }

    /// Refit the solid to the shorter side of the viewport.
    pub fn resize(&mut self, (width, height): (u32, u32)) {
        let viewport = f64::from(width.min(height).max(1));
        self.camera = Camera::ortho(EARTH_RADIUS, Self::distance(), viewport);
        self.base_zoom = self.camera.zoom;
        self.orbit.apply(&mut self.camera, Self::distance(), self.base_zoom);
    }

    /// A new shape may allow fewer zoom levels.
    pub fn set_max_zoom(&mut self, max_zoom: u32) {
        self.orbit.max_zoom = max_zoom;
        self.orbit.zoom = self.orbit.zoom.min(max_zoom);
        self.orbit.apply(&mut self.camera, Self::distance(), self.base_zoom);
    }

    pub fn press(&mut self, pressed: bool, now: Instant) {
        if self.dragging && !pressed {
            self.debounce.poke(now);
        }
        self.dragging = pressed;
    }

    /// Returns whether the orbit moved.
    pub fn cursor_moved(&mut self, position: DVec2, now: Instant) -> bool {
        let previous = self.cursor.replace(position);
        let Some(previous) = previous.filter(|_| self.dragging) else {
            return false;
        };
        let delta = position - previous;
        if delta == DVec2::ZERO {
            return false;
        }
        self.orbit.drag(delta);
        self.orbit.apply(&mut self.camera, Self::distance(), self.base_zoom);
        self.debounce.poke(now);
        true
    }

    /// Returns whether the zoom level changed.
    pub fn wheel(&mut self, steps: i32, now: Instant) -> bool {
        if steps == 0 || !self.orbit.zoom_by(steps) {
            return false;
        }
        self.orbit.apply(&mut self.camera, Self::distance(), self.base_zoom);
        self.debounce.poke(now);
        true
    }

    #[must_use]
    pub fn eye(&self) -> DVec3 {
        self.orbit.eye(Self::distance())
    }

    #[must_use]
    pub fn query(&self) -> TileQuery {
        TileQuery::new(self.orbit.zoom, self.orbit.center).with_camera(self.eye())
    }

    /// The query to re-tile with, once input has settled.
    pub fn settled_query(&mut self, now: Instant) -> Option<TileQuery> {
        self.debounce.fire(now).then(|| self.query())
    }

    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.debounce.deadline()
    }
}
