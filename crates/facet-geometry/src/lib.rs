//! Geometry kernel for polyhedral globes.
//!
//! Geographic coordinates are `DVec2 { x: lon, y: lat }` in degrees. Solid
//! space is right-handed with `+Y` through the north pole and the prime
//! meridian on `+X`; vertices are scaled to [`EARTH_RADIUS`].

mod bbox;
mod coords;
mod math;
mod projection;
mod solid;
mod warp;

pub use bbox::{GeoBBox, ring_bbox, rings_to_wkt};
pub use coords::{EARTH_RADIUS, geo_to_xyz, xyz_to_geo};
pub use math::{lerp, map_range, point_in_ring, polygon_area};
pub use projection::{
    PARALLEL_EPSILON, Projected, TriangleAngles, delta_xy, fence, intersect_plane, interpolate,
    law_of_cos, project, project_geo, split_ring,
};
pub use solid::{ModelTransform, Solid};
pub use warp::{WarpHint, warp};
