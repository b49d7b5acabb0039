//! Tiles: identity, solid-space surface, geographic bounds and raster frame.

use std::fmt;

use facet_geometry::{GeoBBox, geo_to_xyz, intersect_plane, polygon_area, ring_bbox};
use glam::{DAffine2, DVec2, DVec3};

use crate::kind::ShapeKind;

/// Stable tile identity.
///
/// The same geographic tile at the same zoom always yields the same id, so
/// feature caches keyed by it keep hitting across view updates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileId {
    pub shape: ShapeKind,
    pub zoom: u32,
    pub face: usize,
    /// Sub-triangle row indices counted from each face corner, for shapes
    /// that subdivide their faces.
    pub sub: Option<[u32; 3]>,
}

impl TileId {
    #[must_use]
    pub fn face(shape: ShapeKind, zoom: u32, face: usize) -> Self {
        Self {
            shape,
            zoom,
            face,
            sub: None,
        }
    }

    /// File-name friendly form without the shape prefix.
    #[must_use]
    pub fn key(&self) -> String {
        match self.sub {
            Some([a, b, c]) => format!("z{}_t{}_a{a}_b{b}_c{c}", self.zoom, self.face),
            None => format!("z{}_t{}", self.zoom, self.face),
        }
    }
}

impl fmt::Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.shape, self.key())
    }
}

/// A link from a tile to the tile across one of its edges.
#[derive(Clone, Debug, PartialEq)]
pub struct Neighbor {
    pub id: TileId,
    /// The edge midpoint reflected through the tile center.
    pub center: DVec3,
    /// Edge start, a point 60% of the way toward `center`, edge end.
    pub points: [DVec3; 3],
}

/// Textured mesh draped over a tile's surface.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TileModel {
    pub positions: Vec<DVec3>,
    pub uvs: Vec<DVec2>,
    pub indices: Vec<u32>,
}

impl TileModel {
    #[must_use]
    pub fn new(positions: Vec<DVec3>, uvs: &[[f64; 2]], indices: &[u32]) -> Self {
        Self {
            positions,
            uvs: uvs.iter().map(|uv| DVec2::from_array(*uv)).collect(),
            indices: indices.to_vec(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Tile {
    pub id: TileId,
    /// Tile polygon on its face plane, in solid space.
    pub surface: Vec<DVec3>,
    pub center: DVec3,
    /// Geographic outline; two rings when split at the antimeridian.
    pub bounds: Vec<Vec<DVec2>>,
    pub bbox: Vec<GeoBBox>,
    /// Whether a triangular tile points the same way as its face.
    pub up: bool,
    pub neighbors: Vec<Neighbor>,
    pub model: TileModel,
    /// One closed WKT polygon per bounds ring, filled in by the tiling engine.
    pub wkt: Vec<String>,
}

impl Tile {
    /// Build a whole-face tile from axis-aligned geographic boxes
    /// `[min_lon, min_lat, max_lon, max_lat]`.
    #[must_use]
    pub(crate) fn from_face(
        id: TileId,
        surface: Vec<DVec3>,
        center: DVec3,
        boxes: &[[f64; 4]],
        model: TileModel,
    ) -> Self {
        let bounds: Vec<Vec<DVec2>> = boxes
            .iter()
            .map(|[x0, y0, x1, y1]| {
                vec![
                    DVec2::new(*x0, *y0),
                    DVec2::new(*x0, *y1),
                    DVec2::new(*x1, *y1),
                    DVec2::new(*x1, *y0),
                ]
            })
            .collect();
        let bbox = bounds.iter().filter_map(|ring| ring_bbox(ring)).collect();
        Self {
            id,
            surface,
            center,
            bounds,
            bbox,
            up: true,
            neighbors: Vec::new(),
            model,
            wkt: Vec::new(),
        }
    }

    #[inline]
    #[must_use]
    pub fn face(&self) -> usize {
        self.id.face
    }

    /// Area of the tile surface in solid units.
    #[must_use]
    pub fn area(&self) -> f64 {
        polygon_area(&self.surface)
    }
}

/// What a view needs tiles for.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TileQuery {
    pub zoom: u32,
    /// View center `[lon, lat]` in degrees.
    pub center: DVec2,
    /// Camera position in solid space, when back faces should be culled.
    pub camera: Option<DVec3>,
}

impl TileQuery {
    #[must_use]
    pub fn new(zoom: u32, center: DVec2) -> Self {
        Self {
            zoom,
            center,
            camera: None,
        }
    }

    #[must_use]
    pub fn with_camera(mut self, camera: DVec3) -> Self {
        self.camera = Some(camera);
        self
    }
}

/// Raster size of one tile texture in pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TileSize {
    pub width: f64,
    pub height: f64,
}

impl TileSize {
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    #[must_use]
    pub fn scaled(self, factor: f64) -> Self {
        Self::new(self.width * factor, self.height * factor)
    }

    /// Whole pixel dimensions, truncated and never zero.
    #[must_use]
    pub fn pixels(self) -> (u32, u32) {
        (
            self.width.max(1.0) as u32,
            self.height.max(1.0) as u32,
        )
    }
}

/// Maps points on a face plane into tile raster space.
///
/// Built from three surface corners and the raster positions they land on;
/// geographic input is first pushed onto the plane along the ray from the
/// solid center.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlaneMap {
    origin: DVec3,
    normal: DVec3,
    dual: [DVec3; 2],
    raster: DAffine2,
}

impl PlaneMap {
    /// `None` when the corners are collinear.
    #[must_use]
    pub fn new(corners: [DVec3; 3], normal: DVec3, raster: [DVec2; 3]) -> Option<Self> {
        let e1 = corners[1] - corners[0];
        let e2 = corners[2] - corners[0];
        let (a, b, c) = (e1.dot(e1), e1.dot(e2), e2.dot(e2));
        let det = a * c - b * b;
        if det.abs() <= f64::EPSILON * a.max(c).max(1.0) {
            return None;
        }
        Some(Self {
            origin: corners[0],
            normal,
            dual: [(e1 * c - e2 * b) / det, (e2 * a - e1 * b) / det],
            raster: DAffine2::from_cols(raster[1] - raster[0], raster[2] - raster[0], raster[0]),
        })
    }

    /// Raster position of a point already on the plane.
    #[must_use]
    pub fn plane_to_raster(&self, point: DVec3) -> DVec2 {
        let d = point - self.origin;
        self.raster
            .transform_point2(DVec2::new(d.dot(self.dual[0]), d.dot(self.dual[1])))
    }

    /// Raster position of `[lon, lat]`; the origin when the ray misses the plane.
    #[must_use]
    pub fn project(&self, lon_lat: DVec2) -> DVec2 {
        intersect_plane(DVec3::ZERO, geo_to_xyz(lon_lat), self.normal, self.origin)
            .map_or(DVec2::ZERO, |hit| self.plane_to_raster(hit))
    }
}

/// Where a tile lands in raster space.
#[derive(Clone, Debug, PartialEq)]
pub struct TileFrame {
    pub size: TileSize,
    /// The tile outline in raster pixels, used as the background polygon.
    pub surface: Vec<DVec2>,
    /// Plane mapping for shapes that project gnomonically.
    pub plane: Option<PlaneMap>,
}

impl TileFrame {
    /// Axis-aligned frame covering the whole raster.
    #[must_use]
    pub fn rect(size: TileSize) -> Self {
        let (w, h) = (size.width, size.height);
        Self {
            size,
            surface: vec![
                DVec2::new(0.0, 0.0),
                DVec2::new(0.0, h),
                DVec2::new(w, h),
                DVec2::new(w, 0.0),
            ],
            plane: None,
        }
    }

    /// Triangle frame with its apex at the top center.
    #[must_use]
    pub fn apex(size: TileSize) -> Self {
        let (w, h) = (size.width, size.height);
        Self {
            size,
            surface: vec![DVec2::new(w / 2.0, 0.0), DVec2::new(0.0, h), DVec2::new(w, h)],
            plane: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use facet_geometry::EARTH_RADIUS;

    use super::*;

    #[test]
    fn test_tile_id_display() {
        let id = TileId {
            shape: ShapeKind::Icosahedron,
            zoom: 2,
            face: 7,
            sub: Some([1, 0, 3]),
        };
        assert_eq!(id.to_string(), "icosahedron:z2_t7_a1_b0_c3");
        let face = TileId::face(ShapeKind::Cube, 0, 4);
        assert_eq!(face.to_string(), "cube:z0_t4");
        assert!(face.key().starts_with('z') && id.key().starts_with('z'), "face and sub-tile keys share the zoom prefix");
    }

    #[test]
    fn test_from_face_bounds() {
        let tile = Tile::from_face(
            TileId::face(ShapeKind::Cube, 0, 2),
            vec![DVec3::ZERO, DVec3::X, DVec3::Y],
            DVec3::ZERO,
            &[[-90.0, -45.0, 0.0, 45.0]],
            TileModel::default(),
        );
        assert_eq!(tile.bbox, vec![GeoBBox::new(-90.0, -45.0, 0.0, 45.0)]);
        assert_eq!(tile.bounds[0].len(), 4);
    }

    #[test]
    fn test_plane_map_corners() {
        let corners = [
            DVec3::new(EARTH_RADIUS, 0.0, 0.0),
            DVec3::new(EARTH_RADIUS, -1000.0, -1000.0),
            DVec3::new(EARTH_RADIUS, -1000.0, 1000.0),
        ];
        let raster = [DVec2::new(50.0, 0.0), DVec2::new(0.0, 100.0), DVec2::new(100.0, 100.0)];
        let map = PlaneMap::new(corners, DVec3::X, raster).expect("corners span a plane");
        for (corner, expected) in corners.iter().zip(raster) {
            let got = map.plane_to_raster(*corner);
            assert!((got - expected).length() < 1e-9, "{got} != {expected}");
        }
        let mid = map.plane_to_raster((corners[1] + corners[2]) / 2.0);
        assert!((mid - DVec2::new(50.0, 100.0)).length() < 1e-9);
    }

    #[test]
    fn test_plane_map_rejects_collinear() {
        let corners = [DVec3::ZERO, DVec3::X, DVec3::X * 2.0];
        assert!(PlaneMap::new(corners, DVec3::Y, [DVec2::ZERO; 3]).is_none());
    }

    #[test]
    fn test_size_pixels() {
        assert_eq!(TileSize::new(443.9, 0.2).pixels(), (443, 1));
        assert_eq!(TileSize::new(10.0, 20.0).scaled(2.0), TileSize::new(20.0, 40.0));
    }
}
