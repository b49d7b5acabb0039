//! Densification of long feature segments before raster projection.

use geojson::{Feature, FeatureCollection, Geometry, Position, Value};

/// Segments longer than `threshold` degrees get `steps - 1` evenly spaced
/// points inserted along the chord.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Densify {
    pub threshold: f64,
    pub steps: usize,
}

impl Densify {
    #[must_use]
    pub const fn new(threshold: f64, steps: usize) -> Self {
        Self { threshold, steps }
    }

    /// Densify one coordinate run.
    #[must_use]
    pub fn line(&self, coords: &[Position]) -> Vec<Position> {
        let mut out = Vec::with_capacity(coords.len());
        for (idx, coord) in coords.iter().enumerate() {
            out.push(coord.clone());
            let Some(next) = coords.get(idx + 1) else {
                continue;
            };
            if planar_distance(coord, next) > self.threshold {
                for step in 1..self.steps {
                    out.push(lerp_position(coord, next, step as f64 / self.steps as f64));
                }
            }
        }
        out
    }

    pub fn geometry(&self, geometry: &mut Geometry) {
        match &mut geometry.value {
            Value::LineString(line) => *line = self.line(line),
            Value::MultiLineString(lines) | Value::Polygon(lines) => {
                for line in lines.iter_mut() {
                    *line = self.line(line);
                }
            }
            Value::MultiPolygon(polygons) => {
                for line in polygons.iter_mut().flatten() {
                    *line = self.line(line);
                }
            }
            Value::GeometryCollection(geometries) => {
                for geometry in geometries.iter_mut() {
                    self.geometry(geometry);
                }
            }
            Value::Point(_) | Value::MultiPoint(_) => {}
        }
    }

    pub fn feature(&self, feature: &mut Feature) {
        if let Some(geometry) = feature.geometry.as_mut() {
            self.geometry(geometry);
        }
    }

    pub fn collection(&self, collection: &mut FeatureCollection) {
        for feature in &mut collection.features {
            self.feature(feature);
        }
    }
}

fn planar_distance(a: &[f64], b: &[f64]) -> f64 {
    match (a, b) {
        ([ax, ay, ..], [bx, by, ..]) => (bx - ax).hypot(by - ay),
        _ => 0.0,
    }
}

fn lerp_position(a: &[f64], b: &[f64], t: f64) -> Position {
    a.iter().zip(b).map(|(a, b)| a + (b - a) * t).collect()
}
