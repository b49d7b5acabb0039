//! Simplify and clip features to tile boxes.

use std::panic::{AssertUnwindSafe, catch_unwind};

use facet_geometry::GeoBBox;
use geo::{BooleanOps, BoundingRect, Geometry, MultiLineString, MultiPoint, MultiPolygon, Rect, Simplify, coord};
use geojson::{Feature, FeatureCollection, Value};
use glam::DVec2;
use tracing::debug;

/// Douglas-Peucker tolerance in degrees at zoom 0.
pub const BASE_TOLERANCE: f64 = 0.4;

#[must_use]
pub fn tolerance(base: f64, zoom: u32) -> f64 {
    base / f64::from(1u32 << zoom.min(31))
}

fn rect(bbox: &GeoBBox) -> Rect {
    Rect::new(coord! { x: bbox.min.x, y: bbox.min.y }, coord! { x: bbox.max.x, y: bbox.max.y })
}

fn simplify(geometry: Geometry, epsilon: f64) -> Geometry {
    match geometry {
        Geometry::LineString(g) => Geometry::LineString(g.simplify(&epsilon)),
        Geometry::MultiLineString(g) => Geometry::MultiLineString(g.simplify(&epsilon)),
        Geometry::Polygon(g) => Geometry::Polygon(g.simplify(&epsilon)),
        Geometry::MultiPolygon(g) => Geometry::MultiPolygon(g.simplify(&epsilon)),
        other => other,
    }
}

/// The part of `geometry` inside `bbox`, or `None` when nothing is left.
///
/// Boolean ops can panic on degenerate rings; those features are kept whole
/// if their bounds touch the box.
fn clip(geometry: &Geometry, bbox: &GeoBBox) -> Option<Geometry> {
    let window = rect(bbox).to_polygon();
    let clipped = catch_unwind(AssertUnwindSafe(|| match geometry {
        Geometry::Point(p) => bbox.contains(DVec2::new(p.x(), p.y())).then(|| Geometry::Point(*p)),
        Geometry::MultiPoint(points) => {
            let inside: Vec<_> = points
                .iter()
                .filter(|p| bbox.contains(DVec2::new(p.x(), p.y())))
                .copied()
                .collect();
            (!inside.is_empty()).then(|| Geometry::MultiPoint(MultiPoint::new(inside)))
        }
        Geometry::LineString(line) => {
            let lines = window.clip(&MultiLineString::new(vec![line.clone()]), false);
            (!lines.0.is_empty()).then_some(Geometry::MultiLineString(lines))
        }
        Geometry::MultiLineString(lines) => {
            let lines = window.clip(lines, false);
            (!lines.0.is_empty()).then_some(Geometry::MultiLineString(lines))
        }
        Geometry::Polygon(polygon) => non_empty(polygon.intersection(&window)),
        Geometry::MultiPolygon(polygons) => non_empty(polygons.intersection(&MultiPolygon::new(vec![window.clone()]))),
        other => touches(other, bbox).then(|| other.clone()),
    }));
    match clipped {
        Ok(result) => result,
        Err(_) => {
            debug!(bbox = ?bbox.to_array(), "clip failed, keeping feature whole");
            touches(geometry, bbox).then(|| geometry.clone())
        }
    }
}

fn non_empty(polygons: MultiPolygon) -> Option<Geometry> {
    (!polygons.0.is_empty()).then_some(Geometry::MultiPolygon(polygons))
}

fn touches(geometry: &Geometry, bbox: &GeoBBox) -> bool {
    geometry.bounding_rect().is_some_and(|r| {
        let b = GeoBBox::new(r.min().x, r.min().y, r.max().x, r.max().y);
        b.intersects(bbox)
    })
}

/// Simplify (when `epsilon` is set) and clip every feature to each box.
///
/// A feature crossing several boxes yields one clipped copy per box.
/// Features whose geometry cannot be converted are dropped.
#[must_use]
pub fn clip_collection(collection: &FeatureCollection, boxes: &[GeoBBox], epsilon: Option<f64>) -> FeatureCollection {
    let mut features = Vec::new();
    for feature in &collection.features {
        let Some(geometry) = feature.geometry.as_ref() else {
            continue;
        };
        let Ok(mut shape) = Geometry::<f64>::try_from(geometry.value.clone()) else {
            continue;
        };
        if let Some(epsilon) = epsilon {
            shape = simplify(shape, epsilon);
        }
        for bbox in boxes {
            if let Some(part) = clip(&shape, bbox) {
                features.push(Feature {
                    geometry: Some(geojson::Geometry::new(Value::from(&part))),
                    ..feature.clone()
                });
            }
        }
    }
    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}
