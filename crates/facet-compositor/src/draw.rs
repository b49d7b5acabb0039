//! Feature geometry in raster space and the primitives that paint it.

use facet_raster::{Canvas, FillRule, Path};
use facet_shapes::{ShapeStrategy, Tile, TileFrame, TransformKind};
use geojson::{Position, Value};
use glam::DVec2;

use crate::style::StyleRule;
use crate::value::Properties;

/// One geometry after projection into a tile raster.
#[derive(Clone, Debug, PartialEq)]
pub enum Drawable {
    Points(Vec<DVec2>),
    Lines(Vec<Vec<DVec2>>),
    /// Polygons as ring lists, outer ring first.
    Polygons(Vec<Vec<Vec<DVec2>>>),
}

fn positions(coords: &[Position]) -> Vec<DVec2> {
    coords
        .iter()
        .filter_map(|p| match p.as_slice() {
            [x, y, ..] => Some(DVec2::new(*x, *y)),
            _ => None,
        })
        .collect()
}

/// Project a GeoJSON geometry into the raster of `tile`.
///
/// Collections flatten into one drawable per member.
#[must_use]
pub fn project_geometry(strategy: &dyn ShapeStrategy, tile: &Tile, frame: &TileFrame, value: &Value) -> Vec<Drawable> {
    let run = |coords: &[Position]| strategy.transform(&positions(coords), tile, frame, TransformKind::Feature);
    match value {
        Value::Point(p) => vec![Drawable::Points(run(std::slice::from_ref(p)))],
        Value::MultiPoint(points) => vec![Drawable::Points(run(points))],
        Value::LineString(line) => vec![Drawable::Lines(vec![run(line)])],
        Value::MultiLineString(lines) => vec![Drawable::Lines(lines.iter().map(|l| run(l)).collect())],
        Value::Polygon(rings) => vec![Drawable::Polygons(vec![rings.iter().map(|r| run(r)).collect()])],
        Value::MultiPolygon(polygons) => vec![Drawable::Polygons(
            polygons
                .iter()
                .map(|rings| rings.iter().map(|r| run(r)).collect())
                .collect(),
        )],
        Value::GeometryCollection(geometries) => geometries
            .iter()
            .flat_map(|g| project_geometry(strategy, tile, frame, &g.value))
            .collect(),
    }
}

fn stroke(canvas: &mut Canvas, path: &Path, rule: &StyleRule, properties: &Properties) {
    canvas.stroke_path(path, &rule.stroke_style(properties), rule.stroke_color(properties));
}

fn fill(canvas: &mut Canvas, path: &Path, rule: &StyleRule, properties: &Properties) {
    canvas.fill_path(path, rule.fill_color(properties), FillRule::EvenOdd);
}

/// Paint one drawable; lines stroke before filling, polygons fill first.
pub fn draw(canvas: &mut Canvas, drawable: &Drawable, rule: &StyleRule, properties: &Properties) {
    match drawable {
        Drawable::Points(points) => {
            for point in points {
                draw_point(canvas, *point, rule, properties);
            }
        }
        Drawable::Lines(lines) => {
            for line in lines {
                let mut path = Path::new();
                path.add_ring(line, false);
                if rule.has_stroke() {
                    stroke(canvas, &path, rule, properties);
                }
                if rule.has_fill() {
                    fill(canvas, &path, rule, properties);
                }
            }
        }
        Drawable::Polygons(polygons) => {
            for rings in polygons {
                let mut path = Path::new();
                for ring in rings {
                    path.add_ring(ring, true);
                }
                if rule.has_fill() {
                    fill(canvas, &path, rule, properties);
                }
                if rule.has_stroke() {
                    stroke(canvas, &path, rule, properties);
                }
            }
        }
    }
}

/// A mark when the rule names one, otherwise a label.
fn draw_point(canvas: &mut Canvas, at: DVec2, rule: &StyleRule, properties: &Properties) {
    match rule.mark() {
        Some("square") => {
            let size = rule.mark_size(properties);
            let path = Path::rect(at.x - size / 2.0, at.y - size / 2.0, size, size);
            if rule.has_stroke() {
                stroke(canvas, &path, rule, properties);
            }
            if rule.has_fill() {
                fill(canvas, &path, rule, properties);
            }
        }
        Some(_) => {}
        None => {
            let Some(text) = rule.label_text(properties) else {
                return;
            };
            let size = rule.font_size(properties);
            if rule.has_stroke() {
                canvas.stroke_text(&text, at, size, &rule.stroke_style(properties), rule.stroke_color(properties));
            }
            if rule.has_fill() {
                canvas.fill_text(&text, at, size, rule.fill_color(properties));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use facet_raster::Color;
    use serde_json::json;

    use super::*;

    fn rule(value: serde_json::Value) -> StyleRule {
        serde_json::from_value(value).expect("rule")
    }

    #[test]
    fn test_square_mark() {
        let mut canvas = Canvas::new(20, 20).expect("canvas");
        let square = rule(json!({"source": "p", "mark": "square", "size": 6, "fill": "#000000"}));
        draw(&mut canvas, &Drawable::Points(vec![DVec2::new(10.0, 10.0)]), &square, &Properties::new());
        assert_eq!(canvas.pixel(10, 10), Color::BLACK);
        assert_eq!(canvas.pixel(2, 2), Color::TRANSPARENT);
    }

    #[test]
    fn test_unknown_mark_draws_nothing() {
        let mut canvas = Canvas::new(20, 20).expect("canvas");
        let star = rule(json!({"source": "p", "mark": "star", "fill": "#000000", "label": "x"}));
        draw(&mut canvas, &Drawable::Points(vec![DVec2::new(10.0, 10.0)]), &star, &Properties::new());
        assert!(canvas.image().pixels().all(|p| p.0[3] == 0));
    }

    #[test]
    fn test_polygon_hole_even_odd() {
        let mut canvas = Canvas::new(30, 30).expect("canvas");
        let outer = vec![DVec2::new(0.0, 0.0), DVec2::new(30.0, 0.0), DVec2::new(30.0, 30.0), DVec2::new(0.0, 30.0)];
        let hole = vec![DVec2::new(10.0, 10.0), DVec2::new(20.0, 10.0), DVec2::new(20.0, 20.0), DVec2::new(10.0, 20.0)];
        let land = rule(json!({"source": "land", "fill": "#00ff00"}));
        draw(&mut canvas, &Drawable::Polygons(vec![vec![outer, hole]]), &land, &Properties::new());
        assert_eq!(canvas.pixel(5, 5), Color::rgb(0, 255, 0));
        assert_eq!(canvas.pixel(15, 15), Color::TRANSPARENT, "the hole stays empty");
    }

    #[test]
    fn test_label_needs_a_template() {
        let mut canvas = Canvas::new(60, 20).expect("canvas");
        let unlabeled = rule(json!({"source": "p", "fill": "#000000"}));
        draw(&mut canvas, &Drawable::Points(vec![DVec2::new(2.0, 15.0)]), &unlabeled, &Properties::new());
        assert!(canvas.image().pixels().all(|p| p.0[3] == 0));

        let labeled = rule(json!({"source": "p", "fill": "#000000", "label": "${name}", "font": "10px mono"}));
        let props = json!({"name": "HI"}).as_object().cloned().unwrap_or_default();
        draw(&mut canvas, &Drawable::Points(vec![DVec2::new(2.0, 15.0)]), &labeled, &props);
        assert!(canvas.image().pixels().any(|p| p.0[3] > 0), "label drawn");
    }
}
