//! Stroke expansion: polylines become polygons filled with the non-zero rule.

use std::f64::consts::TAU;

use glam::DVec2;

use crate::path::SubPath;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LineCap {
    Butt,
    #[default]
    Round,
    Square,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LineJoin {
    Miter,
    #[default]
    Round,
    Bevel,
}

impl LineCap {
    /// Unknown names fall back to the default cap.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name.trim() {
            "butt" => Self::Butt,
            "square" => Self::Square,
            _ => Self::Round,
        }
    }
}

impl LineJoin {
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name.trim() {
            "miter" => Self::Miter,
            "bevel" => Self::Bevel,
            _ => Self::Round,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct StrokeStyle {
    pub width: f64,
    pub cap: LineCap,
    pub join: LineJoin,
    /// Alternating on/off lengths; empty for a solid line.
    pub dash: Vec<f64>,
    pub miter_limit: f64,
}

impl Default for StrokeStyle {
    fn default() -> Self {
        Self {
            width: 1.0,
            cap: LineCap::Round,
            join: LineJoin::Round,
            dash: Vec::new(),
            miter_limit: 10.0,
        }
    }
}

/// Split a polyline into its visible dashes.
///
/// Closed input is walked once around, including the closing edge.
#[must_use]
pub fn dash_polyline(points: &[DVec2], closed: bool, pattern: &[f64]) -> Vec<Vec<DVec2>> {
    let pattern: Vec<f64> = pattern.iter().copied().filter(|d| *d > 0.0 && d.is_finite()).collect();
    let mut vertices = points.to_vec();
    if closed && let Some(first) = points.first() {
        vertices.push(*first);
    }
    if pattern.is_empty() || vertices.len() < 2 {
        return vec![vertices];
    }
    // An odd pattern repeats to an even one, as on a 2D context.
    let pattern = if pattern.len() % 2 == 1 { pattern.repeat(2) } else { pattern };

    let mut dashes = Vec::new();
    let mut current: Vec<DVec2> = vec![vertices[0]];
    let mut index = 0;
    let mut left = pattern[0];
    let mut on = true;

    for segment in vertices.windows(2) {
        let (mut a, b) = (segment[0], segment[1]);
        let mut remaining = a.distance(b);
        while remaining > 0.0 {
            let step = remaining.min(left);
            let p = a + (b - a) * (step / remaining);
            if on {
                current.push(p);
            }
            remaining -= step;
            left -= step;
            a = p;
            if left <= 0.0 {
                if on && current.len() >= 2 {
                    dashes.push(std::mem::take(&mut current));
                }
                on = !on;
                index = (index + 1) % pattern.len();
                left = pattern[index];
                current = if on { vec![a] } else { Vec::new() };
            }
        }
    }
    if on && current.len() >= 2 {
        dashes.push(current);
    }
    dashes
}

/// Outline polygons covering the stroke of `sub`.
///
/// All polygons share one orientation so a non-zero fill yields their union.
#[must_use]
pub fn stroke_outline(sub: &SubPath, style: &StrokeStyle) -> Vec<Vec<DVec2>> {
    let half = style.width / 2.0;
    if half <= 0.0 || sub.points.is_empty() {
        return Vec::new();
    }

    let mut points: Vec<DVec2> = Vec::with_capacity(sub.points.len());
    for p in &sub.points {
        if points.last() != Some(p) {
            points.push(*p);
        }
    }
    let closed = sub.closed && points.len() > 2;
    if closed && points.first() == points.last() {
        points.pop();
    }

    let mut polys = Vec::new();
    if points.len() == 1 {
        match style.cap {
            LineCap::Round => polys.push(circle(points[0], half)),
            LineCap::Square => polys.push(square(points[0], half)),
            LineCap::Butt => {}
        }
        return polys;
    }

    let n = points.len();
    let segment_count = if closed { n } else { n - 1 };
    for i in 0..segment_count {
        let (a, b) = (points[i], points[(i + 1) % n]);
        let normal = (b - a).normalize().perp() * half;
        polys.push(vec![a + normal, b + normal, b - normal, a - normal]);
    }

    let joints: Vec<usize> = if closed { (0..n).collect() } else { (1..n - 1).collect() };
    for i in joints {
        let prev = points[(i + n - 1) % n];
        let here = points[i];
        let next = points[(i + 1) % n];
        polys.extend(join(prev, here, next, half, style));
    }

    if !closed {
        let start_dir = (points[1] - points[0]).normalize();
        let end_dir = (points[n - 1] - points[n - 2]).normalize();
        match style.cap {
            LineCap::Butt => {}
            LineCap::Round => {
                polys.push(circle(points[0], half));
                polys.push(circle(points[n - 1], half));
            }
            LineCap::Square => {
                polys.push(cap_box(points[0], -start_dir, half));
                polys.push(cap_box(points[n - 1], end_dir, half));
            }
        }
    }

    for poly in &mut polys {
        if signed_area(poly) < 0.0 {
            poly.reverse();
        }
    }
    polys
}

fn join(prev: DVec2, here: DVec2, next: DVec2, half: f64, style: &StrokeStyle) -> Vec<Vec<DVec2>> {
    let d1 = (here - prev).normalize();
    let d2 = (next - here).normalize();
    let turn = d1.perp_dot(d2);
    if turn.abs() < 1e-12 && d1.dot(d2) > 0.0 {
        return Vec::new();
    }
    // Left turns open the gap on the right-hand side.
    let side = if turn > 0.0 { -1.0 } else { 1.0 };
    let n1 = d1.perp() * half * side;
    let n2 = d2.perp() * half * side;

    match style.join {
        LineJoin::Round => vec![circle(here, half)],
        LineJoin::Bevel => vec![vec![here, here + n1, here + n2]],
        LineJoin::Miter => {
            let cos_half = ((1.0 + d1.dot(d2)) / 2.0).max(0.0).sqrt();
            let ratio = if cos_half > 0.0 { 1.0 / cos_half } else { f64::INFINITY };
            if ratio > style.miter_limit {
                return vec![vec![here, here + n1, here + n2]];
            }
            let bisector = (n1 + n2).normalize_or_zero();
            let tip = here + bisector * half * ratio;
            vec![vec![here, here + n1, tip, here + n2]]
        }
    }
}

fn circle(center: DVec2, radius: f64) -> Vec<DVec2> {
    let segments = ((radius * 4.0).ceil() as usize).clamp(8, 64);
    (0..segments)
        .map(|i| {
            let angle = TAU * i as f64 / segments as f64;
            center + DVec2::new(angle.cos(), angle.sin()) * radius
        })
        .collect()
}

fn square(center: DVec2, half: f64) -> Vec<DVec2> {
    vec![
        center + DVec2::new(-half, -half),
        center + DVec2::new(half, -half),
        center + DVec2::new(half, half),
        center + DVec2::new(-half, half),
    ]
}

fn cap_box(end: DVec2, outward: DVec2, half: f64) -> Vec<DVec2> {
    let normal = outward.perp() * half;
    let tip = end + outward * half;
    vec![end + normal, tip + normal, tip - normal, end - normal]
}

fn signed_area(poly: &[DVec2]) -> f64 {
    poly.iter()
        .zip(poly.iter().cycle().skip(1))
        .map(|(a, b)| a.perp_dot(*b))
        .sum::<f64>()
        / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rasterize::{FillRule, rasterize};

    fn line(points: &[(f64, f64)]) -> SubPath {
        SubPath {
            points: points.iter().map(|(x, y)| DVec2::new(*x, *y)).collect(),
            closed: false,
        }
    }

    #[test]
    fn test_dash_pattern_splits_line() {
        let dashes = dash_polyline(&[DVec2::ZERO, DVec2::new(30.0, 0.0)], false, &[10.0, 5.0]);
        assert_eq!(dashes.len(), 2, "30px line with a 15px period has two dashes");
        let near = |a: DVec2, x: f64| (a - DVec2::new(x, 0.0)).length() < 1e-9;
        assert!(near(dashes[0][0], 0.0) && near(dashes[0][1], 10.0));
        assert!(near(dashes[1][0], 15.0));
        assert!(near(*dashes[1].last().unwrap(), 25.0));
    }

    #[test]
    fn test_dash_crosses_vertices() {
        let pts = [DVec2::ZERO, DVec2::new(4.0, 0.0), DVec2::new(4.0, 4.0)];
        let dashes = dash_polyline(&pts, false, &[6.0, 1.0]);
        assert_eq!(dashes[0], vec![DVec2::ZERO, DVec2::new(4.0, 0.0), DVec2::new(4.0, 2.0)]);
    }

    #[test]
    fn test_no_pattern_returns_input() {
        let pts = [DVec2::ZERO, DVec2::X];
        assert_eq!(dash_polyline(&pts, true, &[]), vec![vec![DVec2::ZERO, DVec2::X, DVec2::ZERO]]);
    }

    #[test]
    fn test_stroke_covers_line_width() {
        let style = StrokeStyle {
            width: 4.0,
            cap: LineCap::Butt,
            ..StrokeStyle::default()
        };
        let polys = stroke_outline(&line(&[(2.0, 10.0), (18.0, 10.0)]), &style);
        let cov = rasterize(&polys, FillRule::NonZero, 20, 20);
        assert_eq!(cov.get(10, 8), 1.0);
        assert_eq!(cov.get(10, 11), 1.0);
        assert_eq!(cov.get(10, 12), 0.0, "outside half width");
        assert_eq!(cov.get(1, 10), 0.0, "butt cap does not extend");
    }

    #[test]
    fn test_round_cap_extends() {
        let style = StrokeStyle {
            width: 6.0,
            ..StrokeStyle::default()
        };
        let polys = stroke_outline(&line(&[(5.0, 10.0), (15.0, 10.0)]), &style);
        let cov = rasterize(&polys, FillRule::NonZero, 20, 20);
        assert!(cov.get(3, 10) > 0.9, "round cap covers beyond the endpoint");
    }

    #[test]
    fn test_overlapping_pieces_union() {
        let style = StrokeStyle {
            width: 4.0,
            join: LineJoin::Miter,
            ..StrokeStyle::default()
        };
        let polys = stroke_outline(&line(&[(2.0, 2.0), (16.0, 2.0), (16.0, 16.0)]), &style);
        let cov = rasterize(&polys, FillRule::NonZero, 20, 20);
        assert_eq!(cov.get(16, 2), 1.0, "corner stays solid where pieces overlap");
        assert_eq!(cov.get(17, 0), 1.0, "miter fills the outer corner");
    }

    #[test]
    fn test_single_point_round_dot() {
        let style = StrokeStyle {
            width: 4.0,
            ..StrokeStyle::default()
        };
        assert_eq!(stroke_outline(&line(&[(5.0, 5.0)]), &style).len(), 1);
    }
}
