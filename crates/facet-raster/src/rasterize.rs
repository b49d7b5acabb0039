//! Scanline polygon rasterizer producing anti-aliased coverage.

use glam::DVec2;

const SUBSAMPLES: usize = 4;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FillRule {
    #[default]
    EvenOdd,
    NonZero,
}

/// Per-pixel coverage in `[0, 1]`, row-major.
#[derive(Clone, Debug)]
pub struct Coverage {
    pub width: u32,
    pub height: u32,
    pub data: Vec<f32>,
}

impl Coverage {
    #[must_use]
    pub fn get(&self, x: u32, y: u32) -> f32 {
        if x >= self.width || y >= self.height {
            return 0.0;
        }
        self.data[(y * self.width + x) as usize]
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.iter().all(|c| *c <= 0.0)
    }
}

struct Edge {
    top: DVec2,
    bottom: DVec2,
    winding: i32,
}

/// Rasterize closed rings into a `width x height` coverage mask.
#[must_use]
pub fn rasterize(rings: &[Vec<DVec2>], rule: FillRule, width: u32, height: u32) -> Coverage {
    let mut coverage = Coverage {
        width,
        height,
        data: vec![0.0; (width as usize) * (height as usize)],
    };

    let mut edges = Vec::new();
    for ring in rings.iter().filter(|r| r.len() >= 3) {
        for (i, a) in ring.iter().enumerate() {
            let b = ring[(i + 1) % ring.len()];
            if !a.is_finite() || !b.is_finite() || a.y == b.y {
                continue;
            }
            let (top, bottom, winding) = if a.y < b.y { (*a, b, 1) } else { (b, *a, -1) };
            edges.push(Edge { top, bottom, winding });
        }
    }
    if edges.is_empty() || width == 0 || height == 0 {
        return coverage;
    }

    let min_y = edges.iter().map(|e| e.top.y).fold(f64::INFINITY, f64::min).floor().max(0.0) as u32;
    let max_y = edges
        .iter()
        .map(|e| e.bottom.y)
        .fold(f64::NEG_INFINITY, f64::max)
        .ceil()
        .min(f64::from(height)) as u32;

    let weight = 1.0 / SUBSAMPLES as f32;
    let mut crossings: Vec<(f64, i32)> = Vec::new();
    for y in min_y..max_y {
        let row = &mut coverage.data[(y * width) as usize..((y + 1) * width) as usize];
        for s in 0..SUBSAMPLES {
            let sy = f64::from(y) + (s as f64 + 0.5) / SUBSAMPLES as f64;
            crossings.clear();
            for edge in &edges {
                if edge.top.y <= sy && sy < edge.bottom.y {
                    let t = (sy - edge.top.y) / (edge.bottom.y - edge.top.y);
                    crossings.push((edge.top.x + (edge.bottom.x - edge.top.x) * t, edge.winding));
                }
            }
            crossings.sort_by(|a, b| a.0.total_cmp(&b.0));

            let mut winding = 0;
            for pair in crossings.windows(2) {
                winding += pair[0].1;
                let inside = match rule {
                    FillRule::EvenOdd => winding % 2 != 0,
                    FillRule::NonZero => winding != 0,
                };
                if inside {
                    add_span(row, pair[0].0, pair[1].0, weight);
                }
            }
        }
    }

    for c in &mut coverage.data {
        *c = c.min(1.0);
    }
    coverage
}

fn add_span(row: &mut [f32], from: f64, to: f64, weight: f32) {
    let width = row.len() as f64;
    let (from, to) = (from.clamp(0.0, width), to.clamp(0.0, width));
    if to <= from {
        return;
    }
    let (first, last) = (from.floor() as usize, to.floor() as usize);
    if first == last {
        row[first] += (to - from) as f32 * weight;
        return;
    }
    row[first] += (first as f64 + 1.0 - from) as f32 * weight;
    for cell in &mut row[first + 1..last] {
        *cell += weight;
    }
    if last < row.len() {
        row[last] += (to - last as f64) as f32 * weight;
    }
}
