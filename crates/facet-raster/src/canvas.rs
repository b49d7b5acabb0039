use std::path::Path as FsPath;

use glam::{DAffine2, DVec2};
use image::{ImageFormat, Rgba, RgbaImage};

use crate::color::Color;
use crate::error::RasterError;
use crate::font;
use crate::path::{Path, SubPath};
use crate::rasterize::{Coverage, FillRule, rasterize};
use crate::stroke::{StrokeStyle, dash_polyline, stroke_outline};

/// An RGBA raster with a 2D-context style transform stack.
///
/// Coordinates passed to drawing calls are in user space and go through the
/// current transform; the pixel grid is device space with `+Y` down.
pub struct Canvas {
    image: RgbaImage,
    transform: DAffine2,
    stack: Vec<DAffine2>,
}

impl Canvas {
    /// Transparent canvas.
    pub fn new(width: u32, height: u32) -> Result<Self, RasterError> {
        if width == 0 || height == 0 {
            return Err(RasterError::ZeroSize { width, height });
        }
        Ok(Self::from_image(RgbaImage::new(width, height)))
    }

    #[must_use]
    pub fn from_image(image: RgbaImage) -> Self {
        Self {
            image,
            transform: DAffine2::IDENTITY,
            stack: Vec::new(),
        }
    }

    #[inline]
    #[must_use]
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    #[inline]
    #[must_use]
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    #[must_use]
    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    #[must_use]
    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Color {
        let Rgba([r, g, b, a]) = *self.image.get_pixel(x, y);
        Color::rgba(r, g, b, a)
    }

    /// Replace every pixel, ignoring the transform.
    pub fn clear(&mut self, color: Color) {
        for p in self.image.pixels_mut() {
            *p = Rgba(color.to_array());
        }
    }

    pub fn save(&mut self) {
        self.stack.push(self.transform);
    }

    pub fn restore(&mut self) {
        if let Some(t) = self.stack.pop() {
            self.transform = t;
        }
    }

    pub fn translate(&mut self, x: f64, y: f64) {
        self.transform = self.transform * DAffine2::from_translation(DVec2::new(x, y));
    }

    /// Clockwise on screen for positive degrees.
    pub fn rotate(&mut self, degrees: f64) {
        self.transform = self.transform * DAffine2::from_angle(degrees.to_radians());
    }

    pub fn scale(&mut self, x: f64, y: f64) {
        self.transform = self.transform * DAffine2::from_scale(DVec2::new(x, y));
    }

    pub fn set_transform(&mut self, transform: DAffine2) {
        self.transform = transform;
    }

    #[must_use]
    pub fn transform(&self) -> DAffine2 {
        self.transform
    }

    pub fn fill_path(&mut self, path: &Path, color: Color, rule: FillRule) {
        let device = path.transformed(&self.transform);
        let coverage = rasterize(&device.rings(), rule, self.width(), self.height());
        self.composite(&coverage, color);
    }

    pub fn stroke_path(&mut self, path: &Path, style: &StrokeStyle, color: Color) {
        let mut outline: Vec<Vec<DVec2>> = Vec::new();
        for sub in path.subpaths() {
            for dash in dash_polyline(&sub.points, sub.closed, &style.dash) {
                let closed = sub.closed && style.dash.is_empty();
                let piece = SubPath {
                    points: dash,
                    closed,
                };
                outline.extend(stroke_outline(&piece, style));
            }
        }
        for poly in &mut outline {
            for p in poly.iter_mut() {
                *p = self.transform.transform_point2(*p);
            }
        }
        let coverage = rasterize(&outline, FillRule::NonZero, self.width(), self.height());
        self.composite(&coverage, color);
    }

    pub fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64, color: Color) {
        self.fill_path(&Path::rect(x, y, width, height), color, FillRule::NonZero);
    }

    pub fn stroke_rect(&mut self, x: f64, y: f64, width: f64, height: f64, style: &StrokeStyle, color: Color) {
        self.stroke_path(&Path::rect(x, y, width, height), style, color);
    }

    /// Draw `source` stretched over the user-space rectangle `(x, y, width, height)`.
    pub fn draw_image(&mut self, source: &RgbaImage, x: f64, y: f64, width: f64, height: f64) {
        let (sw, sh) = source.dimensions();
        if sw == 0 || sh == 0 || width == 0.0 || height == 0.0 {
            return;
        }
        let to_device = self.transform
            * DAffine2::from_translation(DVec2::new(x, y))
            * DAffine2::from_scale(DVec2::new(width / f64::from(sw), height / f64::from(sh)));
        let to_source = to_device.inverse();
        if !to_source.is_finite() {
            return;
        }

        let corners = [
            DVec2::ZERO,
            DVec2::new(f64::from(sw), 0.0),
            DVec2::new(f64::from(sw), f64::from(sh)),
            DVec2::new(0.0, f64::from(sh)),
        ]
        .map(|c| to_device.transform_point2(c));
        let min = corners.iter().fold(DVec2::INFINITY, |m, c| m.min(*c)).floor().max(DVec2::ZERO);
        let max = corners
            .iter()
            .fold(DVec2::NEG_INFINITY, |m, c| m.max(*c))
            .ceil()
            .min(DVec2::new(f64::from(self.width()), f64::from(self.height())));
        if min.x >= max.x || min.y >= max.y {
            return;
        }

        for py in min.y as u32..max.y as u32 {
            for px in min.x as u32..max.x as u32 {
                let s = to_source.transform_point2(DVec2::new(f64::from(px) + 0.5, f64::from(py) + 0.5));
                if s.x < 0.0 || s.y < 0.0 || s.x >= f64::from(sw) || s.y >= f64::from(sh) {
                    continue;
                }
                let sample = bilinear(source, s - DVec2::splat(0.5));
                self.blend(px, py, sample, 1.0);
            }
        }
    }

    /// Width of `text` at `size` pixels.
    #[must_use]
    pub fn measure_text(text: &str, size: f64) -> f64 {
        text.chars().count() as f64 * font::ADVANCE * size / 10.0
    }

    /// Draw `text` with its left baseline at `origin`.
    pub fn fill_text(&mut self, text: &str, origin: DVec2, size: f64, color: Color) {
        let path = text_path(text, origin, size);
        self.fill_path(&path, color, FillRule::NonZero);
    }

    /// Outline each glyph cell; drawn under [`Canvas::fill_text`] it gives a halo.
    pub fn stroke_text(&mut self, text: &str, origin: DVec2, size: f64, style: &StrokeStyle, color: Color) {
        let path = text_path(text, origin, size);
        self.stroke_path(&path, style, color);
    }

    pub fn save_png(&self, path: &FsPath) -> Result<(), RasterError> {
        self.image
            .save_with_format(path, ImageFormat::Png)
            .map_err(|source| RasterError::Save {
                path: path.to_path_buf(),
                source,
            })?;
        tracing::debug!(path = %path.display(), width = self.width(), height = self.height(), "saved canvas");
        Ok(())
    }

    fn composite(&mut self, coverage: &Coverage, color: Color) {
        if color.a == 0 {
            return;
        }
        let src = color.to_array();
        for y in 0..coverage.height {
            for x in 0..coverage.width {
                let c = coverage.get(x, y);
                if c > 0.0 {
                    self.blend(x, y, src, c);
                }
            }
        }
    }

    fn blend(&mut self, x: u32, y: u32, src: [u8; 4], coverage: f32) {
        let sa = f32::from(src[3]) / 255.0 * coverage;
        if sa <= 0.0 {
            return;
        }
        let dst = self.image.get_pixel_mut(x, y);
        let da = f32::from(dst.0[3]) / 255.0;
        let out_a = sa + da * (1.0 - sa);
        for i in 0..3 {
            let v = (f32::from(src[i]) * sa + f32::from(dst.0[i]) * da * (1.0 - sa)) / out_a;
            dst.0[i] = v.round().clamp(0.0, 255.0) as u8;
        }
        dst.0[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
    }
}

fn text_path(text: &str, origin: DVec2, size: f64) -> Path {
    let unit = size / 10.0;
    let top = origin.y - font::ROWS as f64 * unit;
    let mut path = Path::new();
    for (cx, cy) in font::cells(text) {
        let corner = DVec2::new(origin.x + cx * unit, top + cy * unit);
        path.add_ring(
            &[
                corner,
                corner + DVec2::new(unit, 0.0),
                corner + DVec2::new(unit, unit),
                corner + DVec2::new(0.0, unit),
            ],
            true,
        );
    }
    path
}

fn bilinear(image: &RgbaImage, p: DVec2) -> [u8; 4] {
    let (w, h) = image.dimensions();
    let x0 = p.x.floor().clamp(0.0, f64::from(w - 1));
    let y0 = p.y.floor().clamp(0.0, f64::from(h - 1));
    let (fx, fy) = ((p.x - x0).clamp(0.0, 1.0), (p.y - y0).clamp(0.0, 1.0));
    let (x0, y0) = (x0 as u32, y0 as u32);
    let (x1, y1) = ((x0 + 1).min(w - 1), (y0 + 1).min(h - 1));
    let px = |x, y| image.get_pixel(x, y).0.map(f64::from);
    let (a, b, c, d) = (px(x0, y0), px(x1, y0), px(x0, y1), px(x1, y1));
    let mut out = [0u8; 4];
    for i in 0..4 {
        let top = a[i] + (b[i] - a[i]) * fx;
        let bottom = c[i] + (d[i] - c[i]) * fx;
        out[i] = (top + (bottom - top) * fy).round().clamp(0.0, 255.0) as u8;
    }
    out
}
