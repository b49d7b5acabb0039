//! CPU 2D canvas for tile textures and print sheets.
//!
//! Paths are filled with an even-odd or non-zero scanline rasterizer with
//! four sub-scanlines per pixel; strokes are expanded to polygons first and
//! filled non-zero so overlapping segments never double-blend.

mod canvas;
mod color;
mod error;
mod font;
mod path;
mod rasterize;
mod stroke;

pub use canvas::Canvas;
pub use color::Color;
pub use error::RasterError;
pub use path::{Path, SubPath};
pub use rasterize::{Coverage, FillRule, rasterize};
pub use stroke::{LineCap, LineJoin, StrokeStyle, dash_polyline, stroke_outline};
