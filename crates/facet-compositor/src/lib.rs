//! Styled rasterisation of loaded features into tile textures.
//!
//! Style rules are a JSON array; each rule names a `source` layer and how
//! to stroke, fill, mark or label its features, with optional filters and
//! property-dependent values. The `bg` source paints the tile outline.

mod compositor;
mod draw;
mod error;
mod style;
mod value;

pub use compositor::{Compositor, LayerFeatures, composite_tile};
pub use draw::{Drawable, draw, project_geometry};
pub use error::StyleError;
pub use style::{BACKGROUND_SOURCE, DEFAULT_STYLE, StyleRule, StyleSheet};
pub use value::{Comparison, Filter, Op, Properties, StyleValue};
