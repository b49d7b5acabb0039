//! Per-tile texture compositing.

use std::path::Path;
use std::sync::Arc;

use facet_raster::{Canvas, RasterError};
use facet_shapes::{ShapeStrategy, Tile, TileFrame, TileId, TransformKind};
use geojson::FeatureCollection;
use image::RgbaImage;
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::draw::{Drawable, draw, project_geometry};
use crate::error::StyleError;
use crate::style::{StyleRule, StyleSheet};
use crate::value::Properties;

/// Loaded features of one layer for the tile being composited.
#[derive(Clone, Copy, Debug)]
pub struct LayerFeatures<'a> {
    pub source: &'a str,
    pub features: &'a FeatureCollection,
}

/// Draw one tile: background rules first, then every data rule in sheet
/// order against the layer it names.
pub fn composite_tile(
    strategy: &dyn ShapeStrategy,
    tile: &Tile,
    frame: &TileFrame,
    sheet: &StyleSheet,
    layers: &[LayerFeatures<'_>],
) -> Result<Canvas, RasterError> {
    let (width, height) = frame.size.pixels();
    let mut canvas = Canvas::new(width, height)?;
    let none = Properties::new();

    let outline = strategy.transform(&frame.surface, tile, frame, TransformKind::Background);
    let background = Drawable::Polygons(vec![vec![outline]]);
    for rule in sheet.rules().iter().filter(|r| r.is_background()) {
        draw(&mut canvas, &background, rule, &none);
    }

    let data_rules = sheet
        .rules()
        .iter()
        .filter(|r| !r.is_background() && !r.is_overlay());
    for rule in data_rules {
        let Some(layer) = layers.iter().find(|l| l.source == rule.source) else {
            continue;
        };
        draw_layer(&mut canvas, strategy, tile, frame, rule, layer.features);
    }
    Ok(canvas)
}

fn draw_layer(
    canvas: &mut Canvas,
    strategy: &dyn ShapeStrategy,
    tile: &Tile,
    frame: &TileFrame,
    rule: &StyleRule,
    features: &FeatureCollection,
) {
    let none = Properties::new();
    let mut drawn = 0usize;
    for feature in &features.features {
        let properties = feature.properties.as_ref().unwrap_or(&none);
        if !rule.accepts(properties) {
            continue;
        }
        let Some(geometry) = feature.geometry.as_ref() else {
            continue;
        };
        for drawable in project_geometry(strategy, tile, frame, &geometry.value) {
            draw(canvas, &drawable, rule, properties);
        }
        drawn += 1;
    }
    debug!(tile = %tile.id, source = %rule.source, drawn, "layer composited");
}

/// Owns the style sheet and the latest texture of every composited tile.
#[derive(Debug, Default)]
pub struct Compositor {
    sheet: StyleSheet,
    textures: FxHashMap<TileId, Arc<RgbaImage>>,
}

impl Compositor {
    #[must_use]
    pub fn new(sheet: StyleSheet) -> Self {
        Self {
            sheet,
            textures: FxHashMap::default(),
        }
    }

    #[must_use]
    pub fn sheet(&self) -> &StyleSheet {
        &self.sheet
    }

    /// Apply edited style text; textures are dropped only when it parses.
    pub fn update_style(&mut self, code: &str) -> Result<(), StyleError> {
        self.sheet.update(code)?;
        self.textures.clear();
        Ok(())
    }

    pub fn load_style(&mut self, path: &Path) -> Result<(), StyleError> {
        self.sheet.load(path)?;
        self.textures.clear();
        Ok(())
    }

    /// Composite `tile` and keep the result as its current texture.
    pub fn render(
        &mut self,
        strategy: &dyn ShapeStrategy,
        tile: &Tile,
        frame: &TileFrame,
        layers: &[LayerFeatures<'_>],
    ) -> Result<Arc<RgbaImage>, RasterError> {
        let canvas = composite_tile(strategy, tile, frame, &self.sheet, layers)?;
        let texture = Arc::new(canvas.into_image());
        self.textures.insert(tile.id, Arc::clone(&texture));
        Ok(texture)
    }

    #[must_use]
    pub fn texture(&self, id: &TileId) -> Option<Arc<RgbaImage>> {
        self.textures.get(id).cloned()
    }

    #[must_use]
    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    /// Drop every texture, as a shape or zoom change requires.
    pub fn clear(&mut self) {
        self.textures.clear();
    }
}
