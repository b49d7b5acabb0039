//! Headless export of a shape's printable net.
//!
//! Every zoom-0 tile is loaded at full resolution from view centre `[0, 0]`,
//! composited at the print scale and handed to the shape's page layout.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use facet_compositor::{LayerFeatures, StyleSheet, composite_tile};
use facet_config::Config;
use facet_loader::ViewUpdate;
use facet_shapes::{PrintSheet, ShapeKind, TileQuery, TilingEngine};
use glam::DVec2;
use image::RgbaImage;
use tracing::{debug, info};

use crate::data::{DataSet, tiling_params};
use crate::error::AppError;

/// Longest a print run waits for its features.
pub const LOAD_TIMEOUT: Duration = Duration::from_secs(120);

/// `{shape}_page_{n}.png`, pages counted from zero.
#[must_use]
pub fn page_file_name(kind: ShapeKind, index: usize) -> String {
    format!("{}_page_{index}.png", kind.name())
}

/// Render and write every page; returns the written paths in page order.
pub fn export_pages(config: &Config, kind: ShapeKind, data: &DataSet, sheet: &StyleSheet) -> Result<Vec<PathBuf>, AppError> {
    if data.layers.is_empty() {
        return Err(AppError::NoLayers);
    }
    let mut engine = TilingEngine::new(kind, None, tiling_params(config));
    engine.update(&TileQuery::new(0, DVec2::ZERO));
    info!(shape = kind.name(), tiles = engine.tiles().len(), scale = config.print.scale, "print started");

    let mut loader = data.loader(config)?;
    let print_zoom = (config.print.zoom > 0).then_some(config.print.zoom);
    loader.update(ViewUpdate::new(engine.tiles(), 0, engine.strategy()).full_resolution(print_zoom));
    if !loader.wait_idle(LOAD_TIMEOUT) {
        return Err(AppError::LoadTimeout(LOAD_TIMEOUT));
    }

    let sizes = engine.sizes(config.print.scale);
    let frames = engine.frames(&sizes);
    let strategy = engine.strategy();
    let mut textures: Vec<RgbaImage> = Vec::with_capacity(frames.len());
    for (tile, frame) in engine.tiles().iter().zip(&frames) {
        let loaded = loader.tile_features(&tile.id);
        let layers: Vec<LayerFeatures<'_>> = loaded
            .iter()
            .map(|(spec, features)| LayerFeatures {
                source: &spec.name,
                features: features.as_ref(),
            })
            .collect();
        textures.push(composite_tile(strategy, tile, frame, sheet, &layers)?.into_image());
        debug!(tile = %tile.id, "print tile composited");
    }

    let pages = strategy.pages(&PrintSheet::new(engine.tiles(), &sizes, &textures))?;
    let dir = &config.print.output_dir;
    fs::create_dir_all(dir).map_err(|source| AppError::Output {
        path: dir.clone(),
        source,
    })?;
    let mut written = Vec::with_capacity(pages.len());
    for (index, page) in pages.iter().enumerate() {
        let path = dir.join(page_file_name(kind, index));
        page.save_png(&path)?;
        info!(path = %path.display(), width = page.width(), height = page.height(), "page written");
        written.push(path);
    }
    Ok(written)
}
