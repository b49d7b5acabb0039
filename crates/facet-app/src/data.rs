//! Data source, layers and style as the configuration names them.

use std::sync::Arc;

use facet_compositor::{Compositor, StyleSheet};
use facet_config::Config;
use facet_loader::{FeatureLoader, FeatureSource, GeoJsonFolderSource, LayerSpec, MemorySource, TableInfo};
use facet_shapes::TilingParams;
use tracing::{info, warn};

use crate::error::AppError;

/// A feature source and the layers drawn from it.
pub struct DataSet {
    pub source: Arc<dyn FeatureSource>,
    pub layers: Vec<LayerSpec>,
}

impl DataSet {
    /// Open `data.directory`, one layer per `.geojson` file.
    ///
    /// Without a directory the set is empty and tiles show only the
    /// background rules.
    pub fn open(config: &Config) -> Result<Self, AppError> {
        let Some(dir) = &config.data.directory else {
            info!("no data directory configured");
            return Ok(Self::empty());
        };
        let (source, tables) = GeoJsonFolderSource::open(dir, config.tiling.simplify_tolerance)?;
        let layers: Vec<LayerSpec> = tables.iter().map(layer_for).collect();
        info!(dir = %dir.display(), layers = layers.len(), "data folder opened");
        Ok(Self {
            source: Arc::new(source),
            layers,
        })
    }

    #[must_use]
    pub fn empty() -> Self {
        Self {
            source: Arc::new(MemorySource::new()),
            layers: Vec::new(),
        }
    }

    /// Every table of an in-memory source becomes a layer.
    #[cfg(test)]
    pub fn from_memory(source: MemorySource) -> Result<Self, AppError> {
        let tables = source.add_store(&facet_loader::StoreDescriptor::Memory("memory".to_string()))?;
        Ok(Self {
            source: Arc::new(source),
            layers: tables.iter().map(layer_for).collect(),
        })
    }

    /// A loader with the configured pool, carrying every layer.
    pub fn loader(&self, config: &Config) -> Result<FeatureLoader, AppError> {
        let mut loader = FeatureLoader::new(
            Arc::clone(&self.source),
            config.loader.worker_threads,
            config.loader.max_in_flight,
            config.loader.result_capacity,
        )?;
        for layer in &self.layers {
            loader.add_layer(layer.clone());
        }
        Ok(loader)
    }
}

fn layer_for(table: &TableInfo) -> LayerSpec {
    LayerSpec::new(table.name.clone(), table.geometry)
}

#[must_use]
pub fn tiling_params(config: &Config) -> TilingParams {
    TilingParams {
        neighbor_cap: config.tiling.neighbor_cap,
        neighbor_distance_factor: config.tiling.neighbor_distance_factor,
    }
}

/// The compositor with `style.path` applied when it loads.
///
/// A style that fails to load leaves the default sheet in place.
#[must_use]
pub fn compositor(config: &Config) -> Compositor {
    let mut compositor = Compositor::new(StyleSheet::default());
    if let Some(path) = &config.style.path {
        match compositor.load_style(path) {
            Ok(()) => info!(path = %path.display(), rules = compositor.sheet().rules().len(), "style loaded"),
            Err(err) => warn!(path = %path.display(), "style not loaded: {err}"),
        }
    }
    compositor
}

#[cfg(test)]
mod tests {
    use std::fs;

    use facet_compositor::BACKGROUND_SOURCE;
    use facet_loader::GeometryKind;

    use super::*;

    const RIVERS: &str = r#"{"type":"FeatureCollection","features":[
        {"type":"Feature","properties":{"name":"a"},
         "geometry":{"type":"LineString","coordinates":[[0,0],[10,10]]}}]}"#;

    #[test]
    fn test_folder_tables_become_layers() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("rivers.geojson"), RIVERS).expect("write");
        let mut config = Config::default();
        config.data.directory = Some(dir.path().to_path_buf());

        let data = DataSet::open(&config).expect("open");
        assert_eq!(data.layers.len(), 1);
        assert_eq!(data.layers[0].name, "rivers");
        assert_eq!(data.layers[0].geometry, GeometryKind::Line);
    }

    #[test]
    fn test_no_directory_is_empty() {
        let data = DataSet::open(&Config::default()).expect("open");
        assert!(data.layers.is_empty());
    }

    #[test]
    fn test_missing_directory_is_an_error() {
        let mut config = Config::default();
        config.data.directory = Some("/definitely/not/here".into());
        assert!(DataSet::open(&config).is_err(), "unreadable folder must surface");
    }

    #[test]
    fn test_bad_style_keeps_default_sheet() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("style.json");
        fs::write(&path, "[{ not json").expect("write");
        let mut config = Config::default();
        config.style.path = Some(path);

        let compositor = compositor(&config);
        let rules = compositor.sheet().rules();
        assert_eq!(rules.len(), 1, "default sheet kept");
        assert_eq!(rules[0].source, BACKGROUND_SOURCE);
    }

    #[test]
    fn test_style_file_applied() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("style.json");
        fs::write(&path, r##"[{"source":"bg","fill":"#000"},{"source":"rivers","stroke":"#00f"}]"##).expect("write");
        let mut config = Config::default();
        config.style.path = Some(path);
        assert_eq!(compositor(&config).sheet().rules().len(), 2);
    }
}
