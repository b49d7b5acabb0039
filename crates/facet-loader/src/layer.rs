//! Layers and their per-tile load state.

use std::sync::Arc;

use facet_shapes::TileId;
use geojson::FeatureCollection;
use rustc_hash::FxHashMap;

use crate::source::GeometryKind;

/// A data-source table shown as one styled layer.
#[derive(Clone, Debug, PartialEq)]
pub struct LayerSpec {
    /// Name style rules refer to as `source`.
    pub name: String,
    pub table: String,
    pub geometry: GeometryKind,
    pub property_keys: Vec<String>,
    /// Below this zoom the layer is not fetched and not waited for.
    pub min_zoom: Option<u32>,
}

impl LayerSpec {
    #[must_use]
    pub fn new(name: impl Into<String>, geometry: GeometryKind) -> Self {
        let name = name.into();
        Self {
            table: name.clone(),
            name,
            geometry,
            property_keys: Vec::new(),
            min_zoom: None,
        }
    }

    #[must_use]
    pub fn with_properties(mut self, keys: &[&str]) -> Self {
        self.property_keys = keys.iter().map(|k| (*k).to_string()).collect();
        self
    }

    #[must_use]
    pub fn with_min_zoom(mut self, zoom: u32) -> Self {
        self.min_zoom = Some(zoom);
        self
    }

    #[inline]
    #[must_use]
    pub fn active_at(&self, zoom: u32) -> bool {
        self.min_zoom.is_none_or(|min| zoom >= min)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TileStatus {
    #[default]
    Unrequested,
    Loading,
    Loaded,
}

#[derive(Debug)]
pub(crate) struct Layer {
    pub(crate) spec: LayerSpec,
    status: FxHashMap<TileId, TileStatus>,
    features: FxHashMap<TileId, Arc<FeatureCollection>>,
}

impl Layer {
    pub(crate) fn new(spec: LayerSpec) -> Self {
        Self {
            spec,
            status: FxHashMap::default(),
            features: FxHashMap::default(),
        }
    }

    pub(crate) fn status(&self, tile: &TileId) -> TileStatus {
        self.status.get(tile).copied().unwrap_or_default()
    }

    pub(crate) fn set_status(&mut self, tile: TileId, status: TileStatus) {
        self.status.insert(tile, status);
    }

    pub(crate) fn store(&mut self, tile: TileId, features: FeatureCollection) {
        self.status.insert(tile, TileStatus::Loaded);
        self.features.insert(tile, Arc::new(features));
    }

    pub(crate) fn features(&self, tile: &TileId) -> Option<Arc<FeatureCollection>> {
        self.features.get(tile).cloned()
    }

    pub(crate) fn clear(&mut self) {
        self.status.clear();
        self.features.clear();
    }
}
