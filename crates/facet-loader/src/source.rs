//! The feature-fetch capability the loader talks to.

use std::fmt;
use std::path::PathBuf;

use facet_geometry::GeoBBox;
use facet_shapes::{ShapeKind, TileId};
use geojson::{FeatureCollection, Value};

use crate::error::SourceError;

/// Geometry family of a table, as far as styling cares.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GeometryKind {
    Point,
    Line,
    Polygon,
    Unknown,
}

impl GeometryKind {
    #[must_use]
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Point(_) | Value::MultiPoint(_) => Self::Point,
            Value::LineString(_) | Value::MultiLineString(_) => Self::Line,
            Value::Polygon(_) | Value::MultiPolygon(_) => Self::Polygon,
            Value::GeometryCollection(_) => Self::Unknown,
        }
    }
}

impl fmt::Display for GeometryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Point => "point",
            Self::Line => "line",
            Self::Polygon => "polygon",
            Self::Unknown => "unknown",
        })
    }
}

/// Where a store lives.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum StoreDescriptor {
    /// A directory of `.geojson` files, one table per file.
    Folder(PathBuf),
    /// A named in-process store.
    Memory(String),
}

/// One table exposed by a store.
#[derive(Clone, Debug, PartialEq)]
pub struct TableInfo {
    pub name: String,
    pub geometry: GeometryKind,
    pub properties: Vec<String>,
}

/// A request for one layer's features inside one tile.
#[derive(Clone, Debug, PartialEq)]
pub struct FeatureRequest {
    pub table: String,
    pub geometry: GeometryKind,
    /// Properties to keep; empty keeps all.
    pub property_keys: Vec<String>,
    /// Tile bounds as WKT polygons, one per ring.
    pub wkt: Vec<String>,
    pub bbox: Vec<GeoBBox>,
    pub zoom: u32,
    pub shape: ShapeKind,
    pub tile: TileId,
    /// Skip simplification.
    pub full_res: bool,
    /// Simplify as if viewed at this zoom instead of `zoom`.
    pub print_zoom: Option<u32>,
}

impl FeatureRequest {
    /// Zoom that drives the simplification tolerance.
    #[must_use]
    pub fn detail_zoom(&self) -> u32 {
        self.print_zoom.unwrap_or(self.zoom)
    }
}

/// Anything that can answer feature requests.
///
/// Implementations are shared with the loader's worker threads.
pub trait FeatureSource: Send + Sync {
    /// Register a store and list its tables.
    fn add_store(&self, store: &StoreDescriptor) -> Result<Vec<TableInfo>, SourceError>;

    fn remove_store(&self, store: &StoreDescriptor);

    fn get_features(&self, request: &FeatureRequest) -> Result<FeatureCollection, SourceError>;
}

/// Keep only the requested properties of every feature.
pub(crate) fn retain_properties(collection: &mut FeatureCollection, keys: &[String]) {
    if keys.is_empty() {
        return;
    }
    for feature in &mut collection.features {
        if let Some(properties) = feature.properties.as_mut() {
            properties.retain(|key, _| keys.iter().any(|k| k == key));
        }
    }
}

/// Property names of the first feature, sorted.
pub(crate) fn property_names(collection: &FeatureCollection) -> Vec<String> {
    let mut names: Vec<String> = collection
        .features
        .first()
        .and_then(|f| f.properties.as_ref())
        .map(|p| p.keys().cloned().collect())
        .unwrap_or_default();
    names.sort();
    names
}

pub(crate) fn first_geometry_kind(collection: &FeatureCollection) -> GeometryKind {
    collection
        .features
        .iter()
        .find_map(|f| f.geometry.as_ref())
        .map_or(GeometryKind::Unknown, |g| GeometryKind::of(&g.value))
}
