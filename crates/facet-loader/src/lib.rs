//! Per-tile, per-layer feature loading.
//!
//! A [`FeatureSource`] answers feature requests for one tile of one table.
//! [`FeatureLoader`] fans requests for the current view out to a worker pool,
//! tracks each layer's tile status and keeps the loaded collections.

mod clip;
mod error;
mod folder;
mod layer;
mod loader;
mod memory;
mod source;

pub use clip::{BASE_TOLERANCE, clip_collection, tolerance};
pub use error::{LoaderError, SourceError};
pub use folder::GeoJsonFolderSource;
pub use layer::{LayerSpec, TileStatus};
pub use loader::{Dispatch, FeatureLoader, TileTarget, ViewUpdate};
pub use memory::MemorySource;
pub use source::{FeatureRequest, FeatureSource, GeometryKind, StoreDescriptor, TableInfo};

use geojson::FeatureCollection;

/// A collection with no features.
#[must_use]
pub fn empty_collection() -> FeatureCollection {
    FeatureCollection {
        bbox: None,
        features: Vec::new(),
        foreign_members: None,
    }
}
