//! In-process feature tables.

use std::sync::atomic::{AtomicUsize, Ordering};

use dashmap::DashMap;
use facet_geometry::GeoBBox;
use geojson::FeatureCollection;

use crate::clip::clip_collection;
use crate::error::SourceError;
use crate::source::{
    FeatureRequest, FeatureSource, StoreDescriptor, TableInfo, first_geometry_kind, property_names,
    retain_properties,
};

/// Tables held in memory, clipped per request but never simplified.
#[derive(Debug, Default)]
pub struct MemorySource {
    tables: DashMap<String, FeatureCollection>,
    fetches: AtomicUsize,
}

impl MemorySource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, table: impl Into<String>, collection: FeatureCollection) {
        self.tables.insert(table.into(), collection);
    }

    /// Number of `get_features` calls answered so far.
    #[must_use]
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::Relaxed)
    }
}

impl FeatureSource for MemorySource {
    fn add_store(&self, store: &StoreDescriptor) -> Result<Vec<TableInfo>, SourceError> {
        if !matches!(store, StoreDescriptor::Memory(_)) {
            return Ok(Vec::new());
        }
        let mut tables: Vec<TableInfo> = self
            .tables
            .iter()
            .map(|entry| TableInfo {
                name: entry.key().clone(),
                geometry: first_geometry_kind(entry.value()),
                properties: property_names(entry.value()),
            })
            .collect();
        tables.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(tables)
    }

    fn remove_store(&self, store: &StoreDescriptor) {
        if matches!(store, StoreDescriptor::Memory(_)) {
            self.tables.clear();
        }
    }

    fn get_features(&self, request: &FeatureRequest) -> Result<FeatureCollection, SourceError> {
        self.fetches.fetch_add(1, Ordering::Relaxed);
        let table = self
            .tables
            .get(&request.table)
            .ok_or_else(|| SourceError::UnknownTable(request.table.clone()))?;
        let boxes = if request.bbox.is_empty() {
            &[GeoBBox::WORLD][..]
        } else {
            &request.bbox[..]
        };
        let mut clipped = clip_collection(&table, boxes, None);
        retain_properties(&mut clipped, &request.property_keys);
        Ok(clipped)
    }
}

#[cfg(test)]
mod tests {
    use facet_shapes::{ShapeKind, TileId};
    use geojson::{Feature, Geometry, Value};

    use super::*;
    use crate::source::GeometryKind;

    fn points() -> FeatureCollection {
        let feature = |lon: f64| Feature {
            bbox: None,
            geometry: Some(Geometry::new(Value::Point(vec![lon, 0.0]))),
            id: None,
            properties: None,
            foreign_members: None,
        };
        FeatureCollection {
            bbox: None,
            features: vec![feature(-100.0), feature(10.0)],
            foreign_members: None,
        }
    }

    #[test]
    fn test_tables_and_fetch() {
        let source = MemorySource::new();
        source.insert("cities", points());
        let tables = source.add_store(&StoreDescriptor::Memory("mem".into())).expect("tables");
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].geometry, GeometryKind::Point);

        let request = FeatureRequest {
            table: "cities".into(),
            geometry: GeometryKind::Point,
            property_keys: Vec::new(),
            wkt: Vec::new(),
            bbox: vec![GeoBBox::new(0.0, -45.0, 90.0, 45.0)],
            zoom: 0,
            shape: ShapeKind::Cube,
            tile: TileId::face(ShapeKind::Cube, 0, 1),
            full_res: false,
            print_zoom: None,
        };
        let features = source.get_features(&request).expect("features");
        assert_eq!(features.features.len(), 1);
        assert_eq!(source.fetch_count(), 1);

        source.remove_store(&StoreDescriptor::Memory("mem".into()));
        assert!(source.get_features(&request).is_err());
        assert_eq!(source.fetch_count(), 2, "failed fetches still count");
    }
}
