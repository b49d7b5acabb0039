//! A directory of `.geojson` files served as tables.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use facet_shapes::TileId;
use geojson::{FeatureCollection, GeoJson};
use tracing::{debug, info};

use crate::clip::{BASE_TOLERANCE, clip_collection, tolerance};
use crate::error::SourceError;
use crate::source::{
    FeatureRequest, FeatureSource, StoreDescriptor, TableInfo, first_geometry_kind, property_names,
    retain_properties,
};

/// Serves every `*.geojson` file of the registered folders as a table named
/// after the file stem.
///
/// Parsed files and clipped per-tile results are cached; removing a store
/// drops both.
#[derive(Debug)]
pub struct GeoJsonFolderSource {
    base_tolerance: f64,
    tables: DashMap<String, PathBuf>,
    files: DashMap<PathBuf, Arc<FeatureCollection>>,
    results: DashMap<(String, u32, TileId), FeatureCollection>,
}

impl Default for GeoJsonFolderSource {
    fn default() -> Self {
        Self::new(BASE_TOLERANCE)
    }
}

impl GeoJsonFolderSource {
    #[must_use]
    pub fn new(base_tolerance: f64) -> Self {
        Self {
            base_tolerance,
            tables: DashMap::new(),
            files: DashMap::new(),
            results: DashMap::new(),
        }
    }

    /// Register a folder and return the source, for one-line setup.
    pub fn open(dir: &Path, base_tolerance: f64) -> Result<(Self, Vec<TableInfo>), SourceError> {
        let source = Self::new(base_tolerance);
        let tables = source.add_store(&StoreDescriptor::Folder(dir.to_path_buf()))?;
        Ok((source, tables))
    }

    fn load(&self, path: &Path) -> Result<Arc<FeatureCollection>, SourceError> {
        if let Some(cached) = self.files.get(path) {
            return Ok(Arc::clone(&cached));
        }
        let text = fs::read_to_string(path).map_err(|source| SourceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let parsed = text.parse::<GeoJson>().map_err(|source| SourceError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        let collection = match parsed {
            GeoJson::FeatureCollection(collection) => collection,
            GeoJson::Feature(feature) => FeatureCollection {
                bbox: None,
                features: vec![feature],
                foreign_members: None,
            },
            GeoJson::Geometry(_) => {
                return Err(SourceError::NotFeatures {
                    path: path.to_path_buf(),
                });
            }
        };
        debug!(path = %path.display(), features = collection.features.len(), "geojson loaded");
        let collection = Arc::new(collection);
        self.files.insert(path.to_path_buf(), Arc::clone(&collection));
        Ok(collection)
    }

    fn list(dir: &Path) -> Result<Vec<PathBuf>, SourceError> {
        if !dir.is_dir() {
            return Err(SourceError::NotADirectory {
                path: dir.to_path_buf(),
            });
        }
        let entries = fs::read_dir(dir).map_err(|source| SourceError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let mut paths: Vec<PathBuf> = entries
            .filter_map(Result::ok)
            .map(|e| e.path())
            .filter(|p| p.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("geojson")))
            .collect();
        paths.sort();
        Ok(paths)
    }
}

fn table_name(path: &Path) -> Option<String> {
    path.file_stem().map(|s| s.to_string_lossy().into_owned())
}

impl FeatureSource for GeoJsonFolderSource {
    fn add_store(&self, store: &StoreDescriptor) -> Result<Vec<TableInfo>, SourceError> {
        let StoreDescriptor::Folder(dir) = store else {
            return Ok(Vec::new());
        };
        let mut tables = Vec::new();
        for path in Self::list(dir)? {
            let Some(name) = table_name(&path) else {
                continue;
            };
            let collection = self.load(&path)?;
            tables.push(TableInfo {
                name: name.clone(),
                geometry: first_geometry_kind(&collection),
                properties: property_names(&collection),
            });
            self.tables.insert(name, path);
        }
        info!(dir = %dir.display(), tables = tables.len(), "folder store added");
        Ok(tables)
    }

    fn remove_store(&self, store: &StoreDescriptor) {
        let StoreDescriptor::Folder(dir) = store else {
            return;
        };
        let removed: Vec<String> = self
            .tables
            .iter()
            .filter(|entry| entry.value().parent() == Some(dir.as_path()))
            .map(|entry| entry.key().clone())
            .collect();
        for name in &removed {
            if let Some((_, path)) = self.tables.remove(name) {
                self.files.remove(&path);
            }
        }
        self.results.retain(|(table, _, _), _| !removed.contains(table));
        info!(dir = %dir.display(), tables = removed.len(), "folder store removed");
    }

    fn get_features(&self, request: &FeatureRequest) -> Result<FeatureCollection, SourceError> {
        let key = (request.table.clone(), request.zoom, request.tile);
        if !request.full_res
            && let Some(cached) = self.results.get(&key)
        {
            return Ok(cached.clone());
        }
        let path = self
            .tables
            .get(&request.table)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| SourceError::UnknownTable(request.table.clone()))?;
        let collection = self.load(&path)?;
        let epsilon = (!request.full_res).then(|| tolerance(self.base_tolerance, request.detail_zoom()));
        let mut clipped = clip_collection(&collection, &request.bbox, epsilon);
        retain_properties(&mut clipped, &request.property_keys);
        debug!(
            table = %request.table,
            tile = %request.tile,
            features = clipped.features.len(),
            "features clipped"
        );
        if !request.full_res {
            self.results.insert(key, clipped.clone());
        }
        Ok(clipped)
    }
}

#[cfg(test)]
mod tests {
    use facet_geometry::GeoBBox;
    use facet_shapes::ShapeKind;

    use super::*;
    use crate::source::GeometryKind;

    const ROADS: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {"type": "Feature", "properties": {"kind": "highway", "name": "A1"},
             "geometry": {"type": "LineString", "coordinates": [[-10, 0], [10, 0]]}},
            {"type": "Feature", "properties": {"kind": "local", "name": "B2"},
             "geometry": {"type": "LineString", "coordinates": [[100, 40], [110, 40]]}}
        ]
    }"#;

    fn request(table: &str, bbox: GeoBBox) -> FeatureRequest {
        FeatureRequest {
            table: table.into(),
            geometry: GeometryKind::Line,
            property_keys: vec!["kind".into()],
            wkt: Vec::new(),
            bbox: vec![bbox],
            zoom: 0,
            shape: ShapeKind::Cube,
            tile: TileId::face(ShapeKind::Cube, 0, 0),
            full_res: false,
            print_zoom: None,
        }
    }

    #[test]
    fn test_add_store_lists_tables() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("roads.geojson"), ROADS).expect("write");
        fs::write(dir.path().join("notes.txt"), "skip me").expect("write");

        let (_, tables) = GeoJsonFolderSource::open(dir.path(), BASE_TOLERANCE).expect("open");
        assert_eq!(tables.len(), 1, "only geojson files become tables");
        assert_eq!(tables[0].name, "roads");
        assert_eq!(tables[0].geometry, GeometryKind::Line);
        assert_eq!(tables[0].properties, vec!["kind".to_string(), "name".to_string()]);
    }

    #[test]
    fn test_get_features_clips_and_filters_properties() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("roads.geojson"), ROADS).expect("write");
        let (source, _) = GeoJsonFolderSource::open(dir.path(), BASE_TOLERANCE).expect("open");

        let features = source
            .get_features(&request("roads", GeoBBox::new(-45.0, -45.0, 45.0, 45.0)))
            .expect("features");
        assert_eq!(features.features.len(), 1, "the far road is outside the tile");
        let properties = features.features[0].properties.as_ref().expect("properties");
        assert_eq!(properties.len(), 1);
        assert_eq!(properties["kind"], "highway");
    }

    #[test]
    fn test_unknown_table_and_missing_dir() {
        let source = GeoJsonFolderSource::default();
        assert!(matches!(
            source.get_features(&request("nope", GeoBBox::WORLD)),
            Err(SourceError::UnknownTable(_))
        ));
        let missing = StoreDescriptor::Folder(PathBuf::from("/definitely/not/here"));
        assert!(matches!(source.add_store(&missing), Err(SourceError::NotADirectory { .. })));
    }

    #[test]
    fn test_remove_store_forgets_tables() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("roads.geojson"), ROADS).expect("write");
        let (source, _) = GeoJsonFolderSource::open(dir.path(), BASE_TOLERANCE).expect("open");
        source.get_features(&request("roads", GeoBBox::WORLD)).expect("features");

        source.remove_store(&StoreDescriptor::Folder(dir.path().to_path_buf()));
        assert!(source.get_features(&request("roads", GeoBBox::WORLD)).is_err());
        assert!(source.results.is_empty(), "cached tiles dropped with the store");
    }

    #[test]
    fn test_bad_json_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("broken.geojson"), "{ not json").expect("write");
        let result = GeoJsonFolderSource::open(dir.path(), BASE_TOLERANCE);
        assert!(matches!(result, Err(SourceError::Parse { .. })));
    }
}
