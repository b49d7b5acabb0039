//! Background feature fetching with single-slot update coalescing.
//!
//! Fetches run on a small worker pool and come back through a bounded
//! channel drained on the caller's thread. While a batch is in flight, new
//! view updates replace one pending "tail" update instead of queueing, so a
//! burst of pans costs at most one extra batch.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, bounded};
use dashmap::DashMap;
use facet_geometry::GeoBBox;
use facet_shapes::{Densify, ShapeKind, ShapeStrategy, Tile, TileId};
use geojson::FeatureCollection;
use tracing::{debug, info, warn};

use crate::error::LoaderError;
use crate::layer::{Layer, LayerSpec, TileStatus};
use crate::source::{FeatureRequest, FeatureSource};

/// The part of a tile a fetch needs.
#[derive(Clone, Debug, PartialEq)]
pub struct TileTarget {
    pub id: TileId,
    pub wkt: Vec<String>,
    pub bbox: Vec<GeoBBox>,
}

impl From<&Tile> for TileTarget {
    fn from(tile: &Tile) -> Self {
        Self {
            id: tile.id,
            wkt: tile.wkt.clone(),
            bbox: tile.bbox.clone(),
        }
    }
}

/// Everything the loader needs to know about one view.
#[derive(Clone, Debug, PartialEq)]
pub struct ViewUpdate {
    pub tiles: Vec<TileTarget>,
    pub zoom: u32,
    pub shape: ShapeKind,
    pub densify: Densify,
    pub full_res: bool,
    pub print_zoom: Option<u32>,
}

impl ViewUpdate {
    #[must_use]
    pub fn new(tiles: &[Tile], zoom: u32, strategy: &dyn ShapeStrategy) -> Self {
        Self {
            tiles: tiles.iter().map(TileTarget::from).collect(),
            zoom,
            shape: strategy.kind(),
            densify: strategy.densify(),
            full_res: false,
            print_zoom: None,
        }
    }

    /// Request unsimplified features, as print export does.
    #[must_use]
    pub fn full_resolution(mut self, print_zoom: Option<u32>) -> Self {
        self.full_res = true;
        self.print_zoom = print_zoom;
        self
    }
}

/// What [`FeatureLoader::update`] did with a view.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dispatch {
    /// A batch started with this many fetches.
    Started { requested: usize },
    /// A batch is in flight; the view replaced the pending tail.
    Queued,
}

struct FetchTask {
    generation: u64,
    layer: usize,
    densify: Densify,
    request: FeatureRequest,
}

struct FetchResult {
    generation: u64,
    layer: usize,
    tile: TileId,
    /// `None` when the fetch was skipped as superseded.
    features: Option<FeatureCollection>,
}

/// Per-layer, per-tile feature cache fed by a worker pool.
pub struct FeatureLoader {
    task_sender: Sender<FetchTask>,
    result_receiver: Receiver<FetchResult>,
    /// Fetches queued or running, keyed by layer and tile.
    active: Arc<DashMap<(usize, TileId), u64>>,
    /// Bumped by [`reset`](Self::reset); older results are dropped.
    generation: Arc<AtomicU64>,
    layers: Vec<Layer>,
    in_flight: usize,
    pending: Option<ViewUpdate>,
    current: Option<ViewUpdate>,
}

impl FeatureLoader {
    /// Spawn `workers` fetch threads (0 picks a count from the cores).
    pub fn new(
        source: Arc<dyn FeatureSource>,
        workers: usize,
        max_in_flight: usize,
        result_capacity: usize,
    ) -> Result<Self, LoaderError> {
        let workers = if workers == 0 { default_workers() } else { workers };
        let (task_sender, task_receiver) = bounded::<FetchTask>(max_in_flight.max(1) * 2);
        let (result_sender, result_receiver) = bounded::<FetchResult>(result_capacity.max(1));
        let generation = Arc::new(AtomicU64::new(0));

        for idx in 0..workers {
            let receiver = task_receiver.clone();
            let sender = result_sender.clone();
            let source = Arc::clone(&source);
            let generation = Arc::clone(&generation);

            std::thread::Builder::new()
                .name(format!("feature-worker-{idx}"))
                .spawn(move || {
                    while let Ok(task) = receiver.recv() {
                        let result = run_fetch(source.as_ref(), &task, generation.load(Ordering::Relaxed));
                        if sender.send(result).is_err() {
                            break;
                        }
                    }
                })?;
        }
        info!(workers, max_in_flight, "feature loader started");

        Ok(Self {
            task_sender,
            result_receiver,
            active: Arc::new(DashMap::new()),
            generation,
            layers: Vec::new(),
            in_flight: 0,
            pending: None,
            current: None,
        })
    }

    pub fn with_defaults(source: Arc<dyn FeatureSource>) -> Result<Self, LoaderError> {
        Self::new(source, 0, 64, 128)
    }

    pub fn add_layer(&mut self, spec: LayerSpec) -> usize {
        info!(layer = %spec.name, table = %spec.table, "layer added");
        self.layers.push(Layer::new(spec));
        self.layers.len() - 1
    }

    pub fn layers(&self) -> impl Iterator<Item = &LayerSpec> {
        self.layers.iter().map(|l| &l.spec)
    }

    /// Load features for a new view, or park it as the pending tail.
    pub fn update(&mut self, view: ViewUpdate) -> Dispatch {
        if self.in_flight > 0 {
            if self.pending.is_some() {
                debug!("pending view replaced");
            }
            self.pending = Some(view);
            return Dispatch::Queued;
        }
        let requested = self.start(view);
        Dispatch::Started { requested }
    }

    /// Replay the current view, picking up layers added since.
    pub fn refresh(&mut self) -> Dispatch {
        match self.current.clone() {
            Some(view) => self.update(view),
            None => Dispatch::Started { requested: 0 },
        }
    }

    fn start(&mut self, view: ViewUpdate) -> usize {
        let generation = self.generation.load(Ordering::Relaxed);
        let mut requested = 0;
        let mut deferred = false;

        'layers: for (layer_idx, layer) in self.layers.iter_mut().enumerate() {
            if !layer.spec.active_at(view.zoom) {
                continue;
            }
            for tile in &view.tiles {
                if layer.status(&tile.id) != TileStatus::Unrequested {
                    continue;
                }
                let task = FetchTask {
                    generation,
                    layer: layer_idx,
                    densify: view.densify,
                    request: FeatureRequest {
                        table: layer.spec.table.clone(),
                        geometry: layer.spec.geometry,
                        property_keys: layer.spec.property_keys.clone(),
                        wkt: tile.wkt.clone(),
                        bbox: tile.bbox.clone(),
                        zoom: view.zoom,
                        shape: view.shape,
                        tile: tile.id,
                        full_res: view.full_res,
                        print_zoom: view.print_zoom,
                    },
                };
                if self.task_sender.try_send(task).is_err() {
                    deferred = true;
                    break 'layers;
                }
                layer.set_status(tile.id, TileStatus::Loading);
                self.active.insert((layer_idx, tile.id), generation);
                requested += 1;
            }
        }

        self.in_flight += requested;
        debug!(zoom = view.zoom, tiles = view.tiles.len(), requested, "feature batch started");
        if deferred {
            debug!("task queue full, replaying view after this batch");
            self.pending.get_or_insert_with(|| view.clone());
        }
        self.current = Some(view);
        requested
    }

    /// Store finished fetches; returns tiles that got new features.
    ///
    /// Call once per frame on the owning thread.
    pub fn poll(&mut self) -> Vec<TileId> {
        let mut loaded = Vec::new();
        while let Ok(result) = self.result_receiver.try_recv() {
            if let Some(tile) = self.accept(result) {
                loaded.push(tile);
            }
        }
        self.replay_tail();
        loaded.sort();
        loaded.dedup();
        loaded
    }

    /// Block until every batch, tail included, has landed.
    ///
    /// Returns `false` on timeout.
    pub fn wait_idle(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            self.replay_tail();
            if self.in_flight == 0 {
                return true;
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.result_receiver.recv_timeout(remaining) {
                Ok(result) => {
                    self.accept(result);
                }
                Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => return false,
            }
        }
    }

    fn accept(&mut self, result: FetchResult) -> Option<TileId> {
        self.in_flight = self.in_flight.saturating_sub(1);
        // A newer fetch of the same tile may already be tracked.
        self.active
            .remove_if(&(result.layer, result.tile), |_, generation| *generation == result.generation);
        if result.generation != self.generation.load(Ordering::Relaxed) {
            debug!(tile = %result.tile, "stale fetch dropped");
            return None;
        }
        let layer = self.layers.get_mut(result.layer)?;
        // Only superseded tasks skip the fetch, and those were dropped above.
        let features = result.features?;
        debug!(layer = %layer.spec.name, tile = %result.tile, features = features.features.len(), "tile loaded");
        layer.store(result.tile, features);
        Some(result.tile)
    }

    fn replay_tail(&mut self) {
        if self.in_flight == 0
            && let Some(view) = self.pending.take()
        {
            debug!(zoom = view.zoom, "replaying pending view");
            self.start(view);
        }
    }

    /// Forget every tile and drop fetches still on their way back.
    pub fn reset(&mut self) {
        self.generation.fetch_add(1, Ordering::Relaxed);
        for layer in &mut self.layers {
            layer.clear();
        }
        self.pending = None;
        self.current = None;
        info!("feature cache reset");
    }

    #[must_use]
    pub fn status(&self, layer: &str, tile: &TileId) -> TileStatus {
        self.layers
            .iter()
            .find(|l| l.spec.name == layer)
            .map_or(TileStatus::Unrequested, |l| l.status(tile))
    }

    /// Whether every layer active at the tile's zoom has loaded it.
    #[must_use]
    pub fn is_ready(&self, tile: &TileId) -> bool {
        self.layers
            .iter()
            .filter(|l| l.spec.active_at(tile.zoom))
            .all(|l| l.status(tile) == TileStatus::Loaded)
    }

    #[must_use]
    pub fn features(&self, layer: &str, tile: &TileId) -> Option<Arc<FeatureCollection>> {
        self.layers.iter().find(|l| l.spec.name == layer)?.features(tile)
    }

    /// Loaded features of every layer for one tile, in layer order.
    #[must_use]
    pub fn tile_features(&self, tile: &TileId) -> Vec<(&LayerSpec, Arc<FeatureCollection>)> {
        self.layers
            .iter()
            .filter_map(|l| l.features(tile).map(|f| (&l.spec, f)))
            .collect()
    }

    #[must_use]
    pub fn in_flight_count(&self) -> usize {
        self.in_flight
    }

    #[must_use]
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    #[must_use]
    pub fn is_fetching(&self, layer: usize, tile: &TileId) -> bool {
        self.active.contains_key(&(layer, *tile))
    }
}

fn default_workers() -> usize {
    let cpus = num_cpus::get().max(2);
    (cpus - 2).clamp(1, 4)
}

/// Runs on a worker thread.
fn run_fetch(source: &dyn FeatureSource, task: &FetchTask, generation: u64) -> FetchResult {
    let features = if task.generation == generation {
        let mut features = match source.get_features(&task.request) {
            Ok(features) => features,
            Err(error) => {
                warn!(table = %task.request.table, tile = %task.request.tile, %error, "fetch failed, tile left empty");
                crate::empty_collection()
            }
        };
        task.densify.collection(&mut features);
        Some(features)
    } else {
        None
    };
    FetchResult {
        generation: task.generation,
        layer: task.layer,
        tile: task.request.tile,
        features,
    }
}
