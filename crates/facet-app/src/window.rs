//! The interactive globe window.
//!
//! [`GlobeApp`] implements winit's [`ApplicationHandler`]: input moves the
//! view, settled views re-tile and feed the loader, and a fixed-rate frame
//! clock composites newly loaded tiles and redraws.

use std::sync::Arc;
use std::time::Instant;

use facet_compositor::{Compositor, LayerFeatures};
use facet_config::Config;
use facet_loader::{FeatureLoader, ViewUpdate};
use facet_raster::Color;
use facet_render::{
    DEFAULT_BACKGROUND, FrameClock, GlobeRenderer, RenderContext, SurfaceError, clear_color, graticule_mesh,
    init_render_context_blocking,
};
use facet_shapes::{ShapeKind, TileId, TilingEngine};
use glam::DVec2;
use tracing::{debug, error, info, warn};
use winit::application::ApplicationHandler;
use winit::event::{ElementState, KeyEvent, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowAttributes, WindowId};

use crate::data::{self, DataSet, tiling_params};
use crate::error::AppError;
use crate::view::{View, wheel_steps};

/// Window attributes from the `window` section.
#[must_use]
pub fn window_attributes(config: &Config) -> WindowAttributes {
    WindowAttributes::default()
        .with_title(config.window.title.clone())
        .with_inner_size(winit::dpi::LogicalSize::new(
            f64::from(config.window.width),
            f64::from(config.window.height),
        ))
}

/// Configured background as a clear colour.
#[must_use]
pub fn background(config: &Config) -> wgpu::Color {
    match config.view.background_color.parse::<Color>() {
        Ok(color) => {
            let [r, g, b, a] = color.to_array().map(|c| f64::from(c) / 255.0);
            clear_color([r, g, b, a])
        }
        Err(err) => {
            warn!("background colour ignored: {err}");
            DEFAULT_BACKGROUND
        }
    }
}

/// Shape selected by the digit keys, in [`ShapeKind::ALL`] order.
#[must_use]
pub fn shape_for_key(key: KeyCode) -> Option<ShapeKind> {
    let index = match key {
        KeyCode::Digit1 => 0,
        KeyCode::Digit2 => 1,
        KeyCode::Digit3 => 2,
        KeyCode::Digit4 => 3,
        KeyCode::Digit5 => 4,
        KeyCode::Digit6 => 5,
        KeyCode::Digit7 => 6,
        KeyCode::Digit8 => 7,
        KeyCode::Digit9 => 8,
        _ => return None,
    };
    ShapeKind::ALL.get(index).copied()
}

pub struct GlobeApp {
    config: Config,
    engine: TilingEngine,
    loader: FeatureLoader,
    compositor: Compositor,
    view: View,
    clock: FrameClock,
    background: wgpu::Color,
    window: Option<Arc<Window>>,
    gpu: Option<RenderContext>,
    renderer: Option<GlobeRenderer>,
    /// First fatal error; returned once the loop exits.
    failure: Option<AppError>,
}

impl GlobeApp {
    pub fn new(config: Config, kind: ShapeKind, data: &DataSet) -> Result<Self, AppError> {
        let engine = TilingEngine::new(kind, None, tiling_params(&config));
        let loader = data.loader(&config)?;
        let compositor = data::compositor(&config);
        let view = View::new(&config, engine.strategy().max_zoom(), (config.window.width, config.window.height));
        Ok(Self {
            clock: FrameClock::new(config.render.target_fps, Instant::now()),
            background: background(&config),
            config,
            engine,
            loader,
            compositor,
            view,
            window: None,
            gpu: None,
            renderer: None,
            failure: None,
        })
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: AppError) {
        error!("{err}");
        self.failure.get_or_insert(err);
        event_loop.exit();
    }

    /// Recompute the tiles for the current view and hand them to the
    /// loader and the renderer.
    fn retile(&mut self) {
        let query = self.view.query();
        self.engine.update(&query);
        let dispatch = self.loader.update(ViewUpdate::new(
            self.engine.tiles(),
            self.engine.zoom(),
            self.engine.strategy(),
        ));
        debug!(zoom = self.engine.zoom(), tiles = self.engine.tiles().len(), ?dispatch, "view re-tiled");

        let (Some(gpu), Some(renderer)) = (&self.gpu, &mut self.renderer) else {
            return;
        };
        renderer.sync_tiles(&gpu.device, self.engine.tiles());
        if self.config.view.show_graticule {
            renderer.set_graticule(&gpu.device, &graticule_mesh(self.engine.solid(), self.engine.tiles()));
        }
    }

    /// Drop every tile, texture and feature and start over on `kind`.
    fn set_shape(&mut self, kind: ShapeKind) {
        if kind == self.engine.kind() {
            return;
        }
        info!(from = self.engine.kind().name(), to = kind.name(), "shape changed");
        self.engine.set_shape(kind, None);
        self.loader.reset();
        self.compositor.clear();
        if let Some(renderer) = &mut self.renderer {
            renderer.clear();
        }
        self.view.set_max_zoom(self.engine.strategy().max_zoom());
        self.retile();
    }

    /// Composite every live tile whose features are complete and that is
    /// either missing a texture or just received new data.
    fn upload_textures(&mut self) {
        let (Some(gpu), Some(renderer)) = (&self.gpu, &mut self.renderer) else {
            return;
        };
        let mut fresh: Vec<TileId> = self.loader.poll();
        fresh.extend(
            self.engine
                .tiles()
                .iter()
                .map(|t| t.id)
                .filter(|id| renderer.needs_texture(id)),
        );
        fresh.sort();
        fresh.dedup();
        fresh.retain(|id| self.loader.is_ready(id));
        if fresh.is_empty() {
            return;
        }

        let sizes = self.engine.sizes(1.0);
        let frames = self.engine.frames(&sizes);
        let strategy = self.engine.strategy();
        for (tile, frame) in self.engine.tiles().iter().zip(&frames) {
            if fresh.binary_search(&tile.id).is_err() {
                continue;
            }
            let loaded = self.loader.tile_features(&tile.id);
            let layers: Vec<LayerFeatures<'_>> = loaded
                .iter()
                .map(|(spec, features)| LayerFeatures {
                    source: &spec.name,
                    features: features.as_ref(),
                })
                .collect();
            let image = match self.compositor.render(strategy, tile, frame, &layers) {
                Ok(image) => image,
                Err(err) => {
                    warn!(tile = %tile.id, "composite failed: {err}");
                    continue;
                }
            };
            if let Err(err) = renderer.set_tile_texture(&gpu.device, &gpu.queue, &tile.id, &image) {
                warn!(tile = %tile.id, "texture upload failed: {err}");
            }
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        self.upload_textures();
        let (Some(gpu), Some(renderer)) = (&self.gpu, &mut self.renderer) else {
            return;
        };
        match renderer.render(gpu, &self.view.camera, self.background) {
            Ok(()) => {}
            Err(SurfaceError::OutOfMemory) => {
                error!("surface out of memory, shutting down");
                event_loop.exit();
            }
            Err(err) => warn!("frame skipped: {err:?}"),
        }
    }

    fn resize(&mut self, width: u32, height: u32) {
        if let Some(gpu) = &mut self.gpu {
            gpu.resize(width, height);
            if let Some(renderer) = &mut self.renderer {
                let (w, h) = gpu.size();
                renderer.resize(&gpu.device, w, h);
            }
        }
        self.view.resize((width, height));
        debug!(width, height, "window resized");
    }
}

impl ApplicationHandler for GlobeApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        let window = match event_loop.create_window(window_attributes(&self.config)) {
            Ok(window) => Arc::new(window),
            Err(err) => {
                error!("window creation failed: {err}");
                event_loop.exit();
                return;
            }
        };
        let gpu = match init_render_context_blocking(Arc::clone(&window), self.config.window.vsync) {
            Ok(gpu) => gpu,
            Err(err) => return self.fail(event_loop, err.into()),
        };
        let renderer = match GlobeRenderer::new(&gpu) {
            Ok(renderer) => renderer,
            Err(err) => return self.fail(event_loop, err.into()),
        };
        info!(size = ?gpu.size(), format = ?gpu.surface_format, "globe window ready");
        let size = gpu.size();
        self.gpu = Some(gpu);
        self.renderer = Some(renderer);
        self.window = Some(window);
        self.view.resize(size);
        self.retile();
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        let now = Instant::now();
        match event {
            WindowEvent::CloseRequested => {
                info!("close requested, shutting down");
                event_loop.exit();
            }
            WindowEvent::Resized(size) => self.resize(size.width, size.height),
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => self.view.press(state == ElementState::Pressed, now),
            WindowEvent::CursorMoved { position, .. } => {
                self.view.cursor_moved(DVec2::new(position.x, position.y), now);
            }
            WindowEvent::MouseWheel { delta, .. } => {
                self.view.wheel(wheel_steps(delta), now);
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => {
                if code == KeyCode::Escape {
                    event_loop.exit();
                } else if let Some(kind) = shape_for_key(code) {
                    self.set_shape(kind);
                }
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let now = Instant::now();
        if self.view.settled_query(now).is_some() {
            self.retile();
        }
        if self.clock.tick(now).is_some()
            && let Some(window) = &self.window
        {
            window.request_redraw();
        }
        let wake = match self.view.deadline() {
            Some(deadline) => deadline.min(self.clock.next_deadline()),
            None => self.clock.next_deadline(),
        };
        event_loop.set_control_flow(ControlFlow::WaitUntil(wake));
    }
}

/// Open the window and run until it closes.
pub fn run(config: Config, kind: ShapeKind, data: &DataSet) -> Result<(), AppError> {
    let event_loop = EventLoop::new()?;
    let mut app = GlobeApp::new(config, kind, data)?;
    event_loop.run_app(&mut app)?;
    match app.failure.take() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digit_keys_pick_shapes() {
        assert_eq!(shape_for_key(KeyCode::Digit1), Some(ShapeKind::ALL[0]));
        assert_eq!(shape_for_key(KeyCode::Digit9), Some(ShapeKind::ALL[8]));
        assert_eq!(shape_for_key(KeyCode::KeyA), None);
    }

    #[test]
    fn test_background_parses_css() {
        let mut config = Config::default();
        config.view.background_color = "#ffffff".to_string();
        let white = background(&config);
        assert!((white.r - 1.0).abs() < 1e-9 && (white.a - 1.0).abs() < 1e-9);

        config.view.background_color = "not a colour".to_string();
        assert_eq!(background(&config), DEFAULT_BACKGROUND, "unparsable colours fall back");
    }

    #[test]
    fn test_window_attributes_follow_config() {
        let mut config = Config::default();
        config.window.title = "globe".to_string();
        let attrs = window_attributes(&config);
        assert_eq!(attrs.title, "globe");
    }
}
