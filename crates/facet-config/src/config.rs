//! Configuration sections with defaults and RON persistence.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const CONFIG_FILE: &str = "config.ron";

/// Top-level configuration for the globe viewer and the print exporter.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub window: WindowConfig,
    pub view: ViewConfig,
    pub tiling: TilingConfig,
    pub loader: LoaderConfig,
    pub style: StyleConfig,
    pub data: DataConfig,
    pub print: PrintConfig,
    pub render: RenderConfig,
    pub debug: DebugConfig,
}

/// Window configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WindowConfig {
    /// Window width in logical pixels.
    pub width: u32,
    /// Window height in logical pixels.
    pub height: u32,
    pub title: String,
    /// Present with `PresentMode::Fifo` when available.
    pub vsync: bool,
}

/// Initial view state and interaction tuning.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ViewConfig {
    /// Shape name, one of the nine solids (`icosahedron`, `cube`, ...).
    pub shape: String,
    /// Start center as `[lon, lat]` in degrees.
    pub center: [f64; 2],
    pub zoom: u32,
    /// CSS colour used to clear the frame.
    pub background_color: String,
    /// Draw face and tile outlines over the textured solid.
    pub show_graticule: bool,
    /// Degrees of rotation per dragged pixel at zoom 0.
    pub drag_sensitivity: f64,
    /// Absolute latitude the camera may reach while dragging.
    pub max_latitude: f64,
    /// Quiet period after the last wheel event before tiles are requested.
    pub zoom_debounce_ms: u64,
}

/// Adaptive tiling parameters.
///
/// The icosahedron neighbour search stops after `neighbor_cap` tiles or when
/// candidates are farther than `neighbor_distance_factor * R / 2^zoom` from
/// the tile under the camera.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TilingConfig {
    pub neighbor_cap: usize,
    pub neighbor_distance_factor: f64,
    /// Simplification tolerance in degrees at zoom 0, halved at every level.
    pub simplify_tolerance: f64,
}

/// Feature fetch worker pool.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoaderConfig {
    /// Worker threads; 0 picks a count from the available cores.
    pub worker_threads: usize,
    pub max_in_flight: usize,
    pub result_capacity: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StyleConfig {
    /// JSON file holding the style rule array.
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DataConfig {
    /// Directory scanned for `.geojson` layers.
    pub directory: Option<PathBuf>,
}

/// Print export settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PrintConfig {
    /// Multiplier applied to every tile raster size.
    pub scale: f64,
    /// Zoom used for simplification when printing.
    pub zoom: u32,
    pub output_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RenderConfig {
    /// Fixed redraw rate of the frame loop.
    pub target_fps: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// `EnvFilter` directive, e.g. `"info"` or `"debug,facet_loader=trace"`.
    pub log_level: String,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            title: "Facet".to_string(),
            vsync: true,
        }
    }
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            shape: "icosahedron".to_string(),
            center: [0.0, 0.0],
            zoom: 0,
            background_color: "#f2f2f2".to_string(),
            show_graticule: true,
            drag_sensitivity: 0.02,
            max_latitude: 80.0,
            zoom_debounce_ms: 100,
        }
    }
}

impl Default for TilingConfig {
    fn default() -> Self {
        Self {
            neighbor_cap: 20,
            neighbor_distance_factor: 2.5,
            simplify_tolerance: 0.4,
        }
    }
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            worker_threads: 0,
            max_in_flight: 64,
            result_capacity: 128,
        }
    }
}

impl Default for PrintConfig {
    fn default() -> Self {
        Self {
            scale: 1.0,
            zoom: 0,
            output_dir: PathBuf::from("."),
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self { target_fps: 30 }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Platform config directory for the application, e.g. `~/.config/facet`.
pub fn default_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("facet"))
}

impl Config {
    /// Load `config.ron` from `config_dir`, writing defaults when it does not exist.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let path = config_dir.join(CONFIG_FILE);

        if path.exists() {
            let config = Self::read(&path)?;
            log::info!("Loaded config from {}", path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", path.display());
            Ok(config)
        }
    }

    /// Write this config to `config_dir/config.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(|source| ConfigError::Write {
            path: config_dir.to_path_buf(),
            source,
        })?;

        let path = config_dir.join(CONFIG_FILE);
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .separate_tuple_members(true)
            .enumerate_arrays(false);
        let serialized = ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::Serialize)?;

        std::fs::write(&path, serialized).map_err(|source| ConfigError::Write { path, source })
    }

    /// Re-read the file and return the new config only when it differs.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let fresh = Self::read(&config_dir.join(CONFIG_FILE))?;
        if &fresh != self {
            log::info!("Config reloaded with changes");
            Ok(Some(fresh))
        } else {
            Ok(None)
        }
    }

    /// Reject values the tiling engine and exporter cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tiling.neighbor_cap == 0 {
            return Err(ConfigError::Invalid {
                field: "tiling.neighbor_cap",
                reason: "must allow at least the tile under the camera".to_string(),
            });
        }
        if !(self.tiling.neighbor_distance_factor > 0.0) {
            return Err(ConfigError::Invalid {
                field: "tiling.neighbor_distance_factor",
                reason: format!("{} is not positive", self.tiling.neighbor_distance_factor),
            });
        }
        if !(self.print.scale > 0.0) {
            return Err(ConfigError::Invalid {
                field: "print.scale",
                reason: format!("{} is not positive", self.print.scale),
            });
        }
        if self.render.target_fps == 0 {
            return Err(ConfigError::Invalid {
                field: "render.target_fps",
                reason: "frame loop needs a non-zero rate".to_string(),
            });
        }
        if !(0.0..=90.0).contains(&self.view.max_latitude) {
            return Err(ConfigError::Invalid {
                field: "view.max_latitude",
                reason: format!("{} is outside 0..=90", self.view.max_latitude),
            });
        }
        Ok(())
    }

    fn read(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        ron::from_str(&contents).map_err(ConfigError::Parse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_serializes() {
        let config = Config::default();
        let ron_str =
            ron::ser::to_string_pretty(&config, ron::ser::PrettyConfig::new().depth_limit(3))
                .unwrap();
        assert!(ron_str.contains("shape: \"icosahedron\""));
        assert!(ron_str.contains("neighbor_cap: 20"));
        assert!(ron_str.contains("target_fps: 30"));
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let config: Config = ron::from_str("(view: (shape: \"cube\"))").unwrap();
        assert_eq!(config.view.shape, "cube");
        assert_eq!(config.view.zoom, 0, "unset fields inside a section keep defaults");
        assert_eq!(config.tiling, TilingConfig::default());
        assert_eq!(config.print, PrintConfig::default());
    }

    #[test]
    fn test_unknown_fields_are_accepted() {
        let result: Result<Config, _> = ron::from_str("(wind: (max_time: 5000))");
        assert!(result.is_ok(), "forward-compatible files must still parse");
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.view.shape = "lotus".to_string();
        config.view.center = [12.5, 41.9];
        config.data.directory = Some(PathBuf::from("/srv/layers"));

        config.save(dir.path()).unwrap();
        let loaded = Config::load_or_create(dir.path()).unwrap();
        assert_eq!(config, loaded);
    }

    #[test]
    fn test_load_or_create_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_create(dir.path()).unwrap();
        assert_eq!(config, Config::default());
        assert!(dir.path().join(CONFIG_FILE).exists());
    }

    #[test]
    fn test_reload_detects_changes() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::default();
        config.save(dir.path()).unwrap();
        assert!(config.reload(dir.path()).unwrap().is_none());

        let mut modified = config.clone();
        modified.tiling.neighbor_cap = 32;
        modified.save(dir.path()).unwrap();

        let reloaded = config.reload(dir.path()).unwrap();
        assert_eq!(reloaded.map(|c| c.tiling.neighbor_cap), Some(32));
    }

    #[test]
    fn test_malformed_file_reports_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "{{not ron}}").unwrap();
        let err = Config::load_or_create(dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)), "got {err:?}");
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(Config::default().validate().is_ok());

        let mut config = Config::default();
        config.print.scale = 0.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field: "print.scale", .. })
        ));

        let mut config = Config::default();
        config.tiling.neighbor_cap = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.view.max_latitude = 95.0;
        assert!(config.validate().is_err());
    }
}
