//! Configuration for the facet globe.
//!
//! Settings persist to disk as RON, every section falls back to defaults when
//! missing, and command-line arguments override whatever was loaded.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{
    Config, DataConfig, DebugConfig, LoaderConfig, PrintConfig, RenderConfig, StyleConfig,
    TilingConfig, ViewConfig, WindowConfig, default_config_dir,
};
pub use error::ConfigError;
