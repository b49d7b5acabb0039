use std::path::PathBuf;

use facet_compositor::StyleError;
use facet_config::ConfigError;
use facet_loader::{LoaderError, SourceError};
use facet_log::LogError;
use facet_raster::RasterError;
use facet_render::{RenderContextError, ShaderError};
use facet_shapes::{PrintError, UnknownShape};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("no configuration directory could be resolved; pass --config")]
    NoConfigDir,

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Log(#[from] LogError),

    #[error(transparent)]
    Shape(#[from] UnknownShape),

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Loader(#[from] LoaderError),

    #[error(transparent)]
    Style(#[from] StyleError),

    #[error(transparent)]
    Raster(#[from] RasterError),

    #[error(transparent)]
    Print(#[from] PrintError),

    #[error(transparent)]
    RenderContext(#[from] RenderContextError),

    #[error(transparent)]
    Shader(#[from] ShaderError),

    #[error("no layers to print")]
    NoLayers,

    #[error("features still loading after {0:?}")]
    LoadTimeout(std::time::Duration),

    #[error("cannot create output directory {path}: {source}")]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("event loop failed: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
}
