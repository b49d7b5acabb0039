use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum RasterError {
    #[error("unrecognised colour `{0}`")]
    InvalidColor(String),

    #[error("canvas must be at least 1x1, got {width}x{height}")]
    ZeroSize { width: u32, height: u32 },

    #[error("cannot write {path}: {source}")]
    Save {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}
