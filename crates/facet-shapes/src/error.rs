use facet_raster::RasterError;
use thiserror::Error;

/// A shape name that matches none of the known solids.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown shape type {0:?}")]
pub struct UnknownShape(pub String);

#[derive(Debug, Error)]
pub enum PrintError {
    #[error("no rendered tiles to lay out")]
    Empty,

    #[error("texture for tile {0} is missing")]
    MissingTexture(usize),

    #[error("failed to allocate a print sheet")]
    Raster(#[from] RasterError),
}
