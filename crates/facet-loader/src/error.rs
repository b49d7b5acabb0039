//! Data-source errors.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path} is not a directory")]
    NotADirectory { path: PathBuf },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: geojson::Error,
    },

    #[error("{path} holds a bare geometry, expected features")]
    NotFeatures { path: PathBuf },

    #[error("unknown table `{0}`")]
    UnknownTable(String),

    #[error("data source unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("failed to spawn feature worker: {0}")]
    Spawn(#[from] std::io::Error),
}
