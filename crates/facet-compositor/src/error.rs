use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StyleError {
    #[error("style is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("style must be an array of rules")]
    NotAnArray,

    #[error("failed to read style {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
