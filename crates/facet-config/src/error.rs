//! Errors raised while reading, writing, or validating `config.ron`.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file exists but is not valid RON for [`crate::Config`].
    #[error("malformed config: {0}")]
    Parse(#[source] ron::error::SpannedError),

    #[error("cannot serialize config: {0}")]
    Serialize(#[source] ron::Error),

    /// A value parsed fine but is outside the range the engine accepts.
    #[error("invalid value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}
