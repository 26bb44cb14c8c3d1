use std::path::PathBuf;

use thiserror::Error;

use crossbind_core::ClassifyError;

use crate::config::ConfigError;

/// Any failure of a generation run.
///
/// A run either produces a complete model or one of these; there is no
/// partial output.
#[derive(Debug, Error)]
pub enum BindError {
    #[error("classification failed: {0}")]
    Classify(#[from] ClassifyError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to read declarations from {path}: {source}")]
    ReadDeclarations {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid declarations: {0}")]
    Declarations(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, BindError>;
