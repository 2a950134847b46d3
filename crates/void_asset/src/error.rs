//! Error types for the asset pipeline

use std::path::PathBuf;
use thiserror::Error;

use crate::types::AssetType;

/// Errors raised while reading, decoding or persisting assets
#[derive(Debug, Error)]
pub enum AssetError {
    /// Underlying file-system failure
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File does not exist
    #[error("Asset file not found: {0}")]
    NotFound(PathBuf),

    /// File stayed locked for the whole retry window
    #[error("Asset file is locked: {0}")]
    FileLocked(PathBuf),

    /// Content could not be decoded
    #[error("Failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },

    /// Recognised extension without a decoder
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// No serializer installed for the asset type
    #[error("No serializer registered for asset type {0}")]
    NoSerializer(AssetType),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),

    /// Asset thread could not be spawned
    #[error("Failed to spawn asset thread: {0}")]
    Thread(#[source] std::io::Error),

    /// File watcher could not be installed
    #[error("File watcher error: {0}")]
    Watcher(String),
}

impl AssetError {
    /// Wrap an IO error with the path it happened on
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Parse failure for a path
    pub fn parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Result alias used across the asset crates
pub type AssetResult<T> = Result<T, AssetError>;
