//! Errors raised while assembling the effective LifeLight config.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    ReadFailed(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    ParseFailed(#[from] json5::Error),
    /// The merged document does not deserialize into `LifeLightConfig`.
    #[error("failed to decode config: {0}")]
    DecodeFailed(#[from] serde_json::Error),
    /// An explicitly requested layer does not exist.
    #[error("config layer not found: {}", .0.display())]
    MissingLayer(PathBuf),
    /// Schema or range check failed for one key; `path` is dotted.
    #[error("invalid config at {path}: {message}")]
    InvalidField { path: String, message: String },
    /// A default location could not be derived for this host.
    #[error("cannot resolve default {0}: no home directory")]
    UnresolvedPath(&'static str),
}
