//! Error types for the record store and the service facade.

use crate::records::RecordKind;
use lifelight_rs_config::ConfigError;
use thiserror::Error;
use uuid::Uuid;

/// Errors returned by record store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A write would violate an entity invariant.
    #[error("validation failed: {0}")]
    Validation(String),
    /// The referenced record does not exist.
    #[error("{kind} not found: {id}")]
    NotFound { kind: RecordKind, id: Uuid },
    /// IO error on the journal.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Serialization error on the journal.
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    /// Journal written by a newer schema than this build understands.
    #[error("unsupported schema version: {0}")]
    UnsupportedSchema(u32),
    /// Journal does not start with a schema version header.
    #[error("missing schema version header")]
    MissingSchemaHeader,
    /// Journal line could not be decoded.
    #[error("corrupt journal at line {line}: {message}")]
    Corrupt { line: usize, message: String },
}

impl StoreError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        StoreError::Validation(message.into())
    }

    pub(crate) fn not_found(kind: RecordKind, id: Uuid) -> Self {
        StoreError::NotFound { kind, id }
    }
}

/// Errors returned by the LifeLight service facade.
#[derive(Debug, Error)]
pub enum LifeLightError {
    /// Record store failure; fatal when raised while opening.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    /// Configuration could not be resolved.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}
