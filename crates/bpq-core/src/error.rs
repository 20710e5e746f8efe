//! Error types for bpq-core

use thiserror::Error;

use crate::ids::{HolderId, ResourceKey};

/// Core error type for queue engine operations
#[derive(Debug, Error)]
pub enum Error {
    /// Dequeue attempted on a queue with no members
    #[error("Queue for '{0}' is empty")]
    EmptyQueue(ResourceKey),

    /// Holder enqueued twice into the same queue
    #[error("Holder {holder} is already queued for '{key}'")]
    DuplicateHolder {
        /// Queue the holder was enqueued into
        key: ResourceKey,
        /// Offending holder
        holder: HolderId,
    },

    /// Configuration could not be used
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// Holder identifier could not be parsed
    #[error("Invalid holder id: {0}")]
    InvalidHolder(String),

    /// Filesystem errors
    #[error("IO error: {0}")]
    Io(String),

    /// Snapshot or config encoding errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Self::InvalidConfig(err.to_string())
    }
}

impl From<toml::ser::Error> for Error {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type alias for bpq-core operations
pub type Result<T> = std::result::Result<T, Error>;
