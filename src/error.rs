//! Error types for nodeherd.
//!
//! All errors in nodeherd are represented by the `NodeherdError` enum,
//! which provides specific variants for different error categories.

use std::io::ErrorKind;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unified error type for all nodeherd operations.
///
/// Backend failures of a single node are normally absorbed into that node's
/// status; the variants that reach a caller are the ones no status can encode.
#[derive(Deserialize, Serialize, Error, Debug, Clone, PartialEq)]
pub enum NodeherdError {
    /// Manager-level errors (startup, runtime handle, shutdown).
    #[error("{0}")]
    Engine(String),

    /// Configuration parsing or validation errors.
    #[error("{0}")]
    Config(String),

    /// Data conversion errors (JSON, TOML).
    #[error("{0}")]
    Convert(String),

    /// The referenced node is not in the store.
    #[error("node {0} not found")]
    NotFound(String),

    /// A runtime driver call failed.
    #[error("{0}")]
    Backend(String),

    /// The node could not be driven into the state an operation requires.
    #[error("node {node_id} is in an invalid state: {message}")]
    InvalidState {
        node_id: String,
        message: String,
    },

    /// A persisted node lacks data required to reconcile it.
    #[error("{0}")]
    DataIntegrity(String),

    /// Spec registry errors.
    #[error("{0}")]
    Registry(String),

    /// Config migration errors.
    #[error("{0}")]
    Migration(String),

    /// Storage operation errors.
    #[error("{0}")]
    Store(String),

    /// I/O operation errors.
    #[error("{0}")]
    IoError(String),
}

impl From<NodeherdError> for String {
    fn from(val: NodeherdError) -> Self {
        val.to_string()
    }
}

impl From<std::io::Error> for NodeherdError {
    fn from(error: std::io::Error) -> Self {
        NodeherdError::IoError(error.to_string())
    }
}

impl From<NodeherdError> for std::io::Error {
    fn from(val: NodeherdError) -> Self {
        #[allow(clippy::io_other_error)]
        std::io::Error::new(ErrorKind::Other, val.to_string())
    }
}

impl From<serde_json::Error> for NodeherdError {
    fn from(error: serde_json::Error) -> Self {
        NodeherdError::Convert(error.to_string())
    }
}

impl From<toml::de::Error> for NodeherdError {
    fn from(error: toml::de::Error) -> Self {
        NodeherdError::Config(error.to_string())
    }
}
