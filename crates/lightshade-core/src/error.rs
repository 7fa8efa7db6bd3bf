//! Unified error handling for lightshade
//!
//! Errors raised at the host boundary: loading scene dumps, resolving
//! nodes, and evaluating meshes. The export crate wraps this type.

use std::path::PathBuf;
use thiserror::Error;

/// Unified error type for scene-side operations
#[derive(Error, Debug)]
pub enum Error {
    // ==================== I/O Errors ====================

    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// File not found
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// Malformed scene dump
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ==================== Scene Errors ====================

    /// Node name does not resolve in the scene
    #[error("Node not found: {name}")]
    NodeNotFound {
        name: String,
    },

    /// Two nodes share a name; names key the output document
    #[error("Duplicate node name: {name}")]
    DuplicateNode {
        name: String,
    },

    /// Invalid data structure
    #[error("Invalid data: {message}")]
    InvalidData {
        message: String,
    },

    /// The host could not produce a working mesh for a node
    #[error("Mesh unavailable for node {name}: {reason}")]
    MeshUnavailable {
        name: String,
        reason: String,
    },

    // ==================== General Errors ====================

    /// Custom error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<Error>,
    },
}

/// Result type using the unified Error
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create an error with additional context
    pub fn with_context(self, context: impl Into<String>) -> Self {
        Error::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Create an invalid data error
    pub fn invalid_data(message: impl Into<String>) -> Self {
        Error::InvalidData {
            message: message.into(),
        }
    }

    /// Create a node-not-found error
    pub fn node_not_found(name: impl Into<String>) -> Self {
        Error::NodeNotFound { name: name.into() }
    }

    /// Create a mesh-unavailable error
    pub fn mesh_unavailable(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::MeshUnavailable {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Check if this is a "not found" type error
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::FileNotFound(_) | Error::NodeNotFound { .. } => true,
            Error::WithContext { source, .. } => source.is_not_found(),
            _ => false,
        }
    }
}

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.with_context(f()))
    }
}
