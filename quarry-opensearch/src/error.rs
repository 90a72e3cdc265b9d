//! Error types for OpenSearch operations.

use thiserror::Error;

/// OpenSearch error type.
#[derive(Error, Debug)]
pub enum OpenSearchError {
    /// Connection error.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Validation error.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The server rejected a request.
    #[error("Query failed with status {status}: {reason}")]
    Query {
        /// HTTP status code.
        status: u16,
        /// Reason reported by the server.
        reason: String,
    },

    /// Transport-level failure reported by an injected transport.
    #[error("Transport error: {0}")]
    Transport(String),

    /// A bucket key could not be converted to the requested key type.
    #[error("Cannot convert bucket key {key} to {target}: {reason}")]
    KeyConversion {
        /// String form of the offending key.
        key: String,
        /// Name of the requested key type.
        target: &'static str,
        /// Why the conversion failed.
        reason: String,
    },

    /// Client error from opensearch crate.
    #[error("Client error: {0}")]
    Client(#[from] opensearch::Error),
}

impl OpenSearchError {
    /// Build a key conversion error.
    pub(crate) fn key_conversion(
        key: impl ToString,
        target: &'static str,
        reason: impl Into<String>,
    ) -> Self {
        Self::KeyConversion {
            key: key.to_string(),
            target,
            reason: reason.into(),
        }
    }

    /// Check if this is a key conversion error.
    pub fn is_key_conversion(&self) -> bool {
        matches!(self, Self::KeyConversion { .. })
    }

    /// Get the HTTP status code if the server rejected the request.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Query { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Result type alias for OpenSearch operations.
pub type Result<T> = std::result::Result<T, OpenSearchError>;
