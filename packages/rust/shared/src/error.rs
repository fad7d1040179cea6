//! Error types for awsdigest.
//!
//! Library crates use [`DigestError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all awsdigest operations.
#[derive(Debug, thiserror::Error)]
pub enum DigestError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Network/HTTP error while fetching articles or the feed.
    #[error("network error: {0}")]
    Network(String),

    /// HTML/XML parsing or content extraction error.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Service catalog store error (store unreachable, query failed).
    #[error("storage error: {0}")]
    Storage(String),

    /// Language model call error.
    #[error("model error: {message}")]
    Model { message: String, transient: bool },

    /// Knowledge base API error.
    #[error("knowledge base error: {0}")]
    KnowledgeBase(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (empty abbreviation, bad URL, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, DigestError>;

impl DigestError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// A model failure worth retrying (timeouts, 429, 5xx).
    pub fn model_transient(msg: impl Into<String>) -> Self {
        Self::Model {
            message: msg.into(),
            transient: true,
        }
    }

    /// A model failure that will not go away on retry (auth, bad request, empty reply).
    pub fn model(msg: impl Into<String>) -> Self {
        Self::Model {
            message: msg.into(),
            transient: false,
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether a retry policy should try the call again.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::Model { transient, .. } => *transient,
            _ => false,
        }
    }
}
