//! Error handling for the specweave transformation pipeline.
//!
//! This module defines the error type `Error` shared by the document model,
//! the merger, the patch engine and the builtin transforms, along with a
//! convenient `Result` alias. Code generation has its own error type in
//! [`crate::generation::GenerationError`].
//!
//! # Examples
//!
//! ```
//! use specweave::core::error::{Error, Result};
//!
//! fn might_fail() -> Result<()> {
//!     Err(Error::precondition("operation id is required"))
//! }
//!
//! assert!(might_fail().is_err());
//! ```

use thiserror::Error;

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for pipeline operations
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// The document is structurally invalid
    #[error("OpenAPI error: {0}")]
    OpenApi(String),

    /// A transform was handed input it cannot work on
    #[error("Precondition failed: {0}")]
    Precondition(String),

    /// Merging documents failed
    #[error("Merge error: {0}")]
    Merge(String),

    /// A patch failed to apply; `patch` identifies which one
    #[error("failed to apply patch {patch}: {message}")]
    Patch { patch: String, message: String },

    /// Patch type that no applier understands
    #[error("unsupported patch type: {0}")]
    UnsupportedPatch(String),

    /// Template error
    #[error("Template error: {0}")]
    Template(String),

    /// Template engine error
    #[error("Template engine error: {0}")]
    Tera(#[from] tera::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new OpenAPI error
    pub fn openapi<S: Into<String>>(msg: S) -> Self {
        Self::OpenApi(msg.into())
    }

    /// Create a new precondition error
    pub fn precondition<S: Into<String>>(msg: S) -> Self {
        Self::Precondition(msg.into())
    }

    /// Create a new merge error
    pub fn merge<S: Into<String>>(msg: S) -> Self {
        Self::Merge(msg.into())
    }

    /// Create a new template error
    pub fn template<S: Into<String>>(msg: S) -> Self {
        Self::Template(msg.into())
    }

    /// Wrap an error with the identity of the patch that produced it
    pub fn patch<P: ToString, S: ToString>(patch: P, message: S) -> Self {
        Self::Patch {
            patch: patch.to_string(),
            message: message.to_string(),
        }
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Self::Config(s.to_string())
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Self::Config(s)
    }
}
