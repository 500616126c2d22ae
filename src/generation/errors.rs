//! Error types for the generation domain

use thiserror::Error;

/// Errors that can occur during code generation
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid language: {0}")]
    InvalidLanguage(String),

    #[error("Generator with id {0} not found")]
    GeneratorNotFound(String),

    /// A schema could not be mapped to a target-language type; `location`
    /// names the operation, parameter or property being converted.
    #[error("error converting type of [{location}]: {message}")]
    TypeMapping { location: String, message: String },

    /// A schema shape the type mapper cannot express
    #[error("{0}")]
    UnsupportedSchema(String),

    #[error("Template error: {0}")]
    TemplateError(String),

    #[error("Render error: {0}")]
    RenderError(String),

    #[error("Metadata error: {0}")]
    MetadataError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Manifest error: {0}")]
    ManifestError(#[from] serde_yaml::Error),

    #[error("Template engine error: {0}")]
    Tera(#[from] tera::Error),
}

impl GenerationError {
    pub fn type_mapping<L: Into<String>, M: ToString>(location: L, message: M) -> Self {
        Self::TypeMapping {
            location: location.into(),
            message: message.to_string(),
        }
    }
}
