//! Error types for template loading and rendering

use thiserror::Error;

/// Errors that can occur in template operations
#[derive(Error, Debug)]
pub enum TemplateError {
    /// Template set not found under any lookup candidate
    #[error("Template not found: {0}")]
    TemplateNotFound(String),

    /// Invalid manifest file or format
    #[error("Invalid manifest: {0}")]
    InvalidManifest(String),

    /// A template failed to parse or render
    #[error("Failed to render {template}: {message}")]
    Render { template: String, message: String },

    /// A resolved target escapes the output directory
    #[error("Invalid target path {0}: must stay inside the output directory")]
    InvalidTarget(String),

    /// IO error during template operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    YamlError(#[from] serde_yaml::Error),
}

impl TemplateError {
    pub fn not_found<S: Into<String>>(path: S) -> Self {
        Self::TemplateNotFound(path.into())
    }

    pub fn invalid_manifest<S: Into<String>>(message: S) -> Self {
        Self::InvalidManifest(message.into())
    }

    /// Render error carrying the whole Tera cause chain; the top-level Tera
    /// message alone rarely names the failing expression.
    pub fn render(template: &str, error: &tera::Error) -> Self {
        let mut message = error.to_string();
        let mut source = std::error::Error::source(error);
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        Self::Render {
            template: template.to_string(),
            message,
        }
    }
}

impl From<TemplateError> for crate::generation::GenerationError {
    fn from(error: TemplateError) -> Self {
        match error {
            TemplateError::Render { .. } | TemplateError::InvalidTarget(_) => {
                Self::RenderError(error.to_string())
            }
            TemplateError::IoError(e) => Self::IoError(e),
            other => Self::TemplateError(other.to_string()),
        }
    }
}
