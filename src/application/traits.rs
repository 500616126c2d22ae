//! Port interfaces for the application layer

use std::path::Path;

use async_trait::async_trait;

use crate::application::ApplicationError;
use crate::openapi::Document;
use crate::openapi::loader::{load_document, write_document};

/// Where documents are read from and written to
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn load(&self, path: &Path) -> Result<Document, ApplicationError>;

    /// Writes `document`, choosing YAML or JSON from the path's extension
    async fn write(&self, path: &Path, document: &Document) -> Result<(), ApplicationError>;
}

/// Documents on the local filesystem
#[derive(Debug, Default, Clone, Copy)]
pub struct FileDocumentStore;

impl FileDocumentStore {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DocumentStore for FileDocumentStore {
    async fn load(&self, path: &Path) -> Result<Document, ApplicationError> {
        Ok(load_document(path).await?)
    }

    async fn write(&self, path: &Path, document: &Document) -> Result<(), ApplicationError> {
        Ok(write_document(path, document).await?)
    }
}
