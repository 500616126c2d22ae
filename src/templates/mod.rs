//! Template sets and their rendering.
//!
//! A template set is a directory holding a `template.yaml` manifest and the
//! Tera files it references. Sets ship embedded in the binary under
//! `templates/` and can be overridden from a directory on disk.

pub mod errors;
pub mod manifest;
pub mod renderer;
pub mod source;

pub use errors::TemplateError;
pub use manifest::{Scope, TemplateFileDescriptor, TemplateManifest};
pub use renderer::{FileState, RenderOptions, RenderedFile, TemplateRenderer};
pub use source::{
    DirectoryTemplateLoader, EmbeddedTemplateLoader, TemplateLoader, TemplateSet,
    template_candidates,
};
