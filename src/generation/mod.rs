//! Generation domain module - turns a document into source code
//!
//! The document is first reduced to language-agnostic template data
//! ([`ir::DocumentModel`]) using a [`CodeGenerator`] backend for naming and
//! type mapping, then rendered through a template set scope by scope. The
//! files a run produces are recorded in the output directory so later runs
//! can remove what they no longer generate.

pub mod backends;
pub mod builder;
pub mod code_type;
pub mod errors;
pub mod ir;
pub mod metadata;
pub mod orchestrator;
pub mod registry;
pub mod traits;
pub mod types;

pub use builder::build_template_data;
pub use code_type::{CodeType, CodeTypeKind};
pub use errors::*;
pub use ir::DocumentModel;
pub use orchestrator::*;
pub use registry::GeneratorRegistry;
pub use traits::*;
pub use types::*;
