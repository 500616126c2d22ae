//! Shared building blocks: the error type, pipeline configuration and
//! string helpers used by transforms and generators.

pub mod config;
pub mod error;
pub mod utils;

pub use config::{GeneratorConfig, InfoSeed, PipelineConfig};
pub use error::{Error, Result};
