//! Application layer - orchestrates use cases and coordinates between domains

pub mod dto;
pub mod errors;
pub mod pipeline;
pub mod traits;

pub use dto::*;
pub use errors::*;
pub use pipeline::PipelineUseCase;
pub use traits::*;
