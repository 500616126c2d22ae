//! specweave merges, patches and flattens OpenAPI documents, then renders
//! them into client code for several languages through scoped templates.
#![deny(unsafe_code)]

pub mod application;
pub mod builtin;
pub mod core;
pub mod generation;
pub mod merge;
pub mod openapi;
pub mod patch;
pub mod templates;
