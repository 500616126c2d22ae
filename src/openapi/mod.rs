//! OpenAPI document model and the schema graph operations built on it.

pub mod compare;
pub mod document;
pub mod loader;
pub mod merge;
pub mod schema;
pub mod visit;

pub use compare::{content_hash, schemas_equal, SchemaComparator};
pub use document::{
    Callback, Components, Contact, Document, ExternalDocs, Header, HttpMethod, Info, License,
    MediaType, Operation, Parameter, ParameterLocation, PathItem, RefOr, RequestBody, Response,
    SecurityScheme, Server, Tag,
};
pub use loader::{load_document, parse_document, render_document, write_document, Format};
pub use merge::{merge_schema, merge_schema_refs};
pub use schema::{AdditionalProperties, Schema, SchemaRef, TypeSet, SCHEMA_REF_PREFIX};
