//! Builtin transforms addressable as `builtin:<id>` patches.
//!
//! Each builtin mutates the typed document in place and receives the patch's
//! free-form configuration. The registry is built once and shared.

pub mod fix;
pub mod flatten;
pub mod operation_id;
pub mod paths;
pub mod sets;
pub mod simplify;
pub mod tags;

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use serde::Serialize;
use serde_json::Value;

use crate::core::error::{Error, Result};
use crate::openapi::Document;
use crate::patch::PatchConfig;

pub use sets::{resolve_patch_sets, PatchSet};

pub type BuiltinFn = fn(&mut Document, &PatchConfig) -> Result<()>;

/// A named in-process document transform.
#[derive(Clone, Serialize)]
pub struct BuiltinPatch {
    pub id: &'static str,
    pub description: &'static str,
    /// Needed before code generation can consume the document.
    pub affects_codegen: bool,
    #[serde(skip)]
    pub apply: BuiltinFn,
}

impl std::fmt::Debug for BuiltinPatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuiltinPatch")
            .field("id", &self.id)
            .field("affects_codegen", &self.affects_codegen)
            .finish()
    }
}

/// Builtins keyed by id, in registration order.
#[derive(Debug, Default)]
pub struct BuiltinRegistry {
    patches: IndexMap<&'static str, BuiltinPatch>,
}

impl BuiltinRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every builtin shipped with the crate.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for patch in fix::patches()
            .into_iter()
            .chain(simplify::patches())
            .chain(flatten::patches())
            .chain(paths::patches())
            .chain(tags::patches())
            .chain(operation_id::patches())
        {
            registry.register(patch);
        }
        registry
    }

    pub fn register(&mut self, patch: BuiltinPatch) {
        self.patches.insert(patch.id, patch);
    }

    pub fn get(&self, id: &str) -> Option<&BuiltinPatch> {
        self.patches.get(id)
    }

    pub fn has_patch(&self, id: &str) -> bool {
        self.patches.contains_key(id)
    }

    pub fn list(&self) -> impl Iterator<Item = &BuiltinPatch> {
        self.patches.values()
    }
}

static REGISTRY: Lazy<BuiltinRegistry> = Lazy::new(BuiltinRegistry::with_defaults);

/// The shared default registry.
pub fn registry() -> &'static BuiltinRegistry {
    &REGISTRY
}

/// Required string value from a patch config.
pub fn get_string_config(config: &PatchConfig, key: &str) -> Result<String> {
    match config.get(key) {
        None => Err(Error::config(format!("missing config key: {key}"))),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(Error::config(format!("config key \"{key}\" must be a string"))),
    }
}

pub fn get_optional_string_config(config: &PatchConfig, key: &str) -> Option<String> {
    config.get(key).and_then(Value::as_str).map(str::to_string)
}

pub fn get_optional_bool_config(config: &PatchConfig, key: &str) -> Option<bool> {
    config.get(key).and_then(Value::as_bool)
}
