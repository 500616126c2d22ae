//! Named presets that expand into ordered builtin patches.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::patch::{PatchConfig, SpecPatch};

/// A reference to a preset plus per-patch configuration keyed by builtin id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatchSet {
    pub id: String,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub config: IndexMap<String, PatchConfig>,
}

impl PatchSet {
    pub fn new(id: &str) -> Self {
        PatchSet {
            id: id.to_string(),
            config: IndexMap::new(),
        }
    }
}

/// A preset: id, description and the builtins it expands to.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PatchSetPreset {
    pub id: &'static str,
    pub description: &'static str,
    pub patches: &'static [&'static str],
}

pub const PRESETS: &[PatchSetPreset] = &[PatchSetPreset {
    id: "code-generation",
    description: "Prepares a document for code generation",
    patches: &[
        "prune-path-prefix",
        "generate-operation-id",
        "simplify-polymorphic-schemas",
        "flatten-components",
        "fix-missing-schema-title",
        "fix-common",
    ],
}];

pub fn find_preset(id: &str) -> Option<&'static PatchSetPreset> {
    PRESETS.iter().find(|p| p.id == id)
}

/// Expands every known set, in order. Unknown set ids are skipped with a
/// warning.
pub fn resolve_patch_sets(sets: &[PatchSet]) -> Vec<SpecPatch> {
    let mut patches = Vec::new();
    for set in sets {
        let Some(preset) = find_preset(&set.id) else {
            warn!(patch_set = %set.id, "Unknown patch set, skipping");
            continue;
        };
        patches.extend(preset.patches.iter().map(|id| {
            let config = set.config.get(*id).cloned().unwrap_or_default();
            SpecPatch::builtin(id).with_config(config)
        }));
    }
    patches
}
