//! Repairs for commonly seen defects in published documents.

use serde_json::Number;
use tracing::trace;

use super::{simplify, tags, BuiltinPatch};
use crate::core::error::Result;
use crate::openapi::Document;
use crate::patch::PatchConfig;

const INT32_MAX: i64 = 2_147_483_647;

/// Clamps `maximum` on integer properties of component schemas to the int32
/// range.
pub fn fix_invalid_max_value(doc: &mut Document, _config: &PatchConfig) -> Result<()> {
    for (name, slot) in doc.components.schemas.iter_mut() {
        let Some(schema) = slot.as_inline_mut() else {
            continue;
        };
        for (property, prop_slot) in schema.properties.iter_mut() {
            let Some(prop) = prop_slot.as_inline_mut() else {
                continue;
            };
            if !prop.schema_type.contains("integer") {
                continue;
            }
            let out_of_range = prop
                .maximum
                .as_ref()
                .and_then(Number::as_f64)
                .is_some_and(|max| max > INT32_MAX as f64);
            if out_of_range {
                trace!(schema = %name, property = %property, "Fixing maximum value for integer");
                prop.maximum = Some(Number::from(INT32_MAX));
            }
        }
    }
    Ok(())
}

/// Titles every component schema without one after its key.
pub fn fix_missing_schema_title(doc: &mut Document, _config: &PatchConfig) -> Result<()> {
    for (name, slot) in doc.components.schemas.iter_mut() {
        if let Some(schema) = slot.as_inline_mut() {
            if schema.title.as_deref().is_none_or(str::is_empty) {
                trace!(schema = %name, "Missing schema title, setting to schema key");
                schema.title = Some(name.clone());
            }
        }
    }
    Ok(())
}

/// The usual fixes in one step.
pub fn fix_common(doc: &mut Document, config: &PatchConfig) -> Result<()> {
    fix_invalid_max_value(doc, config)?;
    tags::fix_operation_tags(doc, config)?;
    simplify::simplify_polymorphic_booleans(doc, config)
}

fn set_version(doc: &mut Document, version: &str) -> Result<()> {
    doc.openapi = version.to_string();
    Ok(())
}

macro_rules! oas_version_patches {
    ($($id:literal => $version:literal),* $(,)?) => {
        vec![$(
            BuiltinPatch {
                id: $id,
                description: concat!(
                    "Fixes specs authored in OpenAPI ",
                    $version,
                    " format but mistakenly labeled as a different version, without converting schema content."
                ),
                affects_codegen: false,
                apply: |doc, _| set_version(doc, $version),
            },
        )*]
    };
}

pub(super) fn patches() -> Vec<BuiltinPatch> {
    let mut patches = vec![
        BuiltinPatch {
            id: "fix-common",
            description: "Applies fix-invalid-max-value, fix-operation-tags and simplify-polymorphic-booleans",
            affects_codegen: true,
            apply: fix_common,
        },
        BuiltinPatch {
            id: "fix-invalid-max-value",
            description: "Fixes integer and long schemas where the maximum value is out of bounds for the type",
            affects_codegen: false,
            apply: fix_invalid_max_value,
        },
        BuiltinPatch {
            id: "fix-missing-schema-title",
            description: "Adds a title to all schemas that are missing a title",
            affects_codegen: true,
            apply: fix_missing_schema_title,
        },
    ];
    patches.extend(oas_version_patches![
        "fix-oas-300-version" => "3.0.0",
        "fix-oas-301-version" => "3.0.1",
        "fix-oas-302-version" => "3.0.2",
        "fix-oas-303-version" => "3.0.3",
        "fix-oas-304-version" => "3.0.4",
        "fix-oas-310-version" => "3.1.0",
        "fix-oas-311-version" => "3.1.1",
    ]);
    patches
}
