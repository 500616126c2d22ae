//! Deep merge of two schema nodes with asymmetric override rules.
//!
//! Singleton keywords keep the base value, descriptions concatenate, lists
//! append, and properties from the override replace same-named ones.
//! Composition branches are folded in by copying their properties.

use std::collections::HashSet;

use indexmap::IndexMap;
use tracing::trace;

use super::schema::{Schema, SchemaRef};
use crate::core::error::{Error, Result};

/// Merges `over` into `base`. Both slots must be inline.
pub fn merge_schema_refs(
    base: &mut SchemaRef,
    over: &SchemaRef,
    schemas: &IndexMap<String, SchemaRef>,
) -> Result<()> {
    let over = over.as_inline().ok_or_else(|| {
        Error::precondition(format!(
            "cannot merge from reference {}",
            over.ref_name().unwrap_or_default()
        ))
    })?;
    let base = base
        .as_inline_mut()
        .ok_or_else(|| Error::precondition("cannot merge into a reference schema"))?;
    merge_schema(base, over, schemas);
    Ok(())
}

macro_rules! keep_base {
    ($base:ident, $over:ident, $($field:ident),+ $(,)?) => {
        $(
            if $base.$field.is_none() {
                $base.$field = $over.$field.clone();
            }
        )+
    };
}

/// Merges `over` into `base` in place. An empty override is a no-op.
pub fn merge_schema(base: &mut Schema, over: &Schema, schemas: &IndexMap<String, SchemaRef>) {
    if over.is_empty() {
        return;
    }

    keep_base!(
        base,
        over,
        format,
        pattern,
        title,
        maximum,
        minimum,
        exclusive_maximum,
        exclusive_minimum,
        multiple_of,
        max_length,
        min_length,
        max_items,
        min_items,
        unique_items,
        max_properties,
        min_properties,
        default,
        const_value,
        nullable,
        read_only,
        write_only,
        xml,
        external_docs,
        example,
        deprecated,
        items,
        additional_properties,
        not,
        discriminator,
    );

    base.description = match (base.description.take(), over.description.as_ref()) {
        (Some(b), Some(o)) => Some(format!("{b}\n{o}")),
        (b, o) => b.or_else(|| o.cloned()),
    };

    base.schema_type.0.extend(over.schema_type.0.iter().cloned());
    base.required.extend(over.required.iter().cloned());
    base.enum_values.extend(over.enum_values.iter().cloned());
    base.examples.extend(over.examples.iter().cloned());

    for (name, property) in &over.properties {
        base.properties.insert(name.clone(), property.clone());
    }
    for (key, value) in &over.extensions {
        base.extensions
            .entry(key.clone())
            .or_insert_with(|| value.clone());
    }

    let mut visited = HashSet::new();
    for branch in &over.all_of {
        copy_branch_properties(base, branch, schemas, &mut visited);
    }

    let own_branches: Vec<SchemaRef> = base
        .any_of
        .iter()
        .chain(base.one_of.iter())
        .cloned()
        .collect();
    for branch in &own_branches {
        copy_branch_properties(base, branch, schemas, &mut visited);
    }
}

/// Copies properties of a composition branch into `base` without replacing
/// existing keys. Nested `allOf` chains are followed; each referenced
/// component is visited once.
fn copy_branch_properties(
    base: &mut Schema,
    branch: &SchemaRef,
    schemas: &IndexMap<String, SchemaRef>,
    visited: &mut HashSet<String>,
) {
    if let Some(name) = branch.ref_name() {
        if !visited.insert(name.to_string()) {
            trace!(schema = name, "Skipping already merged branch");
            return;
        }
    }
    let Some(source) = branch.resolve(schemas) else {
        return;
    };
    for (name, property) in &source.properties {
        if !base.properties.contains_key(name) {
            base.properties.insert(name.clone(), property.clone());
        }
    }
    for nested in &source.all_of {
        copy_branch_properties(base, nested, schemas, visited);
    }
}
