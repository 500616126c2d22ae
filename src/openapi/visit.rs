//! Walking every schema slot of a document.
//!
//! The visitor sees a slot before its children, so it may replace an inline
//! node with a reference and the walk will not descend into the removed node.

use indexmap::IndexMap;

use super::document::{Document, MediaType, Operation, PathItem, RefOr};
use super::schema::{SchemaRef, SCHEMA_REF_PREFIX};

pub type SlotVisitor<'v> = dyn FnMut(&mut SchemaRef) + 'v;

/// Visits `slot` and, when it is still inline afterwards, every nested slot.
pub fn walk_schema_mut(slot: &mut SchemaRef, visit: &mut SlotVisitor<'_>) {
    visit(slot);
    let Some(schema) = slot.as_inline_mut() else {
        return;
    };
    for child in schema.properties.values_mut() {
        walk_schema_mut(child, visit);
    }
    if let Some(items) = schema.items.as_mut() {
        walk_schema_mut(items, visit);
    }
    if let Some(extra) = schema
        .additional_properties
        .as_mut()
        .and_then(|a| a.schema_mut())
    {
        walk_schema_mut(extra, visit);
    }
    for branch in schema
        .all_of
        .iter_mut()
        .chain(schema.any_of.iter_mut())
        .chain(schema.one_of.iter_mut())
    {
        walk_schema_mut(branch, visit);
    }
    if let Some(not) = schema.not.as_mut() {
        walk_schema_mut(not, visit);
    }
}

fn walk_content(content: &mut IndexMap<String, MediaType>, visit: &mut SlotVisitor<'_>) {
    for media in content.values_mut() {
        if let Some(schema) = media.schema.as_mut() {
            walk_schema_mut(schema, visit);
        }
    }
}

fn walk_operation(op: &mut Operation, visit: &mut SlotVisitor<'_>) {
    for param in op.parameters.iter_mut().filter_map(RefOr::as_item_mut) {
        if let Some(schema) = param.schema.as_mut() {
            walk_schema_mut(schema, visit);
        }
        walk_content(&mut param.content, visit);
    }
    if let Some(body) = op.request_body.as_mut().and_then(RefOr::as_item_mut) {
        walk_content(&mut body.content, visit);
    }
    for response in op.responses.values_mut().filter_map(RefOr::as_item_mut) {
        for header in response.headers.values_mut().filter_map(RefOr::as_item_mut) {
            if let Some(schema) = header.schema.as_mut() {
                walk_schema_mut(schema, visit);
            }
        }
        walk_content(&mut response.content, visit);
    }
    for callback in op.callbacks.values_mut().filter_map(RefOr::as_item_mut) {
        for item in callback.values_mut() {
            walk_path_item(item, visit);
        }
    }
}

fn walk_path_item(item: &mut PathItem, visit: &mut SlotVisitor<'_>) {
    for param in item.parameters.iter_mut().filter_map(RefOr::as_item_mut) {
        if let Some(schema) = param.schema.as_mut() {
            walk_schema_mut(schema, visit);
        }
        walk_content(&mut param.content, visit);
    }
    for (_, op) in item.operations_mut() {
        walk_operation(op, visit);
    }
}

/// Visits every schema slot reachable from the document: component tables,
/// paths, webhooks and callbacks.
pub fn walk_document_mut(doc: &mut Document, visit: &mut SlotVisitor<'_>) {
    let components = &mut doc.components;
    for slot in components.schemas.values_mut() {
        walk_schema_mut(slot, visit);
    }
    for param in components.parameters.values_mut().filter_map(RefOr::as_item_mut) {
        if let Some(schema) = param.schema.as_mut() {
            walk_schema_mut(schema, visit);
        }
        walk_content(&mut param.content, visit);
    }
    for body in components
        .request_bodies
        .values_mut()
        .filter_map(RefOr::as_item_mut)
    {
        walk_content(&mut body.content, visit);
    }
    for response in components.responses.values_mut().filter_map(RefOr::as_item_mut) {
        walk_content(&mut response.content, visit);
    }
    for header in components.headers.values_mut().filter_map(RefOr::as_item_mut) {
        if let Some(schema) = header.schema.as_mut() {
            walk_schema_mut(schema, visit);
        }
    }
    for callback in components.callbacks.values_mut().filter_map(RefOr::as_item_mut) {
        for item in callback.values_mut() {
            walk_path_item(item, visit);
        }
    }
    for item in components.path_items.values_mut() {
        walk_path_item(item, visit);
    }
    for item in doc.paths.values_mut().chain(doc.webhooks.values_mut()) {
        walk_path_item(item, visit);
    }
}

/// Follows a rename chain `a -> b -> c` to its final name.
pub fn final_name<'a>(renames: &'a IndexMap<String, String>, name: &'a str) -> &'a str {
    let mut current = name;
    for _ in 0..=renames.len() {
        match renames.get(current) {
            Some(next) if next != current => current = next,
            _ => break,
        }
    }
    current
}

/// Rewrites every `#/components/schemas/<old>` reference to its renamed
/// target. Chains are followed to the end.
pub fn rewrite_schema_refs(doc: &mut Document, renames: &IndexMap<String, String>) {
    if renames.is_empty() {
        return;
    }
    walk_document_mut(doc, &mut |slot| rewrite_slot(slot, renames));
}

/// Same as [`rewrite_schema_refs`] for a single slot tree.
pub fn rewrite_slot_refs(slot: &mut SchemaRef, renames: &IndexMap<String, String>) {
    walk_schema_mut(slot, &mut |s| rewrite_slot(s, renames));
}

fn rewrite_slot(slot: &mut SchemaRef, renames: &IndexMap<String, String>) {
    if let SchemaRef::Reference { reference } = slot {
        if let Some(name) = reference.strip_prefix(SCHEMA_REF_PREFIX) {
            let target = final_name(renames, name).to_string();
            if target != name {
                *reference = format!("{SCHEMA_REF_PREFIX}{target}");
            }
        }
    }
}

/// Names of every component schema referenced anywhere in the document.
pub fn referenced_schema_names(doc: &mut Document) -> Vec<String> {
    let mut names = Vec::new();
    walk_document_mut(doc, &mut |slot| {
        if let Some(name) = slot.ref_name() {
            if !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
        }
    });
    names
}
