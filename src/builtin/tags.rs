//! Tag maintenance on documents and operations.

use std::collections::HashSet;

use tracing::{trace, warn};

use super::{get_string_config, BuiltinPatch};
use crate::core::error::Result;
use crate::openapi::{Document, Tag};
use crate::patch::PatchConfig;

pub const DEFAULT_TAG: &str = "default";

/// Gives untagged operations the `default` tag and declares every tag used
/// by an operation at document level.
pub fn fix_operation_tags(doc: &mut Document, _config: &PatchConfig) -> Result<()> {
    let mut documented: HashSet<String> = doc.tags.iter().map(|t| t.name.clone()).collect();
    let mut added = Vec::new();

    doc.for_each_operation_mut(|path, method, op| {
        if op.tags.is_empty() {
            trace!(path = %format!("{method} {path}"), "Operation is missing tags, adding default tag");
            op.tags.push(DEFAULT_TAG.to_string());
            return;
        }
        for tag in &op.tags {
            if documented.insert(tag.clone()) {
                trace!(path = %format!("{method} {path}"), tag = %tag, "Tag is not documented, adding to document");
                added.push(Tag::new(tag, None));
            }
        }
    });
    doc.tags.extend(added);
    Ok(())
}

pub fn prune_document_tags(doc: &mut Document, _config: &PatchConfig) -> Result<()> {
    doc.tags.clear();
    Ok(())
}

pub fn prune_operation_tags(doc: &mut Document, _config: &PatchConfig) -> Result<()> {
    doc.for_each_operation_mut(|_, _, op| op.tags.clear());
    Ok(())
}

pub fn prune_operation_tags_keep_first(doc: &mut Document, _config: &PatchConfig) -> Result<()> {
    doc.for_each_operation_mut(|_, _, op| op.tags.truncate(1));
    Ok(())
}

/// Replaces every tag with a single tag named after the document title.
/// Meant to run on each input before merging.
pub fn generate_tag_from_doc_title(doc: &mut Document, config: &PatchConfig) -> Result<()> {
    prune_document_tags(doc, config)?;
    prune_operation_tags(doc, config)?;

    let title = if doc.info.title.is_empty() {
        DEFAULT_TAG.to_string()
    } else {
        doc.info.title.clone()
    };
    doc.tags.push(Tag::new(&title, Some("See document description")));

    doc.for_each_operation_mut(|path, method, op| {
        if op.tags.is_empty() {
            trace!(path = %format!("{method} {path}"), tag = %title, "Setting document title tag");
            op.tags.push(title.clone());
        } else {
            warn!(tags = ?op.tags, "Found non-empty operation tags");
        }
    });
    Ok(())
}

/// Config: `tag`.
pub fn set_operation_tag(doc: &mut Document, config: &PatchConfig) -> Result<()> {
    let tag = get_string_config(config, "tag")?;
    doc.for_each_operation_mut(|_, _, op| op.tags = vec![tag.clone()]);
    Ok(())
}

pub(super) fn patches() -> Vec<BuiltinPatch> {
    vec![
        BuiltinPatch {
            id: "fix-operation-tags",
            description: "Ensures all operations have at least one tag, and that tags are documented in the document",
            affects_codegen: true,
            apply: fix_operation_tags,
        },
        BuiltinPatch {
            id: "generate-tag-from-doc-title",
            description: "Removes all tags and creates one tag based on the document title, useful when merging multiple specs",
            affects_codegen: false,
            apply: generate_tag_from_doc_title,
        },
        BuiltinPatch {
            id: "prune-document-tags",
            description: "Removes all tags from the document",
            affects_codegen: false,
            apply: prune_document_tags,
        },
        BuiltinPatch {
            id: "prune-operation-tags",
            description: "Removes all tags from operations",
            affects_codegen: false,
            apply: prune_operation_tags,
        },
        BuiltinPatch {
            id: "prune-operation-tags-keep-first",
            description: "Removes all tags from operations except the first one",
            affects_codegen: false,
            apply: prune_operation_tags_keep_first,
        },
        BuiltinPatch {
            id: "set-operation-tag",
            description: "Sets a tag for all operations in the document",
            affects_codegen: false,
            apply: set_operation_tag,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::openapi::parse_document;
    use serde_json::json;

    fn doc() -> Document {
        parse_document(
            br#"
openapi: 3.0.3
info: {title: Pet Store, version: "1"}
tags:
  - name: pets
paths:
  /pets:
    get: {tags: [pets, store], responses: {}}
    post: {responses: {}}
"#,
        )
        .unwrap()
    }

    fn op_tags(doc: &Document) -> Vec<Vec<String>> {
        doc.operations().map(|(_, _, op)| op.tags.clone()).collect()
    }

    #[test]
    fn test_fix_operation_tags() {
        let mut doc = doc();
        fix_operation_tags(&mut doc, &PatchConfig::new()).unwrap();
        assert_eq!(op_tags(&doc), vec![vec!["pets", "store"], vec!["default"]]);
        let names: Vec<_> = doc.tags.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["pets", "store"]);
    }

    #[test]
    fn test_generate_tag_from_doc_title() {
        let mut doc = doc();
        generate_tag_from_doc_title(&mut doc, &PatchConfig::new()).unwrap();
        assert_eq!(doc.tags.len(), 1);
        assert_eq!(doc.tags[0].name, "Pet Store");
        assert_eq!(doc.tags[0].description.as_deref(), Some("See document description"));
        assert_eq!(op_tags(&doc), vec![vec!["Pet Store"], vec!["Pet Store"]]);
    }

    #[test]
    fn test_generate_tag_defaults_without_title() {
        let mut doc = doc();
        doc.info.title.clear();
        generate_tag_from_doc_title(&mut doc, &PatchConfig::new()).unwrap();
        assert_eq!(doc.tags[0].name, "default");
    }

    #[test]
    fn test_prune_tags() {
        let mut doc = doc();
        prune_operation_tags_keep_first(&mut doc, &PatchConfig::new()).unwrap();
        assert_eq!(op_tags(&doc), vec![vec!["pets"], vec![]]);

        prune_operation_tags(&mut doc, &PatchConfig::new()).unwrap();
        prune_document_tags(&mut doc, &PatchConfig::new()).unwrap();
        assert!(op_tags(&doc).iter().all(Vec::is_empty));
        assert!(doc.tags.is_empty());
    }

    #[test]
    fn test_set_operation_tag_requires_config() {
        let mut doc = doc();
        assert!(set_operation_tag(&mut doc, &PatchConfig::new()).is_err());

        let mut config = PatchConfig::new();
        config.insert("tag".into(), json!("api"));
        set_operation_tag(&mut doc, &config).unwrap();
        assert_eq!(op_tags(&doc), vec![vec!["api"], vec!["api"]]);
    }
}
