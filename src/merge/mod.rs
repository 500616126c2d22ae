//! Folding several OpenAPI documents into one.
//!
//! Documents are merged left to right into an accumulator. Info fields are
//! concatenated with labels derived from the incoming document's title,
//! servers and tags are appended, and keyed collections are merged key by key.
//!
//! Collision policy:
//! - identical entries are reused silently;
//! - a different schema under an existing name is renamed to
//!   `<Name><hash6>` and the incoming document's references follow it;
//! - a different path or non-schema component keeps the first writer and is
//!   recorded in the [`MergeReport`].

mod info;

use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, error, info};

use crate::core::error::{Error, Result};
use crate::openapi::loader::normalize;
use crate::openapi::visit::rewrite_schema_refs;
use crate::openapi::{content_hash, Document, SchemaComparator};

pub use info::{append_or_set, merge_info};

/// A keyed entry that could not be merged and was dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Collision {
    /// Collection the key belongs to, e.g. `paths` or `responses`.
    pub collection: String,
    pub key: String,
    /// Title of the document whose entry was dropped.
    pub source: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct MergeReport {
    pub collisions: Vec<Collision>,
    /// `(original, renamed)` schema names taken from incoming documents.
    pub renamed_schemas: Vec<(String, String)>,
}

impl MergeReport {
    pub fn has_collisions(&self) -> bool {
        !self.collisions.is_empty()
    }
}

/// Result of a merge: the folded document and what happened on the way.
#[derive(Debug, Clone)]
pub struct MergeOutcome {
    pub document: Document,
    pub report: MergeReport,
}

/// Merges `documents` into `seed`, or into the first document when no seed
/// is given.
pub fn merge_documents(documents: &[Document], seed: Option<Document>) -> Result<MergeOutcome> {
    let mut report = MergeReport::default();
    let (mut acc, rest) = match seed {
        Some(seed) => (seed, documents),
        None => match documents.split_first() {
            Some((first, rest)) => (first.clone(), rest),
            None => return Err(Error::merge("no documents to merge")),
        },
    };

    for doc in rest {
        merge_into(&mut acc, doc, &mut report)?;
        acc = normalize(&acc)?;
    }

    info!(
        documents = documents.len(),
        collisions = report.collisions.len(),
        renamed = report.renamed_schemas.len(),
        "Merged documents"
    );
    Ok(MergeOutcome {
        document: acc,
        report,
    })
}

fn version_line(version: &str) -> String {
    version.split('.').take(2).collect::<Vec<_>>().join(".")
}

fn merge_into(acc: &mut Document, doc: &Document, report: &mut MergeReport) -> Result<()> {
    let title = doc.info.title.clone();
    debug!(title = %title, "Merging document");

    if acc.openapi.is_empty() {
        acc.openapi = doc.openapi.clone();
    } else if !doc.openapi.is_empty() && version_line(&acc.openapi) != version_line(&doc.openapi) {
        return Err(Error::merge(format!(
            "cannot merge OpenAPI {} document \"{}\" into OpenAPI {} document",
            doc.openapi, title, acc.openapi
        )));
    }

    let incoming = rename_conflicting_schemas(acc, doc, report);

    merge_info(&mut acc.info, &incoming.info);
    acc.servers.extend(incoming.servers.iter().cloned());
    acc.tags.extend(incoming.tags.iter().cloned());
    for requirement in &incoming.security {
        if !acc.security.contains(requirement) {
            acc.security.push(requirement.clone());
        }
    }
    if acc.external_docs.is_none() {
        acc.external_docs = incoming.external_docs.clone();
    }
    for (key, value) in &incoming.extensions {
        acc.extensions
            .entry(key.clone())
            .or_insert_with(|| value.clone());
    }

    merge_keyed(&mut acc.paths, &incoming.paths, "paths", &title, report);
    merge_keyed(&mut acc.webhooks, &incoming.webhooks, "webhooks", &title, report);

    let (dest, src) = (&mut acc.components, &incoming.components);
    merge_keyed(&mut dest.schemas, &src.schemas, "schemas", &title, report);
    merge_keyed(
        &mut dest.security_schemes,
        &src.security_schemes,
        "securitySchemes",
        &title,
        report,
    );
    merge_keyed(&mut dest.responses, &src.responses, "responses", &title, report);
    merge_keyed(&mut dest.parameters, &src.parameters, "parameters", &title, report);
    merge_keyed(&mut dest.examples, &src.examples, "examples", &title, report);
    merge_keyed(
        &mut dest.request_bodies,
        &src.request_bodies,
        "requestBodies",
        &title,
        report,
    );
    merge_keyed(&mut dest.headers, &src.headers, "headers", &title, report);
    merge_keyed(&mut dest.links, &src.links, "links", &title, report);
    merge_keyed(&mut dest.callbacks, &src.callbacks, "callbacks", &title, report);
    merge_keyed(&mut dest.path_items, &src.path_items, "pathItems", &title, report);
    Ok(())
}

/// Returns a copy of `doc` where every schema that clashes with a different
/// schema of the same name in `acc` is renamed, and references follow.
/// Structurally identical schemas keep their name and are deduplicated later.
fn rename_conflicting_schemas(acc: &Document, doc: &Document, report: &mut MergeReport) -> Document {
    let mut renames: IndexMap<String, String> = IndexMap::new();
    {
        let mut comparator =
            SchemaComparator::new(&acc.components.schemas, &doc.components.schemas);
        for (name, slot) in &doc.components.schemas {
            let Some(existing) = acc.components.schemas.get(name) else {
                continue;
            };
            if comparator.equal(existing, slot) {
                continue;
            }
            let renamed = format!("{}{}", name, content_hash(slot));
            debug!(schema = %name, renamed = %renamed, "Renaming conflicting schema");
            renames.insert(name.clone(), renamed);
        }
    }
    if renames.is_empty() {
        return doc.clone();
    }

    let mut incoming = doc.clone();
    rewrite_schema_refs(&mut incoming, &renames);
    incoming.components.schemas = incoming
        .components
        .schemas
        .into_iter()
        .map(|(name, slot)| match renames.get(&name) {
            Some(renamed) => (renamed.clone(), slot),
            None => (name, slot),
        })
        .collect();
    report.renamed_schemas.extend(renames);
    incoming
}

fn merge_keyed<T: Clone + PartialEq>(
    dest: &mut IndexMap<String, T>,
    src: &IndexMap<String, T>,
    collection: &str,
    source: &str,
    report: &mut MergeReport,
) {
    for (key, value) in src {
        match dest.get(key) {
            None => {
                dest.insert(key.clone(), value.clone());
            }
            Some(existing) if existing == value => {}
            Some(_) => {
                error!(
                    collection,
                    key = %key,
                    source,
                    "Collision while merging, keeping the existing entry"
                );
                report.collisions.push(Collision {
                    collection: collection.to_string(),
                    key: key.clone(),
                    source: source.to_string(),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::openapi::parse_document;
    use tracing_test::traced_test;

    fn doc(yaml: &str) -> Document {
        parse_document(yaml.as_bytes()).unwrap()
    }

    fn api_a() -> Document {
        doc(r##"
openapi: 3.0.3
info: {title: API A, version: "1.0", description: first}
servers: [{url: "https://a.example.com"}]
paths:
  /shared:
    get: {operationId: sharedA, responses: {"200": {description: from a}}}
  /a:
    get: {operationId: onlyA, responses: {"200": {description: ok}}}
components:
  schemas:
    Pet: {type: object, properties: {id: {type: string}}}
    Error: {type: object, properties: {code: {type: integer}}}
"##)
    }

    fn api_b() -> Document {
        doc(r##"
openapi: 3.0.0
info: {title: API B, version: "2.0", description: second}
servers: [{url: "https://b.example.com"}]
paths:
  /shared:
    get: {operationId: sharedB, responses: {"200": {description: from b}}}
  /b:
    get:
      operationId: onlyB
      responses:
        "200":
          description: ok
          content:
            application/json:
              schema: {$ref: "#/components/schemas/Pet"}
components:
  schemas:
    Pet: {type: object, properties: {name: {type: string}}}
    Error: {type: object, properties: {code: {type: integer}}}
"##)
    }

    #[test]
    #[traced_test]
    fn test_merge_titles_and_path_collision() {
        let outcome = merge_documents(&[api_a(), api_b()], None).unwrap();
        let merged = outcome.document;

        assert_eq!(merged.info.title, "API A, API B");
        assert_eq!(merged.info.version, "1.0\n(API B) 2.0");
        assert_eq!(
            merged.info.description.as_deref(),
            Some("first\n\n# API B\n\nsecond")
        );
        assert_eq!(merged.servers.len(), 2);

        let shared = merged.paths["/shared"].get.as_ref().unwrap();
        assert_eq!(shared.operation_id, "sharedA");
        assert!(merged.paths.contains_key("/a") && merged.paths.contains_key("/b"));

        assert_eq!(outcome.report.collisions.len(), 1);
        assert_eq!(outcome.report.collisions[0].collection, "paths");
        assert_eq!(outcome.report.collisions[0].source, "API B");
        assert!(logs_contain("Collision while merging"));
    }

    #[test]
    fn test_conflicting_schema_renamed_and_references_follow() {
        let outcome = merge_documents(&[api_a(), api_b()], None).unwrap();
        let merged = outcome.document;

        assert_eq!(outcome.report.renamed_schemas.len(), 1);
        let (original, renamed) = &outcome.report.renamed_schemas[0];
        assert_eq!(original, "Pet");
        assert!(renamed.starts_with("Pet") && renamed.len() == 9);
        assert!(merged.components.schemas.contains_key(renamed));

        let op = merged.paths["/b"].get.as_ref().unwrap();
        let schema = op.responses["200"].as_item().unwrap().content["application/json"]
            .schema
            .as_ref()
            .unwrap();
        assert_eq!(schema.ref_name(), Some(renamed.as_str()));

        // identical schema reused, not duplicated
        assert_eq!(merged.components.schemas.len(), 3);
    }

    #[test]
    fn test_empty_seed_adopts_first_document() {
        let outcome = merge_documents(&[api_a()], Some(Document::empty())).unwrap();
        assert_eq!(outcome.document.openapi, "3.0.3");
        assert_eq!(outcome.document.info.title, "API A");
        assert!(!outcome.report.has_collisions());
    }

    #[test]
    fn test_disjoint_merge_is_associative() {
        let a = doc("openapi: 3.0.0\ninfo: {title: A, version: '1'}\npaths: {/a: {}}\n");
        let b = doc("openapi: 3.0.0\ninfo: {title: B, version: '1'}\npaths: {/b: {}}\n");
        let c = doc("openapi: 3.0.0\ninfo: {title: C, version: '1'}\npaths: {/c: {}}\n");

        let left = merge_documents(&[a.clone(), b.clone()], None).unwrap().document;
        let left = merge_documents(&[left, c.clone()], None).unwrap().document;
        let bc = merge_documents(&[b, c], None).unwrap().document;
        let right = merge_documents(&[a, bc], None).unwrap().document;

        assert_eq!(
            left.paths.keys().collect::<Vec<_>>(),
            right.paths.keys().collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_version_mismatch_rejected() {
        let v31 = doc("openapi: 3.1.0\ninfo: {title: New, version: '1'}\npaths: {}\n");
        let err = merge_documents(&[api_a(), v31], None).unwrap_err();
        assert!(matches!(err, Error::Merge(_)));
    }

    #[test]
    fn test_no_documents_is_an_error() {
        assert!(merge_documents(&[], None).is_err());
    }
}
