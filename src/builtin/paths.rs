//! Path, server and component-name refactorings.

use indexmap::IndexMap;
use tracing::{debug, trace};

use super::{get_optional_string_config, get_string_config, BuiltinPatch};
use crate::core::error::Result;
use crate::openapi::visit::rewrite_schema_refs;
use crate::openapi::{
    Document, HttpMethod, Parameter, ParameterLocation, RefOr, Schema, SchemaRef, Server,
};
use crate::patch::PatchConfig;

pub const IDEMPOTENCY_KEY_HEADER: &str = "Idempotency-Key";

fn rename_paths(doc: &mut Document, rename: impl Fn(&str) -> String) {
    let paths = std::mem::take(&mut doc.paths);
    doc.paths = paths
        .into_iter()
        .map(|(path, item)| (rename(&path), item))
        .collect();
}

/// Drops wildcard paths ending in `/*`.
pub fn prune_invalid_paths(doc: &mut Document, _config: &PatchConfig) -> Result<()> {
    doc.paths.retain(|path, _| {
        let keep = !path.ends_with("/*");
        if !keep {
            debug!(path = %path, "Pruning invalid path");
        }
        keep
    });
    Ok(())
}

/// Drops paths with a segment that starts or ends with `_`.
pub fn prune_unusual_paths(doc: &mut Document, _config: &PatchConfig) -> Result<()> {
    doc.paths.retain(|path, _| {
        let unusual = path
            .split('/')
            .any(|seg| seg.len() > 1 && (seg.starts_with('_') || seg.ends_with('_')));
        if unusual {
            debug!(path = %path, "Pruning unusual path");
        }
        !unusual
    });
    Ok(())
}

/// Config: `prefix`.
pub fn add_path_prefix(doc: &mut Document, config: &PatchConfig) -> Result<()> {
    let prefix = get_string_config(config, "prefix")?;
    rename_paths(doc, |path| format!("{prefix}{path}"));
    Ok(())
}

/// Longest run of leading literal segments shared by every path, leaving at
/// least one segment on each.
pub fn common_path_prefix<S: AsRef<str>>(paths: &[S]) -> String {
    let split: Vec<Vec<&str>> = paths
        .iter()
        .map(|p| p.as_ref().trim_start_matches('/').split('/').collect())
        .collect();
    let Some(first) = split.first() else {
        return String::new();
    };
    let limit = split.iter().map(|segs| segs.len().saturating_sub(1)).min().unwrap_or(0);

    let shared = first
        .iter()
        .take(limit)
        .enumerate()
        .take_while(|(i, seg)| !seg.starts_with('{') && split.iter().all(|s| s[*i] == **seg))
        .count();
    if shared == 0 {
        return String::new();
    }
    format!("/{}", first[..shared].join("/"))
}

/// Strips config `prefix`, or the common path prefix when absent.
pub fn prune_path_prefix(doc: &mut Document, config: &PatchConfig) -> Result<()> {
    let prefix = match get_optional_string_config(config, "prefix") {
        Some(prefix) => prefix,
        None => {
            let keys: Vec<&String> = doc.paths.keys().collect();
            common_path_prefix(&keys)
        }
    };
    if prefix.is_empty() {
        return Ok(());
    }
    debug!(prefix = %prefix, "Pruning path prefix");
    rename_paths(doc, |path| match path.strip_prefix(prefix.as_str()) {
        Some(rest) if rest.is_empty() => "/".to_string(),
        Some(rest) if rest.starts_with('/') => rest.to_string(),
        _ => path.to_string(),
    });
    Ok(())
}

/// Replaces the server list with a single server. Config: `url`.
pub fn set_endpoint(doc: &mut Document, config: &PatchConfig) -> Result<()> {
    let url = get_string_config(config, "url")?;
    doc.servers = vec![Server {
        url,
        ..Default::default()
    }];
    Ok(())
}

/// Adds a required `Idempotency-Key` header to every POST operation.
pub fn add_idempotency_key(doc: &mut Document, _config: &PatchConfig) -> Result<()> {
    doc.for_each_operation_mut(|path, method, op| {
        if method != HttpMethod::Post {
            return;
        }
        trace!(path = %path, "Adding idempotency key as header parameter");
        op.parameters.push(RefOr::Item(Parameter {
            name: IDEMPOTENCY_KEY_HEADER.to_string(),
            location: ParameterLocation::Header,
            description: Some("A unique key to ensure idempotency of the request".to_string()),
            required: true,
            deprecated: false,
            allow_empty_value: None,
            style: None,
            explode: None,
            schema: Some(SchemaRef::from(Schema {
                format: Some("uuid".to_string()),
                ..Schema::of_type("string")
            })),
            content: IndexMap::new(),
            example: None,
            examples: IndexMap::new(),
            extensions: IndexMap::new(),
        }));
    });
    Ok(())
}

/// Prefixes every component schema key and rewrites references. Config:
/// `prefix`.
pub fn add_component_schema_prefix(doc: &mut Document, config: &PatchConfig) -> Result<()> {
    let prefix = get_string_config(config, "prefix")?;
    let schemas = std::mem::take(&mut doc.components.schemas);
    let mut renames = IndexMap::new();
    doc.components.schemas = schemas
        .into_iter()
        .map(|(name, schema)| {
            let renamed = format!("{prefix}{name}");
            renames.insert(name, renamed.clone());
            (renamed, schema)
        })
        .collect();
    trace!(count = renames.len(), "Updating schema references in document");
    rewrite_schema_refs(doc, &renames);
    Ok(())
}

pub(super) fn patches() -> Vec<BuiltinPatch> {
    vec![
        BuiltinPatch {
            id: "prune-invalid-paths",
            description: "Removes all paths that are invalid (e.g. wildcard paths ending in /*)",
            affects_codegen: false,
            apply: prune_invalid_paths,
        },
        BuiltinPatch {
            id: "prune-unusual-paths",
            description: "Removes all paths that are unusual (e.g. segments starting or ending with an underscore)",
            affects_codegen: false,
            apply: prune_unusual_paths,
        },
        BuiltinPatch {
            id: "set-endpoint",
            description: "Replaces the servers of the document with a single endpoint",
            affects_codegen: false,
            apply: set_endpoint,
        },
        BuiltinPatch {
            id: "add-idempotency-key",
            description: "Adds an idempotency key to all POST operations",
            affects_codegen: false,
            apply: add_idempotency_key,
        },
        BuiltinPatch {
            id: "add-path-prefix",
            description: "Adds a prefix to all paths in the document",
            affects_codegen: false,
            apply: add_path_prefix,
        },
        BuiltinPatch {
            id: "prune-path-prefix",
            description: "Removes a common prefix from all paths in the document",
            affects_codegen: true,
            apply: prune_path_prefix,
        },
        BuiltinPatch {
            id: "add-component-schema-prefix",
            description: "Adds a prefix to all component schemas in the document",
            affects_codegen: false,
            apply: add_component_schema_prefix,
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
            br##"
openapi: 3.0.3
info: {title: t, version: "1"}
servers:
  - url: https://old.example.com
paths:
  /api/v1/books:
    post:
      requestBody:
        content:
          application/json:
            schema: {$ref: "#/components/schemas/Book"}
      responses: {}
  /api/v1/books/{id}:
    get: {responses: {}}
  /api/v1/files/*:
    get: {responses: {}}
  /api/v1/_internal:
    get: {responses: {}}
components:
  schemas:
    Book:
      type: object
      properties:
        author: {$ref: "#/components/schemas/Author"}
    Author: {type: string}
"##,
        )
        .unwrap()
    }

    fn paths(doc: &Document) -> Vec<&str> {
        doc.paths.keys().map(String::as_str).collect()
    }

    #[test]
    fn test_prune_invalid_and_unusual_paths() {
        let mut doc = doc();
        prune_invalid_paths(&mut doc, &PatchConfig::new()).unwrap();
        prune_unusual_paths(&mut doc, &PatchConfig::new()).unwrap();
        assert_eq!(paths(&doc), vec!["/api/v1/books", "/api/v1/books/{id}"]);
    }

    #[test]
    fn test_common_path_prefix() {
        assert_eq!(
            common_path_prefix(&["/api/v1/books", "/api/v1/books/{id}", "/api/v1/authors"]),
            "/api/v1"
        );
        assert_eq!(common_path_prefix(&["/api/v1/books", "/api/v1/books/{id}"]), "/api/v1");
        assert_eq!(common_path_prefix(&["/{tenant}/a", "/{tenant}/b"]), "");
        assert_eq!(common_path_prefix(&["/books", "/authors"]), "");
        assert_eq!(common_path_prefix::<&str>(&[]), "");
    }

    #[test]
    fn test_prune_path_prefix_detects_common_prefix() {
        let mut doc = doc();
        prune_path_prefix(&mut doc, &PatchConfig::new()).unwrap();
        assert_eq!(paths(&doc), vec!["/books", "/books/{id}", "/files/*", "/_internal"]);
    }

    #[test]
    fn test_prune_and_add_path_prefix_with_config() {
        let mut doc = doc();
        let mut config = PatchConfig::new();
        config.insert("prefix".into(), json!("/api"));
        prune_path_prefix(&mut doc, &config).unwrap();
        assert_eq!(paths(&doc)[0], "/v1/books");

        config.insert("prefix".into(), json!("/svc"));
        add_path_prefix(&mut doc, &config).unwrap();
        assert_eq!(paths(&doc)[0], "/svc/v1/books");
    }

    #[test]
    fn test_set_endpoint() {
        let mut doc = doc();
        let mut config = PatchConfig::new();
        config.insert("url".into(), json!("https://api.example.com"));
        set_endpoint(&mut doc, &config).unwrap();
        assert_eq!(doc.servers.len(), 1);
        assert_eq!(doc.servers[0].url, "https://api.example.com");
    }

    #[test]
    fn test_add_idempotency_key_only_on_post() {
        let mut doc = doc();
        add_idempotency_key(&mut doc, &PatchConfig::new()).unwrap();
        for (_, method, op) in doc.operations() {
            let has_key = op
                .parameters
                .iter()
                .filter_map(RefOr::as_item)
                .any(|p| p.name == IDEMPOTENCY_KEY_HEADER && p.required);
            assert_eq!(has_key, method == HttpMethod::Post);
        }
    }

    #[test]
    fn test_add_component_schema_prefix_rewrites_refs() {
        let mut doc = doc();
        let mut config = PatchConfig::new();
        config.insert("prefix".into(), json!("Lib"));
        add_component_schema_prefix(&mut doc, &config).unwrap();

        let names: Vec<_> = doc.components.schemas.keys().cloned().collect();
        assert_eq!(names, vec!["LibBook", "LibAuthor"]);
        let book = doc.components.schemas["LibBook"].as_inline().unwrap();
        assert_eq!(book.properties["author"].ref_name(), Some("LibAuthor"));
        let body = doc.paths["/api/v1/books"].post.as_ref().unwrap().request_body.as_ref();
        let schema = body.and_then(RefOr::as_item).unwrap().content["application/json"]
            .schema
            .as_ref()
            .unwrap();
        assert_eq!(schema.ref_name(), Some("LibBook"));
    }
}
