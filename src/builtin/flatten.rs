//! Moves inline schemas into `components.schemas` and replaces them with
//! references, so every generated type has a stable name.
//!
//! Names are derived from operation ids and property names. A name that is
//! already taken by a structurally equal schema is reused; a name taken by a
//! different schema gets the candidate's content hash appended.

use indexmap::IndexMap;
use tracing::trace;

use super::simplify::collapse_boolean_union;
use super::BuiltinPatch;
use crate::core::error::{Error, Result};
use crate::core::utils::{to_pascal_case, upper_first};
use crate::openapi::{
    content_hash, schemas_equal, Document, HttpMethod, Operation, RefOr, RequestBody, Schema,
    SchemaRef,
};
use crate::patch::PatchConfig;

type Schemas = IndexMap<String, SchemaRef>;

/// Short suffix for a media type, used to tell apart request bodies of one
/// operation.
pub fn content_type_short_name(content_type: &str) -> &str {
    match content_type {
        "application/json" => "json",
        "application/xml" => "xml",
        "application/yaml" => "yaml",
        "application/x-www-form-urlencoded" | "multipart/form-data" => "form",
        "application/octet-stream" => "bytes",
        "application/hal+json" => "haljson",
        other => other,
    }
}

fn schemaless(description: &str) -> SchemaRef {
    Schema {
        description: Some(description.to_string()),
        ..Schema::of_type("string")
    }
    .into()
}

/// Stores an inline slot under `key` (or a free variant of it) and turns the
/// slot into a reference. Returns the component name, or `None` when the slot
/// already was a reference.
pub fn move_schema_into_components(
    schemas: &mut Schemas,
    key: &str,
    slot: &mut SchemaRef,
) -> Option<String> {
    if slot.is_reference() {
        return None;
    }
    let name = allocate_name(schemas, key, slot);
    if !schemas.contains_key(&name) {
        schemas.insert(name.clone(), slot.clone());
    }
    trace!(schema = %name, "Moved inline schema to components");
    *slot = SchemaRef::component(&name);
    Some(name)
}

fn allocate_name(schemas: &Schemas, key: &str, candidate: &SchemaRef) -> String {
    let fits = |name: &str| match schemas.get(name) {
        None => true,
        Some(existing) => schemas_equal(existing, candidate, schemas),
    };
    if fits(key) {
        return key.to_string();
    }
    let hashed = format!("{key}{}", content_hash(candidate));
    if fits(&hashed) {
        return hashed;
    }
    let mut counter = 2;
    loop {
        let name = format!("{hashed}{counter}");
        if fits(&name) {
            return name;
        }
        counter += 1;
    }
}

fn require_operation_id(op: &Operation, method: HttpMethod, path: &str) -> Result<String> {
    if op.operation_id.is_empty() {
        return Err(Error::precondition(format!(
            "operation id is required for operation [{}] of path [{path}], use generate-operation-id to ensure all operations have an id",
            method.as_str()
        )));
    }
    Ok(op.operation_id.clone())
}

/// `<Pascal(id)><infix>` plus a media type suffix from the second entry on.
fn flatten_request_body(schemas: &mut Schemas, body: &mut RequestBody, base: &str) {
    for (index, (content_type, media)) in body.content.iter_mut().enumerate() {
        let Some(slot) = media.schema.as_mut() else {
            continue;
        };
        let suffix = if index > 0 {
            upper_first(content_type_short_name(content_type))
        } else {
            String::new()
        };
        move_schema_into_components(schemas, &format!("{base}{suffix}"), slot);
    }
}

fn flatten_operation(schemas: &mut Schemas, op: &mut Operation, operation_id: &str) {
    let name = to_pascal_case(operation_id);
    if let Some(body) = op.request_body.as_mut().and_then(RefOr::as_item_mut) {
        flatten_request_body(schemas, body, &format!("{name}B"));
    }

    let response_count = op.responses.len();
    for (code, response) in op.responses.iter_mut() {
        let Some(response) = response.as_item_mut() else {
            continue;
        };
        for media in response.content.values_mut() {
            let slot = media
                .schema
                .get_or_insert_with(|| schemaless("Schemaless response"));
            let key = if response_count > 1 {
                format!("{name}R{code}")
            } else {
                name.clone()
            };
            move_schema_into_components(schemas, &key, slot);
        }
    }
}

fn flatten_callbacks(schemas: &mut Schemas, op: &mut Operation, parent_id: &str) {
    for callback in op.callbacks.values_mut() {
        let Some(callback) = callback.as_item_mut() else {
            continue;
        };
        for item in callback.values_mut() {
            for (_, callback_op) in item.operations_mut() {
                let id = if callback_op.operation_id.is_empty() {
                    parent_id.to_string()
                } else {
                    callback_op.operation_id.clone()
                };
                if let Some(body) = callback_op.request_body.as_mut().and_then(RefOr::as_item_mut) {
                    flatten_request_body(schemas, body, &format!("{}WH", to_pascal_case(&id)));
                }
            }
        }
    }
}

fn flatten_component_request_bodies(doc: &mut Document) {
    let schemas = &mut doc.components.schemas;
    for (key, body) in doc.components.request_bodies.iter_mut() {
        let Some(body) = body.as_item_mut() else {
            continue;
        };
        for media in body.content.values_mut() {
            let slot = media
                .schema
                .get_or_insert_with(|| schemaless("Schemaless request body"));
            move_schema_into_components(schemas, &to_pascal_case(key), slot);
        }
    }
}

/// Enum properties, enum array items and inline objects of one component.
fn flatten_component(schemas: &mut Schemas, parent: &str, schema: &mut Schema) {
    if schema.is_array() {
        if let Some(items) = schema.items.as_mut() {
            if items.as_inline().is_some_and(|s| s.is_object() && !s.is_enum()) {
                move_schema_into_components(schemas, &format!("{}Item", to_pascal_case(parent)), items);
            }
        }
    }

    for (property, slot) in schema.properties.iter_mut() {
        let Some(inline) = slot.as_inline_mut() else {
            continue;
        };
        collapse_boolean_union(inline, schemas);
        let base = to_pascal_case(property);

        if !inline.enum_values.is_empty() {
            move_schema_into_components(schemas, &format!("{base}Enum"), slot);
            continue;
        }
        let item_key = inline
            .items
            .as_ref()
            .and_then(SchemaRef::as_inline)
            .and_then(|item| {
                if !item.enum_values.is_empty() {
                    Some(format!("{base}ItemEnum"))
                } else if inline.schema_type.contains("array") && item.is_object() {
                    Some(format!("{base}Item"))
                } else {
                    None
                }
            });
        if let (Some(key), Some(items)) = (item_key, inline.items.as_mut()) {
            move_schema_into_components(schemas, &key, items);
        }
        if inline.schema_type.contains("object") {
            move_schema_into_components(schemas, &base, slot);
        }
    }
}

/// Visits every component schema, including those added while visiting.
fn flatten_components_in_place(schemas: &mut Schemas) {
    let mut index = 0;
    while index < schemas.len() {
        let Some((name, slot)) = schemas.get_index(index) else {
            break;
        };
        let Some(mut schema) = slot.as_inline().cloned() else {
            index += 1;
            continue;
        };
        let name = name.clone();
        flatten_component(schemas, &name, &mut schema);
        if let Some(slot) = schemas.get_index_mut(index).map(|(_, slot)| slot) {
            *slot = SchemaRef::from(schema);
        }
        index += 1;
    }
}

pub fn flatten_components(doc: &mut Document, _config: &PatchConfig) -> Result<()> {
    let schemas = &mut doc.components.schemas;
    for (path, item) in doc.paths.iter_mut() {
        for (method, op) in item.operations_mut() {
            let operation_id = require_operation_id(op, method, path)?;
            flatten_operation(schemas, op, &operation_id);
            flatten_callbacks(schemas, op, &operation_id);
        }
    }

    for (name, item) in doc.webhooks.iter_mut() {
        for (method, op) in item.operations_mut() {
            let has_inline_body = op
                .request_body
                .as_ref()
                .and_then(RefOr::as_item)
                .is_some_and(|b| b.content.values().any(|m| m.schema.as_ref().is_some_and(|s| !s.is_reference())));
            if !has_inline_body {
                continue;
            }
            let operation_id = require_operation_id(op, method, name)?;
            if let Some(body) = op.request_body.as_mut().and_then(RefOr::as_item_mut) {
                flatten_request_body(schemas, body, &format!("{}WH", to_pascal_case(&operation_id)));
            }
        }
    }

    flatten_component_request_bodies(doc);
    flatten_components_in_place(&mut doc.components.schemas);
    Ok(())
}

pub(super) fn patches() -> Vec<BuiltinPatch> {
    vec![BuiltinPatch {
        id: "flatten-components",
        description: "Flattens inline request bodies and response schemas into the components section of the document",
        affects_codegen: true,
        apply: flatten_components,
    }]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::openapi::parse_document;

    const DOC: &str = r##"
openapi: 3.1.0
info: {title: t, version: "1"}
paths:
  /pets:
    post:
      operationId: createPet
      requestBody:
        content:
          application/json:
            schema:
              type: object
              properties:
                name: {type: string}
          application/xml:
            schema:
              type: object
              properties:
                name: {type: string}
                raw: {type: string}
      responses:
        "200":
          description: ok
          content:
            application/json:
              schema:
                type: object
                properties:
                  id: {type: integer}
        "404":
          description: missing
          content:
            text/plain: {}
  /pets/{id}:
    get:
      operationId: getPet
      responses:
        "200":
          description: ok
          content:
            application/json:
              schema: {$ref: "#/components/schemas/Pet"}
components:
  schemas:
    Pet:
      type: object
      properties:
        status:
          type: string
          enum: [available, sold]
        labels:
          type: array
          items: {type: string, enum: [a, b]}
        owner:
          type: object
          properties:
            address:
              type: object
              properties:
                city: {type: string}
        visits:
          type: array
          items:
            type: object
            properties:
              at: {type: string}
    Pets:
      type: array
      items:
        type: object
        properties:
          id: {type: integer}
  requestBodies:
    Upload:
      content:
        application/octet-stream: {}
"##;

    fn flattened() -> Document {
        let mut doc = parse_document(DOC.as_bytes()).unwrap();
        flatten_components(&mut doc, &PatchConfig::new()).unwrap();
        doc
    }

    fn names(doc: &Document) -> Vec<&str> {
        doc.components.schemas.keys().map(String::as_str).collect()
    }

    #[test]
    fn test_content_type_short_name() {
        assert_eq!(content_type_short_name("application/json"), "json");
        assert_eq!(content_type_short_name("multipart/form-data"), "form");
        assert_eq!(content_type_short_name("application/hal+json"), "haljson");
        assert_eq!(content_type_short_name("text/csv"), "text/csv");
    }

    #[test]
    fn test_operation_schemas_named_after_operation_id() {
        let doc = flattened();
        let names = names(&doc);
        for expected in ["CreatePetB", "CreatePetBXml", "CreatePetR200", "CreatePetR404"] {
            assert!(names.contains(&expected), "missing {expected} in {names:?}");
        }
        let response = doc.paths["/pets"].post.as_ref().unwrap().responses["404"]
            .as_item()
            .unwrap();
        assert_eq!(
            response.content["text/plain"].schema.as_ref().unwrap().ref_name(),
            Some("CreatePetR404")
        );
        let placeholder = doc.components.schemas["CreatePetR404"].as_inline().unwrap();
        assert_eq!(placeholder.description.as_deref(), Some("Schemaless response"));
    }

    #[test]
    fn test_component_properties_flattened() {
        let doc = flattened();
        let names = names(&doc);
        for expected in ["StatusEnum", "LabelsItemEnum", "Owner", "Address", "VisitsItem", "PetsItem", "Upload"] {
            assert!(names.contains(&expected), "missing {expected} in {names:?}");
        }
        let pet = doc.components.schemas["Pet"].as_inline().unwrap();
        assert_eq!(pet.properties["owner"].ref_name(), Some("Owner"));
        let owner = doc.components.schemas["Owner"].as_inline().unwrap();
        assert_eq!(owner.properties["address"].ref_name(), Some("Address"));
        let upload = doc.components.schemas["Upload"].as_inline().unwrap();
        assert_eq!(upload.description.as_deref(), Some("Schemaless request body"));
    }

    #[test]
    fn test_boolean_unions_in_properties_are_simplified() {
        let mut doc = parse_document(
            br#"
openapi: 3.0.3
info: {title: t, version: "1"}
paths: {}
components:
  schemas:
    Job:
      type: object
      properties:
        retry:
          anyOf:
            - {type: boolean}
            - {type: string, enum: [auto]}
        settings:
          type: object
          properties:
            notify:
              anyOf:
                - {type: boolean}
                - {type: string, enum: [never, always]}
"#,
        )
        .unwrap();
        flatten_components(&mut doc, &PatchConfig::new()).unwrap();

        let job = doc.components.schemas["Job"].as_inline().unwrap();
        let retry = job.properties["retry"].as_inline().unwrap();
        assert!(retry.schema_type.is("boolean"));
        assert!(retry.any_of.is_empty());
        assert_eq!(job.properties["settings"].ref_name(), Some("Settings"));

        let settings = doc.components.schemas["Settings"].as_inline().unwrap();
        let notify = settings.properties["notify"].as_inline().unwrap();
        assert!(notify.schema_type.is("boolean"));
        assert!(notify.enum_values.is_empty());
        assert_eq!(names(&doc), vec!["Job", "Settings"]);
    }

    #[test]
    fn test_flatten_is_idempotent() {
        let once = flattened();
        let mut twice = once.clone();
        flatten_components(&mut twice, &PatchConfig::new()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_missing_operation_id_is_an_error() {
        let mut doc = parse_document(DOC.as_bytes()).unwrap();
        doc.paths["/pets/{id}"].get.as_mut().unwrap().operation_id.clear();
        let err = flatten_components(&mut doc, &PatchConfig::new()).unwrap_err();
        assert!(err.to_string().contains("[get] of path [/pets/{id}]"));
    }

    #[test]
    fn test_name_collision_reuses_or_hashes() {
        let mut schemas = Schemas::new();
        schemas.insert("Thing".into(), Schema::of_type("string").into());

        let mut same: SchemaRef = Schema {
            title: Some("Different title".into()),
            ..Schema::of_type("string")
        }
        .into();
        assert_eq!(move_schema_into_components(&mut schemas, "Thing", &mut same).as_deref(), Some("Thing"));
        assert_eq!(schemas.len(), 1);

        let mut other: SchemaRef = Schema::of_type("integer").into();
        let expected = format!("Thing{}", content_hash(&other));
        assert_eq!(move_schema_into_components(&mut schemas, "Thing", &mut other), Some(expected.clone()));
        assert_eq!(other.ref_name(), Some(expected.as_str()));
        assert_eq!(schemas.len(), 2);

        assert_eq!(move_schema_into_components(&mut schemas, "Thing", &mut other), None);
    }
}
