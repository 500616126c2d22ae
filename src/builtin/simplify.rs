//! Collapsing `allOf`/`anyOf`/`oneOf` compositions into plain schemas, which
//! most code generators cannot express directly.

use indexmap::IndexMap;
use tracing::{debug, trace};

use super::flatten::move_schema_into_components;
use super::BuiltinPatch;
use crate::core::error::{Error, Result};
use crate::core::utils::to_pascal_case;
use crate::openapi::visit::{rewrite_schema_refs, walk_document_mut};
use crate::openapi::{merge_schema, Document, Schema, SchemaRef, TypeSet};
use crate::patch::PatchConfig;

type Schemas = IndexMap<String, SchemaRef>;

fn dedup_types(schema: &mut Schema) {
    let mut seen = TypeSet::default();
    for name in schema.schema_type.iter() {
        if !seen.contains(name) {
            seen.push(name);
        }
    }
    schema.schema_type = seen;
}

fn has_composition(schema: &Schema) -> bool {
    !schema.all_of.is_empty() || !schema.any_of.is_empty() || !schema.one_of.is_empty()
}

/// Nothing left that a generator could turn into a type.
fn is_hollow(schema: &Schema) -> bool {
    schema.schema_type.is_empty()
        && schema.properties.is_empty()
        && schema.items.is_none()
        && schema.additional_properties.is_none()
        && schema.enum_values.is_empty()
        && schema.const_value.is_none()
        && !has_composition(schema)
}

fn inline_component(schemas: &Schemas, name: &str, owner: &str) -> Result<Schema> {
    schemas
        .get(name)
        .and_then(SchemaRef::as_inline)
        .cloned()
        .ok_or_else(|| {
            Error::precondition(format!(
                "schema {name} referenced by {owner} is missing or not inline"
            ))
        })
}

/// Folds one component's compositions. Derived schemas (`allOf` of a base)
/// push their content into the base; `anyOf`/`oneOf` owners absorb their
/// branches.
fn simplify_component(
    schemas: &mut Schemas,
    name: &str,
    mut schema: Schema,
    replacements: &mut IndexMap<String, String>,
) -> Result<Schema> {
    let all_of = schema.all_of.clone();
    for branch in &all_of {
        let Some(base_name) = branch.ref_name().filter(|b| *b != name) else {
            continue;
        };
        let mut base = inline_component(schemas, base_name, name)?;
        debug!(schema = %name, base = %base_name, "Merging derived schema into base");
        merge_schema(&mut base, &schema, schemas);
        dedup_types(&mut base);
        schemas.insert(base_name.to_string(), base.into());
        replacements.insert(name.to_string(), base_name.to_string());
    }
    schema.all_of.clear();

    let branches: Vec<SchemaRef> = schema
        .any_of
        .iter()
        .chain(schema.one_of.iter())
        .cloned()
        .collect();
    for branch in &branches {
        match branch.ref_name() {
            Some(composed) if composed == name => {}
            Some(composed) => {
                let source = inline_component(schemas, composed, name)?;
                trace!(schema = %name, branch = %composed, "Merging composed branch");
                merge_schema(&mut schema, &source, schemas);
                replacements
                    .entry(composed.to_string())
                    .or_insert_with(|| name.to_string());
            }
            None => {
                if let Some(inline) = branch.as_inline() {
                    merge_schema(&mut schema, inline, schemas);
                }
            }
        }
    }
    schema.any_of.clear();
    schema.one_of.clear();
    dedup_types(&mut schema);
    Ok(schema)
}

/// Removes schemas left without content by the merge and points their
/// references at what replaced them.
fn delete_hollow_schemas(doc: &mut Document, replacements: &IndexMap<String, String>) {
    let mut renames = IndexMap::new();
    for (derived, target) in replacements {
        let hollow = doc
            .components
            .schemas
            .get(derived)
            .and_then(SchemaRef::as_inline)
            .is_some_and(is_hollow);
        if hollow {
            debug!(schema = %derived, replacement = %target, "Removing emptied schema");
            doc.components.schemas.shift_remove(derived);
            renames.insert(derived.clone(), target.clone());
        }
    }
    rewrite_schema_refs(doc, &renames);
}

pub fn simplify_polymorphic_schemas(doc: &mut Document, _config: &PatchConfig) -> Result<()> {
    let mut replacements = IndexMap::new();
    let names: Vec<String> = doc.components.schemas.keys().cloned().collect();
    for name in names {
        let Some(schema) = doc
            .components
            .schemas
            .get(&name)
            .and_then(SchemaRef::as_inline)
            .cloned()
        else {
            continue;
        };
        if schema.is_enum() || !has_composition(&schema) {
            continue;
        }
        let simplified =
            simplify_component(&mut doc.components.schemas, &name, schema, &mut replacements)?;
        doc.components.schemas.insert(name, simplified.into());
    }
    delete_hollow_schemas(doc, &replacements);
    Ok(())
}

/// Collapses `anyOf: [boolean, string enum]` into a plain boolean. Returns
/// whether the schema changed.
pub(super) fn collapse_boolean_union(schema: &mut Schema, schemas: &Schemas) -> bool {
    if schema.any_of.is_empty() {
        return false;
    }
    let (mut has_boolean, mut has_string_enum) = (false, false);
    for branch in schema.any_of.iter().filter_map(|b| b.resolve(schemas)) {
        has_boolean |= branch.schema_type.is("boolean");
        has_string_enum |= branch.schema_type.is("string") && !branch.enum_values.is_empty();
    }
    if !(has_boolean && has_string_enum) {
        return false;
    }
    trace!(title = ?schema.title, "Simplified polymorphic boolean schema to plain boolean");
    schema.schema_type = TypeSet::single("boolean");
    schema.any_of.clear();
    schema.enum_values.clear();
    schema.format = None;
    true
}

/// `anyOf: [boolean, string enum]` becomes a plain boolean.
pub fn simplify_polymorphic_booleans(doc: &mut Document, _config: &PatchConfig) -> Result<()> {
    let schemas = doc.components.schemas.clone();
    walk_document_mut(doc, &mut |slot| {
        if let Some(schema) = slot.as_inline_mut() {
            collapse_boolean_union(schema, &schemas);
        }
    });
    Ok(())
}

/// Merges every `allOf` into its owner, recursing through properties.
pub fn simplify_all_of(doc: &mut Document, _config: &PatchConfig) -> Result<()> {
    let schemas = doc.components.schemas.clone();
    walk_document_mut(doc, &mut |slot| {
        let Some(schema) = slot.as_inline_mut() else {
            return;
        };
        if schema.all_of.is_empty() {
            return;
        }
        for branch in std::mem::take(&mut schema.all_of) {
            if let Some(source) = branch.resolve(&schemas) {
                merge_schema(schema, source, &schemas);
            }
        }
        dedup_types(schema);
    });
    Ok(())
}

/// Replaces polymorphic property values with a reference to one union schema
/// named `<Owner><Property>`.
pub fn simplify_polymorphic_properties(doc: &mut Document, _config: &PatchConfig) -> Result<()> {
    let schemas = &mut doc.components.schemas;
    let names: Vec<String> = schemas.keys().cloned().collect();
    for owner in names {
        let Some(mut schema) = schemas.get(&owner).and_then(SchemaRef::as_inline).cloned() else {
            continue;
        };
        let mut changed = false;
        for (property, slot) in schema.properties.iter_mut() {
            let Some(value) = slot.as_inline().filter(|s| s.is_polymorphic()) else {
                continue;
            };
            let mut union = value.clone();
            union.all_of.clear();
            union.any_of.clear();
            union.one_of.clear();
            for branch in value.all_of.iter().chain(&value.any_of).chain(&value.one_of) {
                match branch.resolve(schemas) {
                    Some(source) => merge_schema(&mut union, source, schemas),
                    None => trace!(owner = %owner, property = %property, "Skipping unresolvable branch"),
                }
            }
            dedup_types(&mut union);

            let key = format!("{}{}", to_pascal_case(&owner), to_pascal_case(property));
            let mut union_slot = SchemaRef::from(union);
            if let Some(name) = move_schema_into_components(schemas, &key, &mut union_slot) {
                debug!(owner = %owner, property = %property, schema = %name, "Replaced polymorphic property");
            }
            *slot = union_slot;
            changed = true;
        }
        if changed {
            schemas.insert(owner, schema.into());
        }
    }
    Ok(())
}

pub(super) fn patches() -> Vec<BuiltinPatch> {
    vec![
        BuiltinPatch {
            id: "simplify-polymorphic-schemas",
            description: "Merges polymorphic schemas (oneOf, anyOf, allOf) into a single schema",
            affects_codegen: true,
            apply: simplify_polymorphic_schemas,
        },
        BuiltinPatch {
            id: "simplify-polymorphic-booleans",
            description: "Merges polymorphic boolean schemas (anyOf of boolean and string enum) into a single boolean schema",
            affects_codegen: false,
            apply: simplify_polymorphic_booleans,
        },
        BuiltinPatch {
            id: "simplify-polymorphic-properties",
            description: "Merges polymorphic property values (anyOf, oneOf, allOf) into a single flat schema referenced by properties",
            affects_codegen: false,
            apply: simplify_polymorphic_properties,
        },
        BuiltinPatch {
            id: "simplify-all-of",
            description: "Merges allOf subschemas into the parent schema",
            affects_codegen: false,
            apply: simplify_all_of,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::openapi::parse_document;

    fn doc(yaml: &str) -> Document {
        parse_document(yaml.as_bytes()).unwrap()
    }

    fn inline<'a>(doc: &'a Document, name: &str) -> &'a Schema {
        doc.components.schemas[name].as_inline().unwrap()
    }

    #[test]
    fn test_derived_all_of_merges_into_base_and_is_removed() {
        let mut doc = doc(r##"
openapi: 3.0.3
info: {title: t, version: "1"}
paths:
  /cats:
    get:
      operationId: getCat
      responses:
        "200":
          description: ok
          content:
            application/json:
              schema: {$ref: "#/components/schemas/Cat"}
components:
  schemas:
    Pet:
      type: object
      properties:
        name: {type: string}
    Cat:
      allOf:
        - $ref: "#/components/schemas/Pet"
        - type: object
          properties:
            purrs: {type: boolean}
"##);
        simplify_polymorphic_schemas(&mut doc, &PatchConfig::new()).unwrap();

        assert!(!doc.components.schemas.contains_key("Cat"));
        let pet = inline(&doc, "Pet");
        let props: Vec<_> = pet.properties.keys().cloned().collect();
        assert_eq!(props, vec!["name", "purrs"]);
        assert_eq!(pet.schema_type.0, vec!["object"]);

        let op = doc.paths["/cats"].get.as_ref().unwrap();
        let schema = op.responses["200"].as_item().unwrap().content["application/json"]
            .schema
            .as_ref()
            .unwrap();
        assert_eq!(schema.ref_name(), Some("Pet"));
    }

    #[test]
    fn test_one_of_owner_absorbs_branches() {
        let mut doc = doc(r##"
openapi: 3.0.3
info: {title: t, version: "1"}
paths: {}
components:
  schemas:
    Shape:
      oneOf:
        - $ref: "#/components/schemas/Circle"
        - $ref: "#/components/schemas/Square"
    Circle:
      type: object
      properties:
        radius: {type: number}
    Square:
      type: object
      properties:
        side: {type: number}
    Color:
      oneOf:
        - const: red
        - const: blue
"##);
        simplify_polymorphic_schemas(&mut doc, &PatchConfig::new()).unwrap();

        let shape = inline(&doc, "Shape");
        assert!(shape.one_of.is_empty());
        let props: Vec<_> = shape.properties.keys().cloned().collect();
        assert_eq!(props, vec!["radius", "side"]);
        assert_eq!(shape.schema_type.0, vec!["object"]);
        assert!(doc.components.schemas.contains_key("Circle"));
        assert_eq!(inline(&doc, "Color").one_of.len(), 2);
    }

    #[test]
    fn test_missing_base_is_an_error() {
        let mut doc = doc(r##"
openapi: 3.0.3
info: {title: t, version: "1"}
paths: {}
components:
  schemas:
    Cat:
      allOf:
        - $ref: "#/components/schemas/Pet"
"##);
        let err = simplify_polymorphic_schemas(&mut doc, &PatchConfig::new()).unwrap_err();
        assert!(err.to_string().contains("schema Pet referenced by Cat"));
    }

    #[test]
    fn test_boolean_string_enum_collapses() {
        let mut doc = doc(r##"
openapi: 3.0.3
info: {title: t, version: "1"}
paths: {}
components:
  schemas:
    Settings:
      type: object
      properties:
        enabled:
          format: flag
          anyOf:
            - type: boolean
            - type: string
              enum: ["true", "false"]
        mixed:
          anyOf:
            - type: boolean
            - type: integer
"##);
        simplify_polymorphic_booleans(&mut doc, &PatchConfig::new()).unwrap();
        let settings = inline(&doc, "Settings");
        let enabled = settings.properties["enabled"].as_inline().unwrap();
        assert!(enabled.schema_type.is("boolean"));
        assert!(enabled.any_of.is_empty());
        assert!(enabled.enum_values.is_empty());
        assert!(enabled.format.is_none());
        assert_eq!(settings.properties["mixed"].as_inline().unwrap().any_of.len(), 2);
    }

    #[test]
    fn test_simplify_all_of_recurses_into_properties() {
        let mut doc = doc(r##"
openapi: 3.0.3
info: {title: t, version: "1"}
paths: {}
components:
  schemas:
    Audit:
      type: object
      properties:
        created: {type: string}
    Order:
      type: object
      properties:
        meta:
          allOf:
            - $ref: "#/components/schemas/Audit"
            - properties:
                note: {type: string}
"##);
        simplify_all_of(&mut doc, &PatchConfig::new()).unwrap();
        let meta = inline(&doc, "Order").properties["meta"].as_inline().unwrap();
        assert!(meta.all_of.is_empty());
        let props: Vec<_> = meta.properties.keys().cloned().collect();
        assert_eq!(props, vec!["created", "note"]);
        assert_eq!(meta.schema_type.0, vec!["object"]);
    }

    #[test]
    fn test_polymorphic_property_becomes_union_reference() {
        let mut doc = doc(r##"
openapi: 3.0.3
info: {title: t, version: "1"}
paths: {}
components:
  schemas:
    Card:
      type: object
      properties:
        number: {type: string}
    Bank:
      type: object
      properties:
        iban: {type: string}
    Payment:
      type: object
      properties:
        method:
          anyOf:
            - $ref: "#/components/schemas/Card"
            - $ref: "#/components/schemas/Bank"
"##);
        simplify_polymorphic_properties(&mut doc, &PatchConfig::new()).unwrap();
        let payment = inline(&doc, "Payment");
        assert_eq!(payment.properties["method"].ref_name(), Some("PaymentMethod"));
        let union = inline(&doc, "PaymentMethod");
        let props: Vec<_> = union.properties.keys().cloned().collect();
        assert_eq!(props, vec!["number", "iban"]);
        assert!(union.any_of.is_empty());
    }
}
