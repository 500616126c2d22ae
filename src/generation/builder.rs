//! Builds the language-agnostic [`DocumentModel`] from a flattened document.

use indexmap::IndexMap;
use serde_json::Value;

use super::code_type::{CodeType, CodeTypeKind};
use super::errors::GenerationError;
use super::ir::{
    AllowedValue, Auth, AuthMethod, Documentation, DocumentModel, Endpoint, EndpointType, Enum,
    Model, Operation, Packages, Parameter, Property, Service, Tag, ValueKind,
};
use super::traits::{CodeGenerator, Schemas, TypeScope};
use crate::openapi::{Document, Schema, SchemaRef};

/// Builds template data for one generator run.
///
/// Expects a document whose inline schemas were already moved into
/// components; inline objects without a title fail type mapping.
pub fn build_template_data(
    doc: &Document,
    generator: &dyn CodeGenerator,
    packages: Packages,
) -> Result<DocumentModel, GenerationError> {
    let title = doc.info.title.trim();
    let display_name = title.strip_suffix("API").unwrap_or(title).trim().to_string();
    let name = generator.to_class_name(&display_name);

    let operations = build_operations(doc, generator, &packages)?;

    let mut operations_by_tag: IndexMap<String, Vec<Operation>> = IndexMap::new();
    for operation in &operations {
        for tag in &operation.tags {
            operations_by_tag
                .entry(tag.clone())
                .or_default()
                .push(operation.clone());
        }
    }

    let mut tags = IndexMap::new();
    let mut services = IndexMap::new();
    for tag in &doc.tags {
        let description = tag.description.clone().unwrap_or_default();
        tags.insert(
            tag.name.clone(),
            Tag {
                name: tag.name.clone(),
                description: description.clone(),
            },
        );
        services.insert(
            tag.name.clone(),
            Service {
                name: tag.name.clone(),
                type_name: generator.to_class_name(&format!("{name} {}", tag.name)),
                description,
                operations: operations_by_tag.get(&tag.name).cloned().unwrap_or_default(),
            },
        );
    }

    let schemas = &doc.components.schemas;
    let models = build_models(schemas, generator, &packages)?;
    let enums = build_enums(schemas, generator, &packages)?;

    tracing::debug!(
        operations = operations.len(),
        models = models.len(),
        enums = enums.len(),
        generator = generator.id(),
        "Built template data"
    );

    Ok(DocumentModel {
        name,
        display_name,
        description: doc.info.description.clone().unwrap_or_default(),
        tags,
        operations,
        operations_by_tag,
        services,
        models,
        enums,
        auth: build_auth(doc),
        endpoints: build_endpoints(doc),
        packages,
    })
}

fn build_endpoints(doc: &Document) -> Vec<Endpoint> {
    doc.servers
        .iter()
        .map(|server| Endpoint {
            endpoint_type: if server.url.starts_with("unix://") {
                EndpointType::Socket
            } else {
                EndpointType::Http
            },
            url: server.url.trim_end_matches('/').to_string(),
            description: server.description.clone().unwrap_or_default(),
        })
        .collect()
}

fn build_auth(doc: &Document) -> Auth {
    let methods = doc
        .components
        .security_schemes
        .iter()
        .filter_map(|(name, scheme)| {
            let scheme = scheme.resolve(&doc.components.security_schemes)?;
            Some(AuthMethod {
                name: name.clone(),
                scheme: scheme
                    .scheme
                    .as_deref()
                    .unwrap_or(&scheme.scheme_type)
                    .to_lowercase(),
            })
        })
        .collect();
    Auth { methods }
}

fn extension_str(extensions: &IndexMap<String, Value>, key: &str) -> Option<String> {
    match extensions.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

fn inline(schema: &Schema) -> SchemaRef {
    SchemaRef::from(schema.clone())
}

fn string_schema() -> SchemaRef {
    SchemaRef::from(Schema::of_type("string"))
}

fn mapped(
    generator: &dyn CodeGenerator,
    slot: &SchemaRef,
    kind: CodeTypeKind,
    required: bool,
    scope: TypeScope<'_>,
    location: &str,
) -> Result<CodeType, GenerationError> {
    let code_type = generator
        .to_code_type(slot, kind, required, scope)
        .map_err(|e| GenerationError::type_mapping(location, e))?;
    Ok(generator.post_process_type(code_type))
}

fn build_operations(
    doc: &Document,
    generator: &dyn CodeGenerator,
    packages: &Packages,
) -> Result<Vec<Operation>, GenerationError> {
    let schemas = &doc.components.schemas;
    let scope = TypeScope::new(schemas, packages);
    let mut operations = Vec::new();

    for (path, method, op) in doc.operations() {
        let method = method.as_str();
        let mut operation = Operation {
            name: generator.to_class_name(&op.operation_id),
            operation_id: op.operation_id.clone(),
            path: path.to_string(),
            method: method.to_string(),
            summary: op.summary.clone().unwrap_or_default(),
            description: op.description.clone().unwrap_or_default(),
            tag: op.tags.first().cloned().unwrap_or_else(|| "default".to_string()),
            tags: op.tags.clone(),
            return_type: generator.post_process_type(CodeType::void()),
            deprecated: op.deprecated,
            deprecated_reason: extension_str(&op.extensions, "x-deprecated").unwrap_or_default(),
            stability: extension_str(&op.extensions, "x-stability")
                .unwrap_or_else(|| "stable".to_string()),
            ..Default::default()
        };
        if let Some(docs) = &op.external_docs {
            operation.documentation.push(Documentation {
                title: docs.description.clone().unwrap_or_default(),
                url: docs.url.clone(),
            });
        }

        let mut added: Vec<String> = Vec::new();
        let mut imports: Vec<String> = Vec::new();

        for param in &op.parameters {
            let Some(param) = param.resolve(&doc.components.parameters) else {
                tracing::warn!(path, method, "Skipping unresolved parameter reference");
                continue;
            };
            let name = generator.to_parameter_name(&param.name);
            if added.contains(&name) {
                continue;
            }
            let location = format!("{path}:{method}:parameter:{}", param.name);
            let fallback = string_schema();
            let slot = param.effective_schema().unwrap_or(&fallback);
            let code_type = mapped(
                generator,
                slot,
                CodeTypeKind::Parameter,
                param.required,
                scope,
                &location,
            )?;
            let resolved = slot.resolve(schemas);

            imports.extend(generator.type_to_import(&code_type));
            operation.add_parameter(Parameter {
                name: name.clone(),
                field_name: param.name.clone(),
                location: param.location.as_str().to_string(),
                description: param.description.clone().unwrap_or_default(),
                is_primitive_type: generator.is_primitive_type(&code_type.name),
                code_type,
                required: param.required,
                kind: value_kind(resolved),
                allowed_values: resolved.map(allowed_values).unwrap_or_default(),
                deprecated: param.deprecated,
                deprecated_reason: extension_str(&param.extensions, "x-deprecated")
                    .unwrap_or_default(),
                static_value: None,
            });
            added.push(name);
        }

        let request_body = op
            .request_body
            .as_ref()
            .and_then(|body| body.resolve(&doc.components.request_bodies));
        if let Some((content_type, media)) = request_body.and_then(|b| b.content.first()) {
            let header = generator.to_parameter_name("Content-Type");
            if !added.contains(&header) {
                let code_type = mapped(
                    generator,
                    &string_schema(),
                    CodeTypeKind::Parameter,
                    true,
                    scope,
                    &format!("{path}:{method}:contentType"),
                )?;
                operation.add_parameter(Parameter {
                    name: header,
                    field_name: "Content-Type".to_string(),
                    location: "header".to_string(),
                    is_primitive_type: generator.is_primitive_type(&code_type.name),
                    code_type,
                    required: true,
                    static_value: Some(content_type.clone()),
                    ..Default::default()
                });
            }

            let body_type = match &media.schema {
                Some(slot) => mapped(
                    generator,
                    slot,
                    CodeTypeKind::Response,
                    false,
                    scope,
                    &format!("{path}:{method}:bodyType"),
                )?,
                None => generator
                    .post_process_type(CodeType::simple(generator.any_type(), false)),
            };
            imports.extend(generator.type_to_import(&body_type));
            operation.add_parameter(Parameter {
                name: "payload".to_string(),
                field_name: "payload".to_string(),
                location: "body".to_string(),
                description: request_body
                    .and_then(|b| b.description.clone())
                    .unwrap_or_default(),
                is_primitive_type: generator.is_primitive_type(&body_type.name),
                code_type: body_type,
                required: true,
                ..Default::default()
            });
        }

        for (status, response) in &op.responses {
            if status != "200" && status != "201" {
                continue;
            }
            let Some(response) = response.resolve(&doc.components.responses) else {
                continue;
            };
            let Some(slot) = response.content.values().find_map(|m| m.schema.as_ref()) else {
                continue;
            };
            let return_type = mapped(
                generator,
                slot,
                CodeTypeKind::Response,
                false,
                scope,
                &format!("{path}:{method}:responseType:{status}"),
            )?;
            imports.extend(generator.type_to_import(&return_type));
            operation.return_type = return_type;
            break;
        }

        operation.imports = unique_sorted(imports);
        operations.push(operation);
    }

    Ok(operations)
}

fn value_kind(schema: Option<&Schema>) -> ValueKind {
    if schema.is_some_and(Schema::is_enum) {
        ValueKind::Enum
    } else {
        ValueKind::Var
    }
}

fn unique_sorted(mut imports: Vec<String>) -> Vec<String> {
    imports.retain(|i| !i.is_empty());
    imports.sort();
    imports.dedup();
    imports
}

fn build_models(
    schemas: &Schemas,
    generator: &dyn CodeGenerator,
    packages: &Packages,
) -> Result<Vec<Model>, GenerationError> {
    let scope = TypeScope::new(schemas, packages);
    let mut models = Vec::new();

    for (key, slot) in schemas {
        let Some(schema) = slot.resolve(schemas) else {
            tracing::warn!(schema = %key, "Skipping unresolved component schema");
            continue;
        };
        if schema.is_enum() {
            continue;
        }

        let mut model = Model {
            name: generator.to_class_name(schema.title.as_deref().unwrap_or(key)),
            description: schema.description.clone().unwrap_or_default(),
            deprecated: schema.deprecated.unwrap_or(false),
            deprecated_reason: extension_str(&schema.extensions, "x-deprecated")
                .unwrap_or_default(),
            ..Default::default()
        };
        let mut imports = Vec::new();

        if schema.is_object() && !schema.properties.is_empty() {
            let mut added: Vec<String> = Vec::new();
            for (property_name, property_slot) in &schema.properties {
                let name = generator.to_property_name(property_name);
                if added.contains(&name) {
                    continue;
                }
                let required = schema.is_required(property_name);
                let code_type = mapped(
                    generator,
                    property_slot,
                    CodeTypeKind::Property,
                    required,
                    scope,
                    &format!("{key}:object:{property_name}"),
                )?;
                let resolved = property_slot.resolve(schemas);
                imports.extend(generator.type_to_import(&code_type));
                model.properties.push(Property {
                    name: name.clone(),
                    field_name: property_name.clone(),
                    title: resolved.and_then(|s| s.title.clone()).unwrap_or_default(),
                    description: resolved
                        .and_then(|s| s.description.clone())
                        .unwrap_or_default(),
                    kind: value_kind(resolved),
                    is_primitive_type: generator.is_primitive_type(&code_type.name),
                    nullable: resolved.is_some_and(Schema::is_nullable),
                    required,
                    allowed_values: resolved.map(allowed_values).unwrap_or_default(),
                    code_type,
                });
                added.push(name);
            }
        } else {
            let kind = if schema.is_array() {
                CodeTypeKind::Array
            } else {
                CodeTypeKind::Parent
            };
            let parent = mapped(generator, &inline(schema), kind, true, scope, key)?;
            imports.extend(generator.type_to_import(&parent));
            model.parent = Some(parent);
        }

        model.is_type_alias = model.properties.is_empty()
            && model
                .parent
                .as_ref()
                .is_some_and(|p| !p.name.is_empty() || p.is_composite());
        model.imports = unique_sorted(imports);
        models.push(model);
    }

    Ok(models)
}

fn build_enums(
    schemas: &Schemas,
    generator: &dyn CodeGenerator,
    packages: &Packages,
) -> Result<Vec<Enum>, GenerationError> {
    let scope = TypeScope::new(schemas, packages);
    let mut enums = Vec::new();

    for (key, slot) in schemas {
        let Some(schema) = slot.resolve(schemas) else {
            continue;
        };
        if !schema.is_enum() {
            continue;
        }
        let value_type = mapped(
            generator,
            &inline(schema),
            CodeTypeKind::Property,
            true,
            scope,
            key,
        )?;
        let allowed_values = allowed_values(schema)
            .into_iter()
            .map(|(value, mut allowed)| {
                allowed.name = generator.to_constant_name(&allowed.name);
                (value, allowed)
            })
            .collect();

        enums.push(Enum {
            name: generator.to_class_name(schema.title.as_deref().unwrap_or(key)),
            description: schema.description.clone().unwrap_or_default(),
            value_type,
            allowed_values,
            deprecated: schema.deprecated.unwrap_or(false),
            deprecated_reason: extension_str(&schema.extensions, "x-deprecated")
                .unwrap_or_default(),
        });
    }

    Ok(enums)
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Enumerated values of a schema keyed by their string form.
///
/// Sources, first one wins per value: `enum`, `oneOf` const branches,
/// `x-enum-descriptions` (map or list aligned with `enum`) and `x-ms-enum`.
pub fn allowed_values(schema: &Schema) -> IndexMap<String, AllowedValue> {
    let mut values: IndexMap<String, AllowedValue> = IndexMap::new();

    for value in &schema.enum_values {
        let value = value_to_string(value);
        values.entry(value.clone()).or_insert(AllowedValue {
            name: value.clone(),
            value,
            description: String::new(),
        });
    }

    for branch in schema.one_of.iter().filter_map(SchemaRef::as_inline) {
        let Some(constant) = &branch.const_value else {
            continue;
        };
        let value = value_to_string(constant);
        values.entry(value.clone()).or_insert(AllowedValue {
            name: branch.title.clone().unwrap_or_else(|| value.clone()),
            value,
            description: branch.description.clone().unwrap_or_default(),
        });
    }

    match schema.extensions.get("x-enum-descriptions") {
        Some(Value::Object(descriptions)) => {
            for (value, description) in descriptions {
                if let Some(entry) = values.get_mut(value) {
                    entry.description = value_to_string(description);
                }
            }
        }
        Some(Value::Array(descriptions)) => {
            for (value, description) in schema.enum_values.iter().zip(descriptions) {
                if let Some(entry) = values.get_mut(&value_to_string(value)) {
                    entry.description = value_to_string(description);
                }
            }
        }
        _ => {}
    }

    let ms_values = schema
        .extensions
        .get("x-ms-enum")
        .and_then(|ext| ext.get("values"))
        .and_then(Value::as_array);
    for entry in ms_values.into_iter().flatten() {
        let Some(value) = entry.get("value").map(value_to_string) else {
            continue;
        };
        let field = |key: &str| entry.get(key).map(value_to_string).unwrap_or_default();
        let name = field("name");
        values.entry(value.clone()).or_insert(AllowedValue {
            name: if name.is_empty() { value.clone() } else { name },
            value,
            description: field("description"),
        });
    }

    values
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::backends::GoGenerator;
    use crate::openapi::parse_document;

    const PETSTORE: &str = r#"
openapi: 3.0.3
info:
  title: Petstore API
  description: Pets
  version: 1.0.0
servers:
  - url: https://petstore.example.com/v1/
  - url: unix:///var/run/pets.sock
tags:
  - name: pets
    description: Pet operations
paths:
  /pets/{petId}:
    get:
      operationId: getPet
      tags: [pets]
      x-stability: beta
      parameters:
        - name: petId
          in: path
          required: true
          schema: {type: integer, format: int64}
        - $ref: '#/components/parameters/Status'
        - name: petId
          in: query
          schema: {type: string}
      responses:
        '200':
          description: ok
          content:
            application/json:
              schema: {$ref: '#/components/schemas/Pet'}
    put:
      operationId: updatePet
      requestBody:
        content:
          application/json:
            schema: {$ref: '#/components/schemas/Pet'}
      responses:
        '204':
          description: updated
components:
  parameters:
    Status:
      name: status
      in: query
      schema: {$ref: '#/components/schemas/Status'}
  schemas:
    Pet:
      type: object
      title: Pet
      required: [id]
      properties:
        id: {type: integer, format: int64}
        tags:
          type: array
          items: {type: string}
        status: {$ref: '#/components/schemas/Status'}
    Status:
      type: string
      title: Status
      enum: [available, sold]
      x-enum-descriptions:
        available: Ready for adoption
    PetIds:
      type: array
      title: PetIds
      items: {type: integer}
  securitySchemes:
    token:
      type: http
      scheme: Bearer
    key:
      type: apiKey
      name: X-Key
      in: header
"#;

    fn build() -> DocumentModel {
        let doc = parse_document(PETSTORE.as_bytes()).unwrap();
        build_template_data(&doc, &GoGenerator::new(), Packages::default()).unwrap()
    }

    #[test]
    fn test_document_metadata() {
        let model = build();
        assert_eq!(model.name, "Petstore");
        assert_eq!(model.display_name, "Petstore");
        assert_eq!(model.endpoints[0].url, "https://petstore.example.com/v1");
        assert_eq!(model.endpoints[1].endpoint_type, EndpointType::Socket);
        assert!(model.auth.has_auth_scheme("bearer"));
        assert!(model.auth.has_auth_scheme("apikey"));
        assert_eq!(model.services["pets"].type_name, "PetstorePets");
        assert_eq!(model.services["pets"].operations.len(), 1);
    }

    #[test]
    fn test_operation_parameters() {
        let model = build();
        let get = &model.operations[0];
        assert_eq!(get.name, "GetPet");
        assert_eq!(get.stability, "beta");
        assert_eq!(get.tag, "pets");
        // the duplicate petId query parameter is dropped
        assert_eq!(get.parameters.len(), 2);
        assert_eq!(get.path_parameters[0].code_type.declaration, "int64");
        let status = &get.query_parameters[0];
        assert_eq!(status.kind, ValueKind::Enum);
        assert_eq!(status.code_type.qualified_declaration, "*enums.Status");
        assert_eq!(get.return_type.qualified_declaration, "*models.Pet");
    }

    #[test]
    fn test_request_body_parameters() {
        let model = build();
        let put = &model.operations[1];
        assert_eq!(put.tag, "default");
        assert!(put.return_type.is_void);
        let content_type = &put.header_parameters[0];
        assert_eq!(content_type.field_name, "Content-Type");
        assert_eq!(content_type.static_value.as_deref(), Some("application/json"));
        let payload = put.parameters.last().unwrap();
        assert_eq!(payload.location, "body");
        assert_eq!(payload.code_type.name, "Pet");
    }

    #[test]
    fn test_models_and_enums() {
        let model = build();
        let pet = &model.models[0];
        assert_eq!(pet.name, "Pet");
        assert_eq!(pet.properties[0].code_type.declaration, "int64");
        assert_eq!(pet.properties[1].code_type.declaration, "[]string");
        assert_eq!(pet.properties[2].kind, ValueKind::Enum);

        let ids = &model.models[1];
        assert!(ids.is_type_alias);
        assert_eq!(ids.parent.as_ref().unwrap().declaration, "[]int64");

        let status = &model.enums[0];
        assert_eq!(status.name, "Status");
        assert_eq!(status.allowed_values["available"].name, "Available");
        assert_eq!(
            status.allowed_values["available"].description,
            "Ready for adoption"
        );
    }

    #[test]
    fn test_untitled_inline_object_fails() {
        let doc = parse_document(
            r#"
openapi: 3.0.3
info: {title: T, version: '1'}
paths:
  /a:
    get:
      operationId: a
      responses:
        '200':
          description: ok
          content:
            application/json:
              schema:
                type: object
                properties:
                  id: {type: string}
"#
            .as_bytes(),
        )
        .unwrap();
        let err = build_template_data(&doc, &GoGenerator::new(), Packages::default())
            .err()
            .unwrap();
        assert!(err.to_string().contains("/a:get:responseType:200"));
    }

    #[test]
    fn test_allowed_values_from_extensions() {
        let schema: Schema = serde_yaml::from_str(
            r#"
type: string
oneOf:
  - {const: asc, title: Ascending}
x-ms-enum:
  name: Order
  values:
    - {value: desc, name: Descending, description: Largest first}
"#,
        )
        .unwrap();
        let values = allowed_values(&schema);
        assert_eq!(values["asc"].name, "Ascending");
        assert_eq!(values["desc"].description, "Largest first");
    }
}
