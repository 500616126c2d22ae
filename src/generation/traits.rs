//! The per-language backend interface and the schema-to-type mapping every
//! backend shares.

use indexmap::IndexMap;
use serde_json::Value;

use super::code_type::{CodeType, CodeTypeKind};
use super::errors::GenerationError;
use super::ir::Packages;
use super::types::Language;
use crate::core::GeneratorConfig;
use crate::openapi::{AdditionalProperties, Schema, SchemaRef};

pub type Schemas = IndexMap<String, SchemaRef>;

/// What type mapping resolves against: the component schemas and the
/// packages named types live in.
#[derive(Debug, Clone, Copy)]
pub struct TypeScope<'a> {
    pub schemas: &'a Schemas,
    pub packages: &'a Packages,
}

impl<'a> TypeScope<'a> {
    pub fn new(schemas: &'a Schemas, packages: &'a Packages) -> Self {
        TypeScope { schemas, packages }
    }
}

/// A target-language backend: naming rules plus type mapping.
///
/// Backends describe their scalar table, collection shape and declaration
/// syntax; [`CodeGenerator::to_code_type`] walks the schema with them.
pub trait CodeGenerator: Send + Sync {
    /// Unique id, also the registry key
    fn id(&self) -> &'static str;

    fn description(&self) -> &'static str;

    fn language(&self) -> Language;

    /// Output packages for this run; named types are qualified with them.
    fn packages(&self, _config: &GeneratorConfig) -> Packages {
        Packages::default()
    }

    /// Rejects runs missing options the backend needs.
    fn validate_config(&self, _config: &GeneratorConfig) -> Result<(), GenerationError> {
        Ok(())
    }

    fn to_class_name(&self, name: &str) -> String;

    fn to_function_name(&self, name: &str) -> String;

    fn to_property_name(&self, name: &str) -> String;

    fn to_parameter_name(&self, name: &str) -> String;

    fn to_constant_name(&self, name: &str) -> String;

    /// Scalar mapping for a JSON type and format. `None` if unsupported.
    fn primitive_type(&self, type_name: &str, format: Option<&str>, nullable: bool)
    -> Option<CodeType>;

    /// Type used for untyped values and heterogeneous unions.
    fn any_type(&self) -> &'static str;

    fn sequence_type(&self, item: CodeType, nullable: bool) -> CodeType {
        CodeType::list(item, nullable)
    }

    fn to_code_type(
        &self,
        slot: &SchemaRef,
        kind: CodeTypeKind,
        required: bool,
        scope: TypeScope<'_>,
    ) -> Result<CodeType, GenerationError> {
        map_code_type(self, slot, kind, required, scope)
    }

    /// Fills declarations bottom-up and applies nullable boxing.
    fn post_process_type(&self, code_type: CodeType) -> CodeType;

    fn is_primitive_type(&self, name: &str) -> bool;

    /// Import needed to use the type, if any.
    fn type_to_import(&self, code_type: &CodeType) -> Option<String>;
}

fn unsupported(message: String) -> GenerationError {
    GenerationError::UnsupportedSchema(message)
}

/// Schemas that become their own generated type rather than being inlined.
pub fn is_named_type(schema: &Schema) -> bool {
    schema.is_enum()
        || (schema.is_object() && !schema.properties.is_empty())
        || !schema.all_of.is_empty()
        || schema.any_of.len() > 1
        || schema.one_of.len() > 1
}

fn json_type_of(value: &Value) -> &'static str {
    match value {
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "number",
        Value::Number(_) => "integer",
        _ => "string",
    }
}

pub fn map_code_type<G: CodeGenerator + ?Sized>(
    generator: &G,
    slot: &SchemaRef,
    kind: CodeTypeKind,
    required: bool,
    scope: TypeScope<'_>,
) -> Result<CodeType, GenerationError> {
    let schema = match slot {
        SchemaRef::Reference { reference } => {
            let target = slot
                .resolve(scope.schemas)
                .ok_or_else(|| unsupported(format!("unresolved reference {reference}")))?;
            if let Some(name) = slot.ref_name().filter(|_| is_named_type(target)) {
                let nullable = !required || target.is_nullable();
                let package = if target.is_enum() {
                    &scope.packages.enums
                } else {
                    &scope.packages.models
                };
                return Ok(CodeType::simple(&generator.to_class_name(name), nullable)
                    .with_import(package));
            }
            target
        }
        SchemaRef::Inline(schema) => schema.as_ref(),
    };
    map_schema(generator, schema, kind, required, scope)
}

fn map_schema<G: CodeGenerator + ?Sized>(
    generator: &G,
    schema: &Schema,
    kind: CodeTypeKind,
    required: bool,
    scope: TypeScope<'_>,
) -> Result<CodeType, GenerationError> {
    let nullable = !required || schema.is_nullable();
    let types: Vec<&str> = schema.schema_type.iter().filter(|t| *t != "null").collect();
    let format = schema.format.as_deref();

    if types.len() > 1 {
        return Ok(CodeType::simple(generator.any_type(), nullable));
    }

    match types.first().copied() {
        Some("array") => {
            let items = schema
                .items
                .as_ref()
                .ok_or_else(|| unsupported("array schema without items".to_string()))?;
            let item = generator.to_code_type(items, kind, true, scope)?;
            Ok(generator.sequence_type(generator.post_process_type(item), nullable))
        }
        Some("object") => map_object(generator, schema, kind, nullable, scope),
        Some(scalar) => generator
            .primitive_type(scalar, format, nullable)
            .ok_or_else(|| {
                unsupported(format!(
                    "unhandled type. schema: {scalar}, format: {}",
                    format.unwrap_or_default()
                ))
            }),
        None => map_untyped(generator, schema, kind, nullable, scope),
    }
}

fn map_object<G: CodeGenerator + ?Sized>(
    generator: &G,
    schema: &Schema,
    kind: CodeTypeKind,
    nullable: bool,
    scope: TypeScope<'_>,
) -> Result<CodeType, GenerationError> {
    let key = || generator.primitive_type("string", None, false).unwrap_or_default();
    if schema.properties.is_empty() {
        match &schema.additional_properties {
            Some(AdditionalProperties::Schema(value)) => {
                let value = generator.to_code_type(value, kind, true, scope)?;
                let value = generator.post_process_type(value);
                return Ok(CodeType::map(key(), value, nullable));
            }
            Some(AdditionalProperties::Allowed(true)) => {
                let any = CodeType::simple(generator.any_type(), false);
                return Ok(CodeType::map(key(), any, nullable));
            }
            _ if !is_named_type(schema) => {
                return Ok(CodeType::simple(generator.any_type(), nullable));
            }
            _ => {}
        }
    }
    match schema.title.as_deref().filter(|t| !t.is_empty()) {
        Some(title) => Ok(CodeType::simple(&generator.to_class_name(title), nullable)
            .with_import(&scope.packages.models)),
        None => Err(unsupported(
            "schema does not have a title. schema: object".to_string(),
        )),
    }
}

fn map_untyped<G: CodeGenerator + ?Sized>(
    generator: &G,
    schema: &Schema,
    kind: CodeTypeKind,
    nullable: bool,
    scope: TypeScope<'_>,
) -> Result<CodeType, GenerationError> {
    if let Some(value) = &schema.const_value {
        return generator
            .primitive_type(json_type_of(value), None, nullable)
            .ok_or_else(|| unsupported("unhandled const type".to_string()));
    }
    if let Some(first) = schema.enum_values.first() {
        return generator
            .primitive_type(json_type_of(first), schema.format.as_deref(), nullable)
            .ok_or_else(|| unsupported("unhandled enum type".to_string()));
    }

    let branches = if !schema.one_of.is_empty() {
        &schema.one_of
    } else if !schema.any_of.is_empty() {
        &schema.any_of
    } else if schema.all_of.len() == 1 {
        &schema.all_of
    } else {
        if !schema.properties.is_empty() || schema.additional_properties.is_some() {
            return map_object(generator, schema, kind, nullable, scope);
        }
        return Ok(CodeType::simple(generator.any_type(), nullable));
    };

    let mapped = branches
        .iter()
        .map(|branch| generator.to_code_type(branch, kind, true, scope))
        .collect::<Result<Vec<_>, _>>()?;
    match mapped.split_first() {
        Some((first, rest)) if rest.iter().all(|ct| ct.name == first.name) => {
            let mut first = first.clone();
            first.is_nullable = nullable;
            Ok(first)
        }
        _ => Ok(CodeType::simple(generator.any_type(), nullable)),
    }
}
