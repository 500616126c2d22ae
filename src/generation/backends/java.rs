//! Java backend.

use super::naming::{ReservedWords, sanitize};
use crate::core::GeneratorConfig;
use crate::core::utils::{to_camel_case, to_pascal_case, to_upper_snake_case};
use crate::generation::code_type::CodeType;
use crate::generation::errors::GenerationError;
use crate::generation::ir::Packages;
use crate::generation::traits::CodeGenerator;
use crate::generation::types::Language;

pub(super) const JVM_RESERVED: ReservedWords = ReservedWords(&[
    "abstract", "assert", "boolean", "break", "byte", "case", "catch", "char", "class", "const",
    "continue", "default", "do", "double", "else", "enum", "extends", "final", "finally", "float",
    "for", "goto", "if", "implements", "import", "instanceof", "int", "interface", "list", "long",
    "native", "new", "null", "object", "offsetdatetime", "package", "private", "protected",
    "public", "return", "short", "static", "strictfp", "stringutil", "super", "switch",
    "synchronized", "this", "throw", "throws", "transient", "try", "void", "volatile", "while",
]);

const PRIMITIVES: &[&str] = &[
    "String", "boolean", "int", "long", "float", "double", "byte", "char",
];

fn boxed(name: &str) -> &str {
    match name {
        "boolean" => "Boolean",
        "int" => "Integer",
        "long" => "Long",
        "short" => "Short",
        "float" => "Float",
        "double" => "Double",
        "byte" => "Byte",
        "char" => "Character",
        other => other,
    }
}

/// `group.artifact` with dashes turned into package separators.
pub(super) fn jvm_root_package(config: &GeneratorConfig) -> String {
    format!("{}.{}", config.artifact_group_id, config.artifact_id).replace('-', ".")
}

pub(super) fn require_artifact_coordinates(
    config: &GeneratorConfig,
    generator: &str,
) -> Result<(), GenerationError> {
    if config.artifact_group_id.is_empty() || config.artifact_id.is_empty() {
        return Err(GenerationError::ValidationError(format!(
            "artifact group id and artifact id are required for the {generator} generator"
        )));
    }
    Ok(())
}

#[derive(Debug, Default)]
pub struct JavaGenerator;

impl JavaGenerator {
    pub fn new() -> Self {
        JavaGenerator
    }
}

impl CodeGenerator for JavaGenerator {
    fn id(&self) -> &'static str {
        "java"
    }

    fn description(&self) -> &'static str {
        "Generates Java client code"
    }

    fn language(&self) -> Language {
        Language::Java
    }

    fn packages(&self, config: &GeneratorConfig) -> Packages {
        let root = jvm_root_package(config);
        Packages {
            client: root.clone(),
            models: format!("{root}.models"),
            enums: format!("{root}.enums"),
            operations: format!("{root}.operations"),
            auth: format!("{root}.auth"),
            root,
        }
    }

    fn validate_config(&self, config: &GeneratorConfig) -> Result<(), GenerationError> {
        require_artifact_coordinates(config, self.id())
    }

    fn to_class_name(&self, name: &str) -> String {
        JVM_RESERVED.escape(to_pascal_case(&sanitize(name)), "Model")
    }

    fn to_function_name(&self, name: &str) -> String {
        JVM_RESERVED.escape(to_camel_case(&sanitize(name)), "Func")
    }

    fn to_property_name(&self, name: &str) -> String {
        JVM_RESERVED.escape(to_camel_case(&sanitize(name)), "Prop")
    }

    fn to_parameter_name(&self, name: &str) -> String {
        JVM_RESERVED.escape(to_camel_case(&sanitize(name)), "Prop")
    }

    fn to_constant_name(&self, name: &str) -> String {
        to_upper_snake_case(&sanitize(name))
    }

    fn primitive_type(
        &self,
        type_name: &str,
        format: Option<&str>,
        nullable: bool,
    ) -> Option<CodeType> {
        let code_type = match (type_name, format.unwrap_or_default()) {
            ("string", "binary" | "byte") => CodeType::simple("byte[]", nullable),
            ("string", "date" | "date-time") => {
                CodeType::simple("OffsetDateTime", nullable).with_import("java.time")
            }
            ("string", _) => CodeType::simple("String", nullable),
            ("boolean", _) => CodeType::simple("boolean", nullable),
            ("integer", "int64") => CodeType::simple("long", nullable),
            ("integer", _) => CodeType::simple("int", nullable),
            ("number", "float") => CodeType::simple("float", nullable),
            ("number", _) => CodeType::simple("double", nullable),
            _ => return None,
        };
        Some(code_type)
    }

    fn any_type(&self) -> &'static str {
        "Object"
    }

    fn post_process_type(&self, mut code_type: CodeType) -> CodeType {
        if code_type.is_post_processed {
            return code_type;
        }
        // generic arguments must be reference types
        code_type.type_args = std::mem::take(&mut code_type.type_args)
            .into_iter()
            .map(|mut arg| {
                arg.is_nullable = true;
                arg.is_post_processed = false;
                self.post_process_type(arg)
            })
            .collect();

        let args = &code_type.type_args;
        let (declaration, qualified) = if code_type.is_void {
            ("void".to_string(), "void".to_string())
        } else if let (true, [item]) = (code_type.is_array, args.as_slice()) {
            (
                format!("{}[]", item.declaration),
                format!("{}[]", item.qualified_declaration),
            )
        } else if let (true, [item]) = (code_type.is_list, args.as_slice()) {
            (
                format!("List<{}>", item.declaration),
                format!("List<{}>", item.qualified_declaration),
            )
        } else if let (true, [key, value]) = (code_type.is_map, args.as_slice()) {
            (
                format!("Map<{}, {}>", key.declaration, value.declaration),
                format!("Map<{}, {}>", key.qualified_declaration, value.qualified_declaration),
            )
        } else {
            let name = if code_type.is_nullable {
                boxed(&code_type.name)
            } else {
                &code_type.name
            };
            let qualified = match code_type.import_path.as_deref().filter(|p| !p.is_empty()) {
                Some(path) => format!("{path}.{name}"),
                None => name.to_string(),
            };
            (name.to_string(), qualified)
        };

        code_type.declaration = declaration;
        code_type.qualified_declaration = qualified;
        code_type.is_post_processed = true;
        code_type
    }

    fn is_primitive_type(&self, name: &str) -> bool {
        PRIMITIVES.contains(&name)
    }

    fn type_to_import(&self, code_type: &CodeType) -> Option<String> {
        if code_type.is_list {
            return Some("java.util.List".to_string());
        }
        if code_type.is_map {
            return Some("java.util.Map".to_string());
        }
        match code_type.name.as_str() {
            "OffsetDateTime" => Some("java.time.OffsetDateTime".to_string()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::code_type::CodeTypeKind;
    use crate::generation::ir::Packages;
    use crate::generation::traits::{Schemas, TypeScope};
    use crate::openapi::{Schema, SchemaRef};

    fn map(yaml: &str, required: bool) -> CodeType {
        let schema: Schema = serde_yaml::from_str(yaml).unwrap();
        let java = JavaGenerator::new();
        let code_type = java
            .to_code_type(
                &SchemaRef::from(schema),
                CodeTypeKind::Property,
                required,
                TypeScope::new(&Schemas::new(), &Packages::default()),
            )
            .unwrap();
        java.post_process_type(code_type)
    }

    #[test]
    fn test_boxing_follows_nullability() {
        assert_eq!(map("type: integer", true).declaration, "int");
        assert_eq!(map("type: integer", false).declaration, "Integer");
        assert_eq!(map("{type: integer, format: int64}", false).declaration, "Long");
        assert_eq!(map("{type: [boolean, 'null']}", true).declaration, "Boolean");
    }

    #[test]
    fn test_generic_arguments_are_boxed() {
        let list = map("{type: array, items: {type: integer}}", true);
        assert_eq!(list.declaration, "List<Integer>");
        let dict = map("{type: object, additionalProperties: {type: boolean}}", true);
        assert_eq!(dict.declaration, "Map<String, Boolean>");
        let nested = map("{type: array, items: {type: array, items: {type: number}}}", true);
        assert_eq!(nested.declaration, "List<List<Double>>");
    }

    #[test]
    fn test_named_reference_uses_configured_package() {
        let mut schemas = Schemas::new();
        let status: Schema = serde_yaml::from_str("{type: string, enum: [active, inactive]}").unwrap();
        schemas.insert("Status".into(), SchemaRef::from(status));
        let java = JavaGenerator::new();
        let packages = java.packages(&GeneratorConfig {
            artifact_group_id: "io.acme".into(),
            artifact_id: "pets".into(),
            ..Default::default()
        });
        let code_type = java
            .to_code_type(
                &SchemaRef::component("Status"),
                CodeTypeKind::Property,
                true,
                TypeScope::new(&schemas, &packages),
            )
            .unwrap();
        let code_type = java.post_process_type(code_type);
        assert_eq!(code_type.declaration, "Status");
        assert_eq!(code_type.qualified_declaration, "io.acme.pets.enums.Status");
    }

    #[test]
    fn test_qualified_declaration_uses_full_package() {
        let date = map("{type: string, format: date-time}", true);
        assert_eq!(date.qualified_declaration, "java.time.OffsetDateTime");
        let dates = map("{type: array, items: {type: string, format: date}}", true);
        assert_eq!(dates.qualified_declaration, "List<java.time.OffsetDateTime>");
    }

    #[test]
    fn test_void_and_imports() {
        let java = JavaGenerator::new();
        assert_eq!(java.post_process_type(CodeType::void()).declaration, "void");
        let date = map("{type: string, format: date-time}", true);
        assert_eq!(date.declaration, "OffsetDateTime");
        assert_eq!(
            java.type_to_import(&date).as_deref(),
            Some("java.time.OffsetDateTime")
        );
    }

    #[test]
    fn test_packages_from_coordinates() {
        let config = GeneratorConfig {
            artifact_group_id: "io.acme".into(),
            artifact_id: "pet-api".into(),
            ..Default::default()
        };
        let java = JavaGenerator::new();
        assert!(java.validate_config(&config).is_ok());
        let packages = java.packages(&config);
        assert_eq!(packages.client, "io.acme.pet.api");
        assert_eq!(packages.models, "io.acme.pet.api.models");
    }

    #[test]
    fn test_naming() {
        let java = JavaGenerator::new();
        assert_eq!(java.to_function_name("get_pet"), "getPet");
        assert_eq!(java.to_property_name("class"), "classProp");
        assert_eq!(java.to_constant_name("in-progress"), "IN_PROGRESS");
    }
}
