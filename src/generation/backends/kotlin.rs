//! Kotlin (multiplatform) backend.

use super::java::{jvm_root_package, require_artifact_coordinates};
use super::naming::{ReservedWords, expand_leading_underscore, sanitize};
use crate::core::GeneratorConfig;
use crate::core::utils::{to_camel_case, to_pascal_case, to_upper_snake_case};
use crate::generation::code_type::CodeType;
use crate::generation::errors::GenerationError;
use crate::generation::ir::Packages;
use crate::generation::traits::CodeGenerator;
use crate::generation::types::Language;

const RESERVED: ReservedWords = ReservedWords(&[
    "as", "break", "class", "continue", "do", "else", "false", "for", "fun", "if", "in",
    "interface", "is", "null", "object", "package", "return", "super", "this", "throw", "true",
    "try", "typealias", "typeof", "val", "var", "when", "while", "abstract", "boolean", "byte",
    "case", "catch", "char", "const", "default", "double", "enum", "extends", "final", "finally",
    "float", "goto", "implements", "import", "instanceof", "int", "list", "long", "native", "new",
    "private", "protected", "public", "short", "static", "switch", "synchronized", "throws",
    "transient", "void", "volatile",
]);

const PRIMITIVES: &[&str] = &[
    "String", "Boolean", "Short", "Int", "Long", "Float", "Double", "Byte", "Char", "ByteArray",
];

#[derive(Debug, Default)]
pub struct KotlinGenerator;

impl KotlinGenerator {
    pub fn new() -> Self {
        KotlinGenerator
    }
}

impl CodeGenerator for KotlinGenerator {
    fn id(&self) -> &'static str {
        "kotlin"
    }

    fn description(&self) -> &'static str {
        "Generates Kotlin client code"
    }

    fn language(&self) -> Language {
        Language::Kotlin
    }

    fn packages(&self, config: &GeneratorConfig) -> Packages {
        let root = jvm_root_package(config);
        Packages {
            client: format!("{root}.client"),
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
        to_pascal_case(&RESERVED.escape(sanitize(name), "Model"))
    }

    fn to_function_name(&self, name: &str) -> String {
        to_camel_case(&RESERVED.escape(sanitize(name), "Func"))
    }

    fn to_property_name(&self, name: &str) -> String {
        let name = expand_leading_underscore(name);
        to_camel_case(&RESERVED.escape(sanitize(&name), "Prop"))
    }

    fn to_parameter_name(&self, name: &str) -> String {
        self.to_property_name(name)
    }

    fn to_constant_name(&self, name: &str) -> String {
        to_upper_snake_case(&RESERVED.escape(sanitize(name), "_CONST"))
    }

    fn primitive_type(
        &self,
        type_name: &str,
        format: Option<&str>,
        nullable: bool,
    ) -> Option<CodeType> {
        let code_type = match (type_name, format.unwrap_or_default()) {
            ("string", "binary" | "byte") => CodeType::simple("ByteArray", nullable),
            ("string", "date" | "date-time") => {
                CodeType::simple("Instant", nullable).with_import("kotlinx.datetime")
            }
            ("string", _) => CodeType::simple("String", nullable),
            ("boolean", _) => CodeType::simple("Boolean", nullable),
            ("integer", "int16") => CodeType::simple("Short", nullable),
            ("integer", "int32") => CodeType::simple("Int", nullable),
            ("integer", _) => CodeType::simple("Long", nullable),
            ("number", "float") => CodeType::simple("Float", nullable),
            ("number", _) => CodeType::simple("Double", nullable),
            _ => return None,
        };
        Some(code_type)
    }

    fn any_type(&self) -> &'static str {
        "Any"
    }

    fn post_process_type(&self, mut code_type: CodeType) -> CodeType {
        if code_type.is_post_processed {
            return code_type;
        }
        if code_type.is_void {
            code_type.declaration = "Unit".to_string();
            code_type.qualified_declaration = "Unit".to_string();
            code_type.is_post_processed = true;
            return code_type;
        }
        code_type.type_args = std::mem::take(&mut code_type.type_args)
            .into_iter()
            .map(|arg| self.post_process_type(arg))
            .collect();

        let args = &code_type.type_args;
        let (declaration, qualified) = if let (true, [item]) =
            (code_type.is_array || code_type.is_list, args.as_slice())
        {
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
            (
                code_type.name.clone(),
                code_type.fully_qualified_name("."),
            )
        };

        let marker = if code_type.is_nullable { "?" } else { "" };
        code_type.declaration = format!("{declaration}{marker}");
        code_type.qualified_declaration = format!("{qualified}{marker}");
        code_type.is_post_processed = true;
        code_type
    }

    fn is_primitive_type(&self, name: &str) -> bool {
        PRIMITIVES.contains(&name.trim_end_matches('?'))
    }

    fn type_to_import(&self, code_type: &CodeType) -> Option<String> {
        match code_type.name.as_str() {
            "Instant" => Some("kotlinx.datetime.Instant".to_string()),
            _ => None,
        }
    }
}
