//! TypeScript backend.

use super::naming::{ReservedWords, sanitize};
use crate::core::utils::{to_camel_case, to_pascal_case, to_upper_snake_case};
use crate::generation::code_type::CodeType;
use crate::generation::traits::CodeGenerator;
use crate::generation::types::Language;

const RESERVED: ReservedWords = ReservedWords(&[
    "break", "case", "catch", "class", "const", "continue", "debugger", "default", "delete", "do",
    "else", "enum", "export", "extends", "false", "finally", "for", "function", "if", "import",
    "in", "instanceof", "new", "null", "return", "super", "switch", "this", "throw", "true", "try",
    "typeof", "var", "void", "while", "with", "as", "implements", "interface", "let", "package",
    "private", "protected", "public", "static", "yield", "any", "boolean", "number", "string",
    "symbol", "type", "from", "of",
]);

const PRIMITIVES: &[&str] = &["string", "number", "boolean", "Uint8Array"];

#[derive(Debug, Default)]
pub struct TypeScriptGenerator;

impl TypeScriptGenerator {
    pub fn new() -> Self {
        TypeScriptGenerator
    }
}

impl CodeGenerator for TypeScriptGenerator {
    fn id(&self) -> &'static str {
        "typescript"
    }

    fn description(&self) -> &'static str {
        "Generates TypeScript client code"
    }

    fn language(&self) -> Language {
        Language::TypeScript
    }

    fn to_class_name(&self, name: &str) -> String {
        RESERVED.escape(to_pascal_case(&sanitize(name)), "Model")
    }

    fn to_function_name(&self, name: &str) -> String {
        RESERVED.escape(to_camel_case(&sanitize(name)), "Func")
    }

    fn to_property_name(&self, name: &str) -> String {
        to_camel_case(&sanitize(name))
    }

    fn to_parameter_name(&self, name: &str) -> String {
        RESERVED.escape(to_camel_case(&sanitize(name)), "Param")
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
        let name = match (type_name, format.unwrap_or_default()) {
            ("string", "binary" | "byte") => "Uint8Array",
            ("string", _) => "string",
            ("boolean", _) => "boolean",
            ("integer" | "number", _) => "number",
            _ => return None,
        };
        Some(CodeType::simple(name, nullable))
    }

    fn any_type(&self) -> &'static str {
        "unknown"
    }

    fn sequence_type(&self, item: CodeType, nullable: bool) -> CodeType {
        CodeType::array(item, nullable)
    }

    fn post_process_type(&self, mut code_type: CodeType) -> CodeType {
        if code_type.is_post_processed {
            return code_type;
        }
        if code_type.is_void {
            code_type.declaration = "void".to_string();
            code_type.qualified_declaration = "void".to_string();
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
            // unions need parentheses before the array suffix
            let wrap = |d: &str| {
                if d.contains(' ') {
                    format!("({d})[]")
                } else {
                    format!("{d}[]")
                }
            };
            (wrap(&item.declaration), wrap(&item.qualified_declaration))
        } else if let (true, [key, value]) = (code_type.is_map, args.as_slice()) {
            (
                format!("Record<{}, {}>", key.declaration, value.declaration),
                format!("Record<{}, {}>", key.qualified_declaration, value.qualified_declaration),
            )
        } else {
            (
                code_type.name.clone(),
                format!("{}{}", code_type.qualifier("."), code_type.name),
            )
        };

        if code_type.is_nullable && code_type.name != self.any_type() {
            code_type.declaration = format!("{declaration} | null");
            code_type.qualified_declaration = format!("{qualified} | null");
        } else {
            code_type.declaration = declaration;
            code_type.qualified_declaration = qualified;
        }
        code_type.is_post_processed = true;
        code_type
    }

    fn is_primitive_type(&self, name: &str) -> bool {
        PRIMITIVES.contains(&name)
    }

    fn type_to_import(&self, _code_type: &CodeType) -> Option<String> {
        None
    }
}
