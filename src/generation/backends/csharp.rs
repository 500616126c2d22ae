//! C# backend.

use super::naming::{ReservedWords, sanitize};
use crate::core::utils::{to_camel_case, to_pascal_case};
use crate::generation::code_type::CodeType;
use crate::generation::traits::CodeGenerator;
use crate::generation::types::Language;

const RESERVED: ReservedWords = ReservedWords(&[
    "abstract", "as", "base", "bool", "break", "byte", "case", "catch", "char", "checked", "class",
    "const", "continue", "decimal", "default", "delegate", "do", "double", "else", "enum", "event",
    "explicit", "extern", "false", "finally", "fixed", "float", "for", "foreach", "goto", "if",
    "implicit", "in", "int", "interface", "internal", "is", "lock", "long", "namespace", "new",
    "null", "object", "operator", "out", "override", "params", "private", "protected", "public",
    "readonly", "ref", "return", "sbyte", "sealed", "short", "sizeof", "stackalloc", "static",
    "string", "struct", "switch", "this", "throw", "true", "try", "typeof", "uint", "ulong",
    "unchecked", "unsafe", "ushort", "using", "virtual", "void", "volatile", "while",
]);

const PRIMITIVES: &[&str] = &[
    "string", "bool", "short", "int", "long", "float", "double", "byte", "byte[]",
];

#[derive(Debug, Default)]
pub struct CSharpGenerator;

impl CSharpGenerator {
    pub fn new() -> Self {
        CSharpGenerator
    }
}

impl CodeGenerator for CSharpGenerator {
    fn id(&self) -> &'static str {
        "csharp"
    }

    fn description(&self) -> &'static str {
        "Generates C# client code"
    }

    fn language(&self) -> Language {
        Language::CSharp
    }

    fn to_class_name(&self, name: &str) -> String {
        to_pascal_case(&RESERVED.escape(sanitize(name), "Model"))
    }

    fn to_function_name(&self, name: &str) -> String {
        to_pascal_case(&sanitize(name))
    }

    fn to_property_name(&self, name: &str) -> String {
        to_pascal_case(&sanitize(name))
    }

    /// Parameters collide with keywords after camel-casing, so escape with `@`.
    fn to_parameter_name(&self, name: &str) -> String {
        let name = to_camel_case(&sanitize(name));
        if RESERVED.contains(&name) {
            format!("@{name}")
        } else {
            name
        }
    }

    fn to_constant_name(&self, name: &str) -> String {
        to_pascal_case(&sanitize(name))
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
                CodeType::simple("DateTimeOffset", nullable).with_import("System")
            }
            ("string", _) => CodeType::simple("string", nullable),
            ("boolean", _) => CodeType::simple("bool", nullable),
            ("integer", "int16") => CodeType::simple("short", nullable),
            ("integer", "int64") => CodeType::simple("long", nullable),
            ("integer", _) => CodeType::simple("int", nullable),
            ("number", "float") => CodeType::simple("float", nullable),
            ("number", _) => CodeType::simple("double", nullable),
            _ => return None,
        };
        Some(code_type)
    }

    fn any_type(&self) -> &'static str {
        "object"
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
        let (declaration, qualified) = if let (true, [item]) = (code_type.is_array, args.as_slice())
        {
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
                format!("Dictionary<{}, {}>", key.declaration, value.declaration),
                format!(
                    "Dictionary<{}, {}>",
                    key.qualified_declaration, value.qualified_declaration
                ),
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
        if code_type.is_list || code_type.is_map {
            return Some("System.Collections.Generic".to_string());
        }
        match code_type.name.as_str() {
            "DateTimeOffset" => Some("System".to_string()),
            _ => None,
        }
    }
}
