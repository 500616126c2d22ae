//! Python backend, typed with PEP 585 generics.

use super::naming::{ReservedWords, sanitize};
use crate::core::utils::{to_pascal_case, to_snake_case, to_upper_snake_case};
use crate::generation::code_type::CodeType;
use crate::generation::traits::CodeGenerator;
use crate::generation::types::Language;

const RESERVED: ReservedWords = ReservedWords(&[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class", "continue",
    "def", "del", "elif", "else", "except", "finally", "for", "from", "global", "if", "import",
    "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return", "try", "while",
    "with", "yield", "self", "type", "id", "list", "dict", "str", "int", "float", "bool", "bytes",
]);

const PRIMITIVES: &[&str] = &["str", "int", "float", "bool", "bytes", "datetime"];

#[derive(Debug, Default)]
pub struct PythonGenerator;

impl PythonGenerator {
    pub fn new() -> Self {
        PythonGenerator
    }
}

impl CodeGenerator for PythonGenerator {
    fn id(&self) -> &'static str {
        "python"
    }

    fn description(&self) -> &'static str {
        "Generates Python client code"
    }

    fn language(&self) -> Language {
        Language::Python
    }

    fn to_class_name(&self, name: &str) -> String {
        RESERVED.escape(to_pascal_case(&sanitize(name)), "Model")
    }

    fn to_function_name(&self, name: &str) -> String {
        RESERVED.escape(to_snake_case(&sanitize(name)), "_")
    }

    fn to_property_name(&self, name: &str) -> String {
        RESERVED.escape(to_snake_case(&sanitize(name)), "_")
    }

    fn to_parameter_name(&self, name: &str) -> String {
        RESERVED.escape(to_snake_case(&sanitize(name)), "_")
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
            ("string", "binary" | "byte") => CodeType::simple("bytes", nullable),
            ("string", "date-time") => {
                CodeType::simple("datetime", nullable).with_import("datetime")
            }
            ("string", _) => CodeType::simple("str", nullable),
            ("boolean", _) => CodeType::simple("bool", nullable),
            ("integer", _) => CodeType::simple("int", nullable),
            ("number", _) => CodeType::simple("float", nullable),
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
            code_type.declaration = "None".to_string();
            code_type.qualified_declaration = "None".to_string();
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
                format!("list[{}]", item.declaration),
                format!("list[{}]", item.qualified_declaration),
            )
        } else if let (true, [key, value]) = (code_type.is_map, args.as_slice()) {
            (
                format!("dict[{}, {}]", key.declaration, value.declaration),
                format!("dict[{}, {}]", key.qualified_declaration, value.qualified_declaration),
            )
        } else {
            (
                code_type.name.clone(),
                format!("{}{}", code_type.qualifier("."), code_type.name),
            )
        };

        if code_type.is_nullable && code_type.name != self.any_type() {
            code_type.declaration = format!("Optional[{declaration}]");
            code_type.qualified_declaration = format!("Optional[{qualified}]");
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

    fn type_to_import(&self, code_type: &CodeType) -> Option<String> {
        match code_type.name.as_str() {
            "datetime" => Some("from datetime import datetime".to_string()),
            "Any" => Some("from typing import Any".to_string()),
            _ if code_type.is_nullable => Some("from typing import Optional".to_string()),
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
        let python = PythonGenerator::new();
        let code_type = python
            .to_code_type(
                &SchemaRef::from(schema),
                CodeTypeKind::Property,
                required,
                TypeScope::new(&Schemas::new(), &Packages::default()),
            )
            .unwrap();
        python.post_process_type(code_type)
    }

    #[test]
    fn test_types() {
        assert_eq!(map("type: integer", true).declaration, "int");
        assert_eq!(map("type: integer", false).declaration, "Optional[int]");
        assert_eq!(
            map("{type: array, items: {type: string}}", true).declaration,
            "list[str]"
        );
        assert_eq!(
            map("{type: object, additionalProperties: true}", true).declaration,
            "dict[str, Any]"
        );
    }

    #[test]
    fn test_naming() {
        let python = PythonGenerator::new();
        assert_eq!(python.to_function_name("findPetsByStatus"), "find_pets_by_status");
        assert_eq!(python.to_parameter_name("from"), "from_");
        assert_eq!(python.to_class_name("pet_store"), "PetStore");
    }
}
