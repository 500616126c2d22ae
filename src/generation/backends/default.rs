//! Language-neutral backend: names pass through untouched and types keep
//! their schema spelling. Used for scaffolding and template debugging.

use crate::generation::code_type::CodeType;
use crate::generation::traits::CodeGenerator;
use crate::generation::types::Language;

#[derive(Debug, Default)]
pub struct DefaultGenerator;

impl DefaultGenerator {
    pub fn new() -> Self {
        DefaultGenerator
    }
}

impl CodeGenerator for DefaultGenerator {
    fn id(&self) -> &'static str {
        "default"
    }

    fn description(&self) -> &'static str {
        "Renders templates against the raw document model without a target language"
    }

    fn language(&self) -> Language {
        Language::Default
    }

    fn to_class_name(&self, name: &str) -> String {
        name.to_string()
    }

    fn to_function_name(&self, name: &str) -> String {
        name.to_string()
    }

    fn to_property_name(&self, name: &str) -> String {
        name.to_string()
    }

    fn to_parameter_name(&self, name: &str) -> String {
        name.to_string()
    }

    fn to_constant_name(&self, name: &str) -> String {
        name.to_string()
    }

    fn primitive_type(
        &self,
        type_name: &str,
        format: Option<&str>,
        nullable: bool,
    ) -> Option<CodeType> {
        let name = match format {
            Some(format) if !format.is_empty() => format!("{type_name}:{format}"),
            _ => type_name.to_string(),
        };
        Some(CodeType::simple(&name, nullable))
    }

    fn any_type(&self) -> &'static str {
        "any"
    }

    fn post_process_type(&self, mut code_type: CodeType) -> CodeType {
        if code_type.is_post_processed {
            return code_type;
        }
        code_type.type_args = std::mem::take(&mut code_type.type_args)
            .into_iter()
            .map(|arg| self.post_process_type(arg))
            .collect();
        let declaration = if code_type.is_void {
            "void".to_string()
        } else if code_type.is_composite() {
            let args: Vec<&str> = code_type
                .type_args
                .iter()
                .map(|arg| arg.declaration.as_str())
                .collect();
            let outer = if code_type.is_map { "map" } else { "array" };
            format!("{outer}<{}>", args.join(", "))
        } else {
            code_type.name.clone()
        };
        code_type.qualified_declaration = declaration.clone();
        code_type.declaration = declaration;
        code_type.is_post_processed = true;
        code_type
    }

    fn is_primitive_type(&self, _name: &str) -> bool {
        false
    }

    fn type_to_import(&self, _code_type: &CodeType) -> Option<String> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::code_type::CodeTypeKind;
    use crate::generation::ir::Packages;
    use crate::generation::traits::{Schemas, TypeScope};
    use crate::openapi::{Schema, SchemaRef};

    #[test]
    fn test_names_and_types_pass_through() {
        let generator = DefaultGenerator::new();
        assert_eq!(generator.to_class_name("pet_store"), "pet_store");

        let schema: Schema =
            serde_yaml::from_str("{type: array, items: {type: string, format: uuid}}").unwrap();
        let code_type = generator
            .to_code_type(
                &SchemaRef::from(schema),
                CodeTypeKind::Property,
                true,
                TypeScope::new(&Schemas::new(), &Packages::default()),
            )
            .unwrap();
        let code_type = generator.post_process_type(code_type);
        assert_eq!(code_type.declaration, "array<string:uuid>");
    }
}
