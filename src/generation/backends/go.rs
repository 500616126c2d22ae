//! Go backend: exported Pascal-case identifiers, pointers for optional
//! scalars, slices and maps for collections.

use super::naming::{ReservedWords, sanitize};
use crate::core::GeneratorConfig;
use crate::core::utils::{to_camel_case, to_pascal_case};
use crate::generation::code_type::CodeType;
use crate::generation::errors::GenerationError;
use crate::generation::traits::CodeGenerator;
use crate::generation::types::Language;

const RESERVED: ReservedWords = ReservedWords(&[
    "bool", "break", "byte", "case", "chan", "complex128", "complex64", "const", "continue",
    "default", "defer", "else", "error", "fallthrough", "float32", "float64", "for", "func", "go",
    "goto", "if", "import", "int", "int16", "int32", "int64", "int8", "interface", "map", "nil",
    "package", "range", "return", "rune", "select", "string", "struct", "switch", "type", "uint",
    "uint16", "uint32", "uint64", "uint8", "uintptr", "var",
]);

const PRIMITIVES: &[&str] = &[
    "string", "bool", "int", "int32", "int64", "float32", "float64", "byte", "rune", "time.Time",
];

#[derive(Debug, Default)]
pub struct GoGenerator;

impl GoGenerator {
    pub fn new() -> Self {
        GoGenerator
    }
}

impl CodeGenerator for GoGenerator {
    fn id(&self) -> &'static str {
        "go"
    }

    fn description(&self) -> &'static str {
        "Generates Go client code"
    }

    fn language(&self) -> Language {
        Language::Go
    }

    fn validate_config(&self, config: &GeneratorConfig) -> Result<(), GenerationError> {
        if config.artifact_id.is_empty() {
            return Err(GenerationError::ValidationError(
                "artifact id is required for the go generator".to_string(),
            ));
        }
        Ok(())
    }

    fn to_class_name(&self, name: &str) -> String {
        RESERVED.escape(to_pascal_case(&sanitize(name)), "Model")
    }

    fn to_function_name(&self, name: &str) -> String {
        RESERVED.escape(to_pascal_case(&sanitize(name)), "Func")
    }

    fn to_property_name(&self, name: &str) -> String {
        RESERVED.escape(to_pascal_case(&sanitize(name)), "Prop")
    }

    fn to_parameter_name(&self, name: &str) -> String {
        RESERVED.escape(to_camel_case(&sanitize(name)), "Prop")
    }

    fn to_constant_name(&self, name: &str) -> String {
        RESERVED.escape(to_pascal_case(&sanitize(name)), "Prop")
    }

    fn primitive_type(
        &self,
        type_name: &str,
        format: Option<&str>,
        nullable: bool,
    ) -> Option<CodeType> {
        let name = match (type_name, format.unwrap_or_default()) {
            ("string", "binary" | "byte") => {
                return Some(CodeType::array(CodeType::simple("byte", false), nullable));
            }
            ("string", _) => "string",
            ("boolean", _) => "bool",
            ("integer", "int16") => "int16",
            ("integer", "int32") => "int32",
            ("integer", "uint16") => "uint16",
            ("integer", "uint32") => "uint32",
            ("integer", "uint64") => "uint64",
            ("integer", _) => "int64",
            ("number", "float") => "float32",
            ("number", _) => "float64",
            _ => return None,
        };
        Some(CodeType::simple(name, nullable))
    }

    fn any_type(&self) -> &'static str {
        "interface{}"
    }

    fn sequence_type(&self, item: CodeType, nullable: bool) -> CodeType {
        CodeType::array(item, nullable)
    }

    fn post_process_type(&self, mut code_type: CodeType) -> CodeType {
        if code_type.is_post_processed {
            return code_type;
        }
        code_type.type_args = std::mem::take(&mut code_type.type_args)
            .into_iter()
            .map(|arg| self.post_process_type(arg))
            .collect();

        let qualifier = code_type.qualifier(".");
        let args = &code_type.type_args;
        let (declaration, qualified) = if code_type.is_void {
            (String::new(), String::new())
        } else if let (true, [item]) = (code_type.is_array || code_type.is_list, args.as_slice()) {
            (
                format!("[]{}", item.declaration),
                format!("[]{}", item.qualified_declaration),
            )
        } else if let (true, [key, value]) = (code_type.is_map, args.as_slice()) {
            (
                format!("map[{}]{}", key.declaration, value.declaration),
                format!("map[{}]{}", key.qualified_declaration, value.qualified_declaration),
            )
        } else {
            (code_type.name.clone(), format!("{qualifier}{}", code_type.name))
        };

        let pointer = code_type.is_nullable && !code_type.is_composite() && !code_type.is_void;
        let pointer = if pointer { "*" } else { "" };
        code_type.declaration = format!("{pointer}{declaration}");
        code_type.qualified_declaration = format!("{pointer}{qualified}");
        code_type.is_post_processed = true;
        code_type
    }

    fn is_primitive_type(&self, name: &str) -> bool {
        PRIMITIVES.contains(&name.trim_start_matches('*'))
    }

    fn type_to_import(&self, code_type: &CodeType) -> Option<String> {
        match code_type.name.trim_start_matches('*') {
            "time.Time" => Some("time".to_string()),
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
        let generator = GoGenerator::new();
        let code_type = generator
            .to_code_type(
                &SchemaRef::from(schema),
                CodeTypeKind::Property,
                required,
                TypeScope::new(&Schemas::new(), &Packages::default()),
            )
            .unwrap();
        generator.post_process_type(code_type)
    }

    #[test]
    fn test_naming() {
        let go = GoGenerator::new();
        assert_eq!(go.to_class_name("pet_store"), "PetStore");
        assert_eq!(go.to_parameter_name("pet-id"), "petId");
        assert_eq!(go.to_parameter_name("type"), "typeProp");
        assert_eq!(go.to_function_name("getPetById"), "GetPetById");
    }

    #[test]
    fn test_scalars_and_pointers() {
        assert_eq!(map("type: string", true).declaration, "string");
        assert_eq!(map("type: string", false).declaration, "*string");
        assert_eq!(
            map("{type: integer, format: int32}", true).declaration,
            "int32"
        );
        assert_eq!(map("{type: string, format: binary}", false).declaration, "[]byte");
    }

    #[test]
    fn test_collections() {
        let list = map("{type: array, items: {type: integer}}", false);
        assert_eq!(list.declaration, "[]int64");

        let dict = map(
            "{type: object, additionalProperties: {type: number}}",
            true,
        );
        assert_eq!(dict.declaration, "map[string]float64");
        assert_eq!(map("{type: [string, integer]}", true).declaration, "interface{}");
    }

    #[test]
    fn test_named_reference_is_qualified() {
        let mut schemas = Schemas::new();
        let pet: Schema =
            serde_yaml::from_str("{type: object, title: Pet, properties: {id: {type: string}}}")
                .unwrap();
        schemas.insert("Pet".into(), SchemaRef::from(pet));
        let go = GoGenerator::new();
        let code_type = go
            .to_code_type(
                &SchemaRef::component("Pet"),
                CodeTypeKind::Response,
                true,
                TypeScope::new(&schemas, &Packages::default()),
            )
            .unwrap();
        let code_type = go.post_process_type(code_type);
        assert_eq!(code_type.declaration, "Pet");
        assert_eq!(code_type.qualified_declaration, "models.Pet");
    }

    #[test]
    fn test_validate_config_requires_artifact_id() {
        let go = GoGenerator::new();
        assert!(go.validate_config(&GeneratorConfig::default()).is_err());
    }
}
