//! Language-agnostic template data built from a document.
//!
//! Nothing here points back into the schema graph; every type reference is an
//! already-mapped [`CodeType`].

use indexmap::IndexMap;
use serde::Serialize;

use super::code_type::CodeType;

#[derive(Debug, Clone, Default, Serialize)]
pub struct DocumentModel {
    pub name: String,
    pub display_name: String,
    pub description: String,
    pub tags: IndexMap<String, Tag>,
    pub operations: Vec<Operation>,
    pub operations_by_tag: IndexMap<String, Vec<Operation>>,
    pub services: IndexMap<String, Service>,
    pub models: Vec<Model>,
    pub enums: Vec<Enum>,
    pub auth: Auth,
    pub endpoints: Vec<Endpoint>,
    pub packages: Packages,
}

/// Output package names per artifact kind.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Packages {
    pub root: String,
    pub client: String,
    pub models: String,
    pub enums: String,
    pub operations: String,
    pub auth: String,
}

impl Default for Packages {
    fn default() -> Self {
        Packages {
            root: "client".into(),
            client: "client".into(),
            models: "models".into(),
            enums: "enums".into(),
            operations: "operations".into(),
            auth: "auth".into(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Tag {
    pub name: String,
    pub description: String,
}

/// Operations sharing a tag, rendered once per tag.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Service {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    pub description: String,
    pub operations: Vec<Operation>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Auth {
    pub methods: Vec<AuthMethod>,
}

impl Auth {
    pub fn has_auth(&self) -> bool {
        !self.methods.is_empty()
    }

    pub fn has_auth_scheme(&self, scheme: &str) -> bool {
        self.methods.iter().any(|m| m.scheme == scheme)
    }
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct AuthMethod {
    pub name: String,
    /// Lowercased HTTP scheme (`bearer`, `basic`), or the scheme type when none.
    pub scheme: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EndpointType {
    Http,
    Socket,
}

#[derive(Debug, Clone, Serialize)]
pub struct Endpoint {
    #[serde(rename = "type")]
    pub endpoint_type: EndpointType,
    pub url: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Documentation {
    pub title: String,
    pub url: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Operation {
    pub name: String,
    pub operation_id: String,
    pub path: String,
    pub method: String,
    pub summary: String,
    pub description: String,
    pub tag: String,
    pub tags: Vec<String>,
    pub return_type: CodeType,
    pub deprecated: bool,
    pub deprecated_reason: String,
    pub parameters: Vec<Parameter>,
    pub path_parameters: Vec<Parameter>,
    pub query_parameters: Vec<Parameter>,
    pub header_parameters: Vec<Parameter>,
    pub cookie_parameters: Vec<Parameter>,
    pub imports: Vec<String>,
    pub documentation: Vec<Documentation>,
    pub stability: String,
}

impl Operation {
    /// Appends to `parameters` and to the per-location list.
    pub fn add_parameter(&mut self, parameter: Parameter) {
        match parameter.location.as_str() {
            "path" => self.path_parameters.push(parameter.clone()),
            "query" => self.query_parameters.push(parameter.clone()),
            "header" => self.header_parameters.push(parameter.clone()),
            "cookie" => self.cookie_parameters.push(parameter.clone()),
            _ => {}
        }
        self.parameters.push(parameter);
    }

    pub fn has_parameters_in(&self, location: &str) -> bool {
        self.parameters.iter().any(|p| p.location == location)
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    #[default]
    Var,
    Enum,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Parameter {
    pub name: String,
    pub field_name: String,
    #[serde(rename = "in")]
    pub location: String,
    pub description: String,
    #[serde(rename = "type")]
    pub code_type: CodeType,
    pub is_primitive_type: bool,
    pub required: bool,
    pub kind: ValueKind,
    pub allowed_values: IndexMap<String, AllowedValue>,
    pub deprecated: bool,
    pub deprecated_reason: String,
    /// Fixed value, e.g. the request content type.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub static_value: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Model {
    pub name: String,
    pub description: String,
    /// Aliased type for models without properties.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<CodeType>,
    pub properties: Vec<Property>,
    pub is_type_alias: bool,
    pub imports: Vec<String>,
    pub deprecated: bool,
    pub deprecated_reason: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Property {
    pub name: String,
    pub field_name: String,
    pub title: String,
    pub description: String,
    pub kind: ValueKind,
    #[serde(rename = "type")]
    pub code_type: CodeType,
    pub is_primitive_type: bool,
    pub nullable: bool,
    pub required: bool,
    pub allowed_values: IndexMap<String, AllowedValue>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Enum {
    pub name: String,
    pub description: String,
    pub value_type: CodeType,
    pub allowed_values: IndexMap<String, AllowedValue>,
    pub deprecated: bool,
    pub deprecated_reason: String,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct AllowedValue {
    pub value: String,
    pub name: String,
    pub description: String,
}
