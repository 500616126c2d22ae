//! Schema nodes and reference slots.
//!
//! A schema slot is either a `$ref` into `#/components/schemas` or an inline
//! [`Schema`]. References are never dereferenced in place; callers resolve them
//! through the component table when they need the target.

use indexmap::IndexMap;
use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use serde_value::Value as SerdeValue;

use super::document::ExternalDocs;

/// Prefix of every component schema reference.
pub const SCHEMA_REF_PREFIX: &str = "#/components/schemas/";

/// A schema slot: reference or inline node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SchemaRef {
    Reference {
        #[serde(rename = "$ref")]
        reference: String,
    },
    Inline(Box<Schema>),
}

impl Default for SchemaRef {
    fn default() -> Self {
        SchemaRef::Inline(Box::default())
    }
}

impl From<Schema> for SchemaRef {
    fn from(schema: Schema) -> Self {
        SchemaRef::Inline(Box::new(schema))
    }
}

impl SchemaRef {
    /// Reference to a component schema by name.
    pub fn component(name: &str) -> Self {
        SchemaRef::Reference {
            reference: format!("{SCHEMA_REF_PREFIX}{name}"),
        }
    }

    pub fn is_reference(&self) -> bool {
        matches!(self, SchemaRef::Reference { .. })
    }

    /// Component name a reference points to. Non-component references yield
    /// their last path segment.
    pub fn ref_name(&self) -> Option<&str> {
        match self {
            SchemaRef::Reference { reference } => Some(
                reference
                    .strip_prefix(SCHEMA_REF_PREFIX)
                    .unwrap_or_else(|| reference.rsplit('/').next().unwrap_or(reference)),
            ),
            SchemaRef::Inline(_) => None,
        }
    }

    pub fn as_inline(&self) -> Option<&Schema> {
        match self {
            SchemaRef::Inline(schema) => Some(schema),
            SchemaRef::Reference { .. } => None,
        }
    }

    pub fn as_inline_mut(&mut self) -> Option<&mut Schema> {
        match self {
            SchemaRef::Inline(schema) => Some(schema),
            SchemaRef::Reference { .. } => None,
        }
    }

    /// Follows reference chains through `schemas` until an inline node.
    /// Dangling or cyclic chains resolve to `None`.
    pub fn resolve<'a>(&'a self, schemas: &'a IndexMap<String, SchemaRef>) -> Option<&'a Schema> {
        let mut current = self;
        for _ in 0..=schemas.len() {
            match current {
                SchemaRef::Inline(schema) => return Some(schema),
                SchemaRef::Reference { .. } => {
                    current = schemas.get(current.ref_name()?)?;
                }
            }
        }
        None
    }
}

/// The `type` keyword: a single type name or a list of them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeSet(pub Vec<String>);

impl TypeSet {
    pub fn single(name: &str) -> Self {
        TypeSet(vec![name.to_string()])
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|t| t == name)
    }

    /// True when the set is exactly `[name]`.
    pub fn is(&self, name: &str) -> bool {
        self.0.len() == 1 && self.0[0] == name
    }

    /// First type that is not `null`.
    pub fn primary(&self) -> Option<&str> {
        self.0.iter().map(String::as_str).find(|t| *t != "null")
    }

    pub fn push(&mut self, name: &str) {
        self.0.push(name.to_string());
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn sorted(&self) -> Vec<String> {
        let mut values = self.0.clone();
        values.sort();
        values
    }
}

impl Serialize for TypeSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.0.len() == 1 {
            serializer.serialize_str(&self.0[0])
        } else {
            self.0.serialize(serializer)
        }
    }
}

impl<'de> Deserialize<'de> for TypeSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match SerdeValue::deserialize(deserializer)? {
            SerdeValue::String(s) => Ok(TypeSet(vec![s])),
            SerdeValue::Unit | SerdeValue::Option(None) => Ok(TypeSet::default()),
            SerdeValue::Seq(seq) => seq
                .into_iter()
                .map(|item| match item {
                    SerdeValue::String(s) => Ok(s),
                    _ => Err(serde::de::Error::custom(
                        "Expected string or array of strings",
                    )),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(TypeSet),
            _ => Err(serde::de::Error::custom(
                "Expected string or array of strings",
            )),
        }
    }
}

/// `additionalProperties`: a flag or a value schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AdditionalProperties {
    Allowed(bool),
    Schema(SchemaRef),
}

impl AdditionalProperties {
    pub fn schema(&self) -> Option<&SchemaRef> {
        match self {
            AdditionalProperties::Schema(schema) => Some(schema),
            AdditionalProperties::Allowed(_) => None,
        }
    }

    pub fn schema_mut(&mut self) -> Option<&mut SchemaRef> {
        match self {
            AdditionalProperties::Schema(schema) => Some(schema),
            AdditionalProperties::Allowed(_) => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Discriminator {
    pub property_name: String,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub mapping: IndexMap<String, String>,
    #[serde(flatten)]
    pub extensions: IndexMap<String, Value>,
}

/// An inline schema node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    #[serde(rename = "type", default, skip_serializing_if = "TypeSet::is_empty")]
    pub schema_type: TypeSet,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nullable: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_only: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub write_only: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<Number>,
    /// Boolean in 3.0, number in 3.1.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclusive_maximum: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclusive_minimum: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multiple_of: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_items: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_items: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique_items: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_properties: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_properties: Option<u64>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub properties: IndexMap<String, SchemaRef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<SchemaRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<AdditionalProperties>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub all_of: Vec<SchemaRef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub any_of: Vec<SchemaRef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub one_of: Vec<SchemaRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not: Option<SchemaRef>,

    #[serde(rename = "enum", default, skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<Value>,
    #[serde(rename = "const", default, skip_serializing_if = "Option::is_none")]
    pub const_value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discriminator: Option<Discriminator>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xml: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_docs: Option<ExternalDocs>,

    #[serde(flatten)]
    pub extensions: IndexMap<String, Value>,
}

impl Schema {
    /// Schema of a single type.
    pub fn of_type(name: &str) -> Self {
        Schema {
            schema_type: TypeSet::single(name),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Schema::default()
    }

    /// True for `enum` schemas and for `oneOf` lists made only of `const`
    /// branches.
    pub fn is_enum(&self) -> bool {
        !self.enum_values.is_empty()
            || (!self.one_of.is_empty()
                && self
                    .one_of
                    .iter()
                    .all(|branch| branch.as_inline().is_some_and(|s| s.const_value.is_some())))
    }

    /// More than one branch in any composition keyword, excluding enums.
    pub fn is_polymorphic(&self) -> bool {
        !self.is_enum()
            && (self.all_of.len() > 1 || self.any_of.len() > 1 || self.one_of.len() > 1)
    }

    pub fn is_object(&self) -> bool {
        self.schema_type.contains("object")
            || (self.schema_type.is_empty() && !self.properties.is_empty())
    }

    pub fn is_array(&self) -> bool {
        self.schema_type.contains("array")
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable == Some(true) || self.schema_type.contains("null")
    }

    /// Map-like object: no declared properties, values typed by
    /// `additionalProperties`.
    pub fn is_map(&self) -> bool {
        self.properties.is_empty()
            && matches!(
                self.additional_properties,
                Some(AdditionalProperties::Schema(_)) | Some(AdditionalProperties::Allowed(true))
            )
    }

    pub fn is_required(&self, property: &str) -> bool {
        self.required.iter().any(|r| r == property)
    }
}
