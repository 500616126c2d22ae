//! Target-language type descriptors produced by the type mappers.

use std::fmt;

use serde::Serialize;

/// Where a schema is being converted; some backends map the same schema
/// differently per position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CodeTypeKind {
    Parameter,
    Property,
    Array,
    Response,
    Parent,
}

/// A mapped type. `name` is the bare type; the declaration fields are filled
/// by the backend's post-processing.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CodeType {
    pub name: String,
    pub declaration: String,
    pub qualified_declaration: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub import_path: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub type_args: Vec<CodeType>,
    pub is_array: bool,
    pub is_list: bool,
    pub is_map: bool,
    pub is_nullable: bool,
    pub is_void: bool,
    #[serde(skip)]
    pub is_post_processed: bool,
}

impl CodeType {
    pub fn simple(name: &str, nullable: bool) -> Self {
        CodeType {
            name: name.to_string(),
            is_nullable: nullable,
            ..Default::default()
        }
    }

    /// Fixed-size array of `item` (`[]T`, `T[]`).
    pub fn array(item: CodeType, nullable: bool) -> Self {
        CodeType {
            type_args: vec![item],
            is_array: true,
            is_nullable: nullable,
            ..Default::default()
        }
    }

    /// Growable list of `item` (`List<T>`, `list[T]`).
    pub fn list(item: CodeType, nullable: bool) -> Self {
        CodeType {
            type_args: vec![item],
            is_list: true,
            is_nullable: nullable,
            ..Default::default()
        }
    }

    pub fn map(key: CodeType, value: CodeType, nullable: bool) -> Self {
        CodeType {
            type_args: vec![key, value],
            is_map: true,
            is_nullable: nullable,
            ..Default::default()
        }
    }

    pub fn void() -> Self {
        CodeType {
            is_void: true,
            ..Default::default()
        }
    }

    pub fn with_import(mut self, path: &str) -> Self {
        self.import_path = Some(path.to_string());
        self
    }

    /// `pkg.` prefix taken from the last segment of the import path.
    pub fn qualifier(&self, separator: &str) -> String {
        match self.import_path.as_deref().and_then(|p| p.rsplit(['/', '.']).next()) {
            Some(last) if !last.is_empty() => format!("{last}{separator}"),
            _ => String::new(),
        }
    }

    /// The name prefixed by the whole import path, for languages that
    /// reference types by their full namespace.
    pub fn fully_qualified_name(&self, separator: &str) -> String {
        match self.import_path.as_deref().filter(|p| !p.is_empty()) {
            Some(path) => format!("{path}{separator}{}", self.name),
            None => self.name.clone(),
        }
    }

    pub fn is_composite(&self) -> bool {
        self.is_array || self.is_list || self.is_map
    }

    /// Element type of an array or list.
    pub fn item(&self) -> Option<&CodeType> {
        if self.is_array || self.is_list {
            self.type_args.first()
        } else {
            None
        }
    }
}

impl fmt::Display for CodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.declaration.is_empty() {
            f.write_str(&self.name)
        } else {
            f.write_str(&self.declaration)
        }
    }
}
