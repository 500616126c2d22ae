//! Template set manifest (`template.yaml`)
//!
//! A manifest lists the files a template set renders. Each entry names its
//! source template, the snippet files it imports, the scope that drives it
//! and Tera expressions for the target directory and file name:
//!
//! ```yaml
//! name: default
//! description: Language-neutral API documentation
//! files:
//!   - description: one page per model
//!     source: model.md.tera
//!     snippets: [macros.tera]
//!     scope: model
//!     target_directory: models
//!     target_file_name: "{{ name }}.md"
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use serde_value::Value as SerdeValue;

use super::errors::TemplateError;

pub const MANIFEST_FILE: &str = "template.yaml";

/// What drives a template file: rendered once per document, tag, operation,
/// model or enum, or once as a support file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Document,
    Tag,
    Operation,
    Model,
    Enum,
    Support,
}

impl Scope {
    pub const ALL: [Scope; 6] = [
        Scope::Support,
        Scope::Document,
        Scope::Tag,
        Scope::Operation,
        Scope::Model,
        Scope::Enum,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::Document => "document",
            Scope::Tag => "tag",
            Scope::Operation => "operation",
            Scope::Model => "model",
            Scope::Enum => "enum",
            Scope::Support => "support",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scope {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "document" | "api" => Ok(Scope::Document),
            "tag" | "service" => Ok(Scope::Tag),
            "operation" => Ok(Scope::Operation),
            "model" => Ok(Scope::Model),
            "enum" => Ok(Scope::Enum),
            "support" => Ok(Scope::Support),
            other => Err(TemplateError::invalid_manifest(format!(
                "unknown scope '{other}'"
            ))),
        }
    }
}

/// One file a template set renders
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateFileDescriptor {
    #[serde(default)]
    pub description: String,
    /// Template path, relative to the set root
    pub source: String,
    /// Files registered alongside `source` so it can import or include them
    #[serde(default, deserialize_with = "string_or_list")]
    pub snippets: Vec<String>,
    pub scope: Scope,
    /// Tera expression, relative to the output directory
    #[serde(default)]
    pub target_directory: String,
    /// Tera expression
    pub target_file_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateManifest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub files: Vec<TemplateFileDescriptor>,
}

impl TemplateManifest {
    /// Parse and validate manifest YAML
    pub fn from_yaml(content: &str, location: &str) -> Result<Self, TemplateError> {
        let manifest: TemplateManifest = serde_yaml::from_str(content).map_err(|e| {
            TemplateError::invalid_manifest(format!("failed to parse {location}: {e}"))
        })?;
        manifest.validate(location)?;
        Ok(manifest)
    }

    pub fn validate(&self, location: &str) -> Result<(), TemplateError> {
        if self.name.trim().is_empty() {
            return Err(TemplateError::invalid_manifest(format!(
                "{location}: name must not be empty"
            )));
        }
        for (index, file) in self.files.iter().enumerate() {
            if file.source.trim().is_empty() {
                return Err(TemplateError::invalid_manifest(format!(
                    "{location}: files[{index}] has no source"
                )));
            }
            if file.target_file_name.trim().is_empty() {
                return Err(TemplateError::invalid_manifest(format!(
                    "{location}: files[{index}] has no target_file_name"
                )));
            }
        }
        Ok(())
    }

    pub fn files_in_scope(&self, scope: Scope) -> impl Iterator<Item = &TemplateFileDescriptor> {
        self.files.iter().filter(move |f| f.scope == scope)
    }

    /// Every file the manifest references, sources first, without repeats
    pub fn referenced_files(&self) -> Vec<&str> {
        let mut files: Vec<&str> = Vec::new();
        let all = self
            .files
            .iter()
            .map(|f| f.source.as_str())
            .chain(self.files.iter().flat_map(|f| f.snippets.iter().map(String::as_str)));
        for file in all {
            if !files.contains(&file) {
                files.push(file);
            }
        }
        files
    }
}

/// Accepts a single snippet name or a list of them
fn string_or_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match SerdeValue::deserialize(deserializer)? {
        SerdeValue::String(s) => Ok(vec![s]),
        SerdeValue::Seq(seq) => seq
            .into_iter()
            .map(|v| match v {
                SerdeValue::String(s) => Ok(s),
                _ => Err(serde::de::Error::custom("expected string in snippet list")),
            })
            .collect(),
        SerdeValue::Unit | SerdeValue::Option(None) => Ok(Vec::new()),
        _ => Err(serde::de::Error::custom(
            "expected a string or list of strings",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = r#"
name: sample
description: Sample set
files:
  - source: readme.md.tera
    snippets: macros.tera
    scope: document
    target_file_name: README.md
  - source: model.md.tera
    snippets: [macros.tera, types.tera]
    scope: model
    target_directory: models
    target_file_name: "{{ name }}.md"
"#;

    #[test]
    fn test_parse_manifest() {
        let manifest = TemplateManifest::from_yaml(MANIFEST, "sample").unwrap();
        assert_eq!(manifest.name, "sample");
        assert_eq!(manifest.files[0].snippets, vec!["macros.tera"]);
        assert_eq!(manifest.files[1].scope, Scope::Model);
        assert_eq!(manifest.files[0].target_directory, "");
        assert_eq!(manifest.files_in_scope(Scope::Model).count(), 1);
        assert_eq!(
            manifest.referenced_files(),
            vec!["readme.md.tera", "model.md.tera", "macros.tera", "types.tera"]
        );
    }

    #[test]
    fn test_manifest_validation() {
        let err = TemplateManifest::from_yaml(
            "name: x\nfiles:\n  - {source: '', scope: model, target_file_name: a}\n",
            "x",
        )
        .unwrap_err();
        assert!(err.to_string().contains("files[0] has no source"));

        let err =
            TemplateManifest::from_yaml("name: x\nfiles:\n  - {source: a, scope: nope, target_file_name: a}\n", "x")
                .unwrap_err();
        assert!(matches!(err, TemplateError::InvalidManifest(_)));
    }

    #[test]
    fn test_scope_from_str() {
        assert_eq!("Operation".parse::<Scope>().unwrap(), Scope::Operation);
        assert_eq!("service".parse::<Scope>().unwrap(), Scope::Tag);
        assert!("file".parse::<Scope>().is_err());
    }
}
