//! Pipeline configuration loaded from YAML or TOML.
//!
//! A configuration names the input documents, the patches and patch sets to
//! apply, and optionally a generator run over the result:
//!
//! ```yaml
//! inputs: [specs/a.yaml, specs/b.yaml]
//! patches:
//!   - generate-tag-from-doc-title
//!   - type: jsonpatch
//!     file: fixes.jsonpatch
//! patch_sets:
//!   - id: code-generation
//! output: build/openapi.yaml
//! generator:
//!   language: go
//!   output_dir: build/client
//! ```

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_value::Value as SerdeValue;
use tokio::fs;
use tracing::debug;

use crate::builtin::PatchSet;
use crate::core::error::{Error, Result};
use crate::patch::SpecPatch;

/// Seed values for the merged document's info block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InfoSeed {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub license: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    pub language: String,
    #[serde(default = "default_template")]
    pub template: String,
    /// Directory holding a custom template set; overrides `template`.
    #[serde(default)]
    pub template_dir: Option<PathBuf>,
    #[serde(default)]
    pub output_dir: PathBuf,
    #[serde(default)]
    pub dry_run: bool,
    #[serde(default, deserialize_with = "string_or_list")]
    pub scopes: Vec<String>,
    #[serde(default, deserialize_with = "string_or_list")]
    pub ignore_files: Vec<String>,
    #[serde(default)]
    pub artifact_group_id: String,
    #[serde(default)]
    pub artifact_id: String,
    #[serde(default)]
    pub repository_url: String,
    #[serde(default)]
    pub license_name: String,
    #[serde(default)]
    pub license_url: String,
    #[serde(default)]
    pub properties: IndexMap<String, String>,
}

impl GeneratorConfig {
    /// Repository and license links must be absolute URLs when set.
    pub fn validate_urls(&self) -> Result<()> {
        for (field, value) in [
            ("repository_url", &self.repository_url),
            ("license_url", &self.license_url),
        ] {
            if !value.is_empty() {
                url::Url::parse(value).map_err(|e| {
                    Error::config(format!("generator.{field} '{value}' is not a valid URL: {e}"))
                })?;
            }
        }
        Ok(())
    }
}

fn default_template() -> String {
    "default".to_string()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(deserialize_with = "string_or_list")]
    pub inputs: Vec<PathBuf>,
    #[serde(default)]
    pub seed: Option<PathBuf>,
    #[serde(default, deserialize_with = "patch_list")]
    pub patches: Vec<SpecPatch>,
    #[serde(default)]
    pub patch_sets: Vec<PatchSet>,
    #[serde(default)]
    pub info: Option<InfoSeed>,
    #[serde(default)]
    pub output: Option<PathBuf>,
    #[serde(default)]
    pub generator: Option<GeneratorConfig>,
}

impl PipelineConfig {
    /// Parses configuration text; `.toml` files use TOML, anything else YAML.
    pub fn parse(content: &str, path: &Path) -> Result<Self> {
        let is_toml = path.extension().is_some_and(|ext| ext == "toml");
        let config: PipelineConfig = if is_toml {
            toml::from_str(content)?
        } else {
            serde_yaml::from_str(content)?
        };
        config.validate()?;
        Ok(config)
    }

    pub async fn load(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "Loading pipeline configuration");
        let content = fs::read_to_string(path).await?;
        let mut config = Self::parse(&content, path)?;
        if let Some(base) = path.parent() {
            config.resolve_relative_to(base);
        }
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.inputs.is_empty() {
            return Err(Error::config("at least one input document is required"));
        }
        if let Some(info) = &self.info {
            if info.title.trim().is_empty() {
                return Err(Error::config("info.title must not be empty"));
            }
        }
        if let Some(generator) = &self.generator {
            if generator.language.trim().is_empty() {
                return Err(Error::config("generator.language is required"));
            }
            if generator.output_dir.as_os_str().is_empty() {
                return Err(Error::config("generator.output_dir is required"));
            }
            generator.validate_urls()?;
        }
        Ok(())
    }

    /// Makes relative paths relative to the configuration file's directory.
    pub fn resolve_relative_to(&mut self, base: &Path) {
        let join = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        self.inputs.iter_mut().for_each(join);
        self.seed.iter_mut().for_each(join);
        self.output.iter_mut().for_each(join);
        if let Some(generator) = self.generator.as_mut() {
            join(&mut generator.output_dir);
            generator.template_dir.iter_mut().for_each(join);
        }
    }

    /// Explicit patches followed by every expanded patch set.
    pub fn all_patches(&self) -> Vec<SpecPatch> {
        let mut patches = self.patches.clone();
        patches.extend(crate::builtin::resolve_patch_sets(&self.patch_sets));
        patches
    }
}

fn string_or_list<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: From<String>,
{
    match SerdeValue::deserialize(deserializer)? {
        SerdeValue::String(s) => Ok(vec![T::from(s)]),
        SerdeValue::Unit | SerdeValue::Option(None) => Ok(Vec::new()),
        SerdeValue::Seq(seq) => seq
            .into_iter()
            .map(|item| match item {
                SerdeValue::String(s) => Ok(T::from(s)),
                _ => Err(serde::de::Error::custom("Expected string or array of strings")),
            })
            .collect(),
        _ => Err(serde::de::Error::custom("Expected string or array of strings")),
    }
}

/// Each entry is a `type:value` shorthand or a full patch object.
fn patch_list<'de, D>(deserializer: D) -> std::result::Result<Vec<SpecPatch>, D::Error>
where
    D: Deserializer<'de>,
{
    let entries = match SerdeValue::deserialize(deserializer)? {
        SerdeValue::Seq(seq) => seq,
        SerdeValue::Unit | SerdeValue::Option(None) => return Ok(Vec::new()),
        other => vec![other],
    };
    entries
        .into_iter()
        .map(|entry| match entry {
            SerdeValue::String(s) => s.parse().map_err(serde::de::Error::custom),
            other => other.deserialize_into().map_err(serde::de::Error::custom),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn test_yaml_config_with_shorthand_patches() {
        let config = PipelineConfig::parse(
            r#"
inputs: a.yaml
patches:
  - generate-tag-from-doc-title
  - jsonpatch:fix.jsonpatch
  - type: builtin
    id: set-endpoint
    config:
      url: https://api.example.com
patch_sets:
  - id: code-generation
generator:
  language: go
  output_dir: out
  scopes: model
"#,
            Path::new("pipeline.yaml"),
        )
        .unwrap();

        assert_eq!(config.inputs, vec![PathBuf::from("a.yaml")]);
        assert_eq!(config.patches[0].id, "generate-tag-from-doc-title");
        assert_eq!(config.patches[1].patch_type, "jsonpatch");
        assert_eq!(config.patches[1].file, "fix.jsonpatch");
        assert_eq!(config.patches[2].config.get("url"), Some(&json!("https://api.example.com")));

        let generator = config.generator.as_ref().unwrap();
        assert_eq!(generator.template, "default");
        assert_eq!(generator.scopes, vec!["model"]);
        assert_eq!(config.all_patches().len(), 3 + 6);
    }

    #[test]
    fn test_toml_config() {
        let config = PipelineConfig::parse(
            r#"
inputs = ["a.yaml", "b.json"]
patches = ["prune-document-tags"]

[info]
title = "Combined"

[generator]
language = "python"
output_dir = "out"
dry_run = true
"#,
            Path::new("pipeline.toml"),
        )
        .unwrap();
        assert_eq!(config.inputs.len(), 2);
        assert_eq!(config.info.unwrap().title, "Combined");
        assert!(config.generator.unwrap().dry_run);
    }

    #[test]
    fn test_validation_errors() {
        let err = PipelineConfig::parse("inputs: []", Path::new("p.yaml")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Configuration error: at least one input document is required"
        );

        let err = PipelineConfig::parse(
            "inputs: [a.yaml]\ngenerator:\n  language: go\n",
            Path::new("p.yaml"),
        )
        .unwrap_err();
        assert!(err.to_string().contains("generator.output_dir is required"));

        let err = PipelineConfig::parse(
            "inputs: [a.yaml]\ngenerator:\n  language: go\n  output_dir: out\n  license_url: not a url\n",
            Path::new("p.yaml"),
        )
        .unwrap_err();
        assert!(err.to_string().contains("generator.license_url"));
    }

    #[tokio::test]
    async fn test_load_resolves_relative_paths() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pipeline.yaml");
        tokio::fs::write(&path, "inputs: [specs/a.yaml]\noutput: out.yaml\n")
            .await
            .unwrap();

        let config = PipelineConfig::load(&path).await.unwrap();
        assert_eq!(config.inputs[0], dir.path().join("specs/a.yaml"));
        assert_eq!(config.output, Some(dir.path().join("out.yaml")));
    }
}
