//! Tera rendering of a template set for one scope at a time

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tera::{Context, Tera, Value};
use tracing::debug;

use super::errors::TemplateError;
use super::manifest::{Scope, TemplateFileDescriptor};
use super::source::TemplateSet;
use crate::core::utils::{to_camel_case, to_pascal_case, to_snake_case, to_upper_snake_case};
use crate::generation::CodeGenerator;
use crate::generation::metadata::stays_inside;

/// What happened to a file during a render pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FileState {
    Rendered,
    DryRun,
    SkippedByName,
    SkippedByScope,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedFile {
    /// Target path joined onto the output directory
    pub path: PathBuf,
    /// Target path relative to the output directory
    pub relative: PathBuf,
    pub template_file: String,
    pub state: FileState,
}

#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    pub dry_run: bool,
    /// Scopes to write; empty writes every scope
    pub scopes: Vec<Scope>,
    /// Target file names never written
    pub ignore_files: Vec<String>,
}

impl RenderOptions {
    fn state_for(&self, descriptor: &TemplateFileDescriptor, file_name: &str) -> FileState {
        let ignored = self
            .ignore_files
            .iter()
            .any(|ignored| ignored == file_name || *ignored == descriptor.target_file_name);
        if self.dry_run {
            FileState::DryRun
        } else if ignored {
            FileState::SkippedByName
        } else if !self.scopes.is_empty() && !self.scopes.contains(&descriptor.scope) {
            FileState::SkippedByScope
        } else {
            FileState::Rendered
        }
    }
}

/// A template set compiled into one Tera namespace, with the generator's
/// naming functions available as filters.
pub struct TemplateRenderer {
    set: TemplateSet,
    tera: Tera,
}

fn target_directory_template(index: usize) -> String {
    format!("__target_directory_{index}")
}

fn target_file_template(index: usize) -> String {
    format!("__target_file_name_{index}")
}

type NameFn = fn(&dyn CodeGenerator, &str) -> String;

fn naming_filters() -> [(&'static str, NameFn); 5] {
    [
        ("class_name", |g: &dyn CodeGenerator, s: &str| g.to_class_name(s)),
        ("function_name", |g: &dyn CodeGenerator, s: &str| g.to_function_name(s)),
        ("property_name", |g: &dyn CodeGenerator, s: &str| g.to_property_name(s)),
        ("parameter_name", |g: &dyn CodeGenerator, s: &str| g.to_parameter_name(s)),
        ("constant_name", |g: &dyn CodeGenerator, s: &str| g.to_constant_name(s)),
    ]
}

fn case_filters() -> [(&'static str, fn(&str) -> String); 5] {
    [
        ("snake_case", to_snake_case),
        ("pascal_case", to_pascal_case),
        ("camel_case", to_camel_case),
        ("upper_snake_case", to_upper_snake_case),
        ("package_path", |s: &str| s.replace('.', "/")),
    ]
}

fn string_arg(filter: &str, value: &Value) -> tera::Result<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Null => Ok(String::new()),
        other => Err(tera::Error::msg(format!(
            "filter `{filter}` expects a string, got {other}"
        ))),
    }
}

fn register_filters(tera: &mut Tera, generator: Arc<dyn CodeGenerator>) {
    for (name, naming) in naming_filters() {
        let generator = generator.clone();
        tera.register_filter(
            name,
            move |value: &Value, _args: &HashMap<String, Value>| {
                let input = string_arg(name, value)?;
                Ok(Value::String(naming(generator.as_ref(), &input)))
            },
        );
    }
    for (name, convert) in case_filters() {
        tera.register_filter(
            name,
            move |value: &Value, _args: &HashMap<String, Value>| {
                let input = string_arg(name, value)?;
                Ok(Value::String(convert(&input)))
            },
        );
    }
    tera.register_filter(
        "comment",
        |value: &Value, args: &HashMap<String, Value>| {
            let input = string_arg("comment", value)?;
            let prefix = args
                .get("prefix")
                .and_then(Value::as_str)
                .unwrap_or("//");
            let lines: Vec<String> = input
                .trim()
                .lines()
                .map(|line| format!("{prefix} {line}").trim_end().to_string())
                .collect();
            Ok(Value::String(lines.join("\n")))
        },
    );
    let generator_for_tester = generator.clone();
    tera.register_tester(
        "primitive",
        move |value: Option<&Value>, _args: &[Value]| {
            let name = value.and_then(Value::as_str).unwrap_or_default();
            Ok(generator_for_tester.is_primitive_type(name))
        },
    );
}

/// Joins the rendered directory and file name, refusing anything that
/// would land outside the output directory.
fn target_path(directory: &str, file_name: &str) -> Result<PathBuf, TemplateError> {
    let joined = Path::new(directory.trim()).join(file_name.trim());
    if !stays_inside(&joined) || file_name.trim().is_empty() {
        return Err(TemplateError::InvalidTarget(joined.display().to_string()));
    }
    Ok(joined
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect())
}

impl TemplateRenderer {
    pub fn new(set: TemplateSet, generator: Arc<dyn CodeGenerator>) -> Result<Self, TemplateError> {
        let mut tera = Tera::default();
        tera.autoescape_on(vec![]);
        register_filters(&mut tera, generator);

        let mut templates: Vec<(String, String)> = set
            .manifest
            .referenced_files()
            .into_iter()
            .filter_map(|name| set.file(name).map(|content| (name.to_string(), content.to_string())))
            .collect();
        for (index, descriptor) in set.manifest.files.iter().enumerate() {
            templates.push((
                target_directory_template(index),
                descriptor.target_directory.clone(),
            ));
            templates.push((
                target_file_template(index),
                descriptor.target_file_name.clone(),
            ));
        }
        tera.add_raw_templates(templates)
            .map_err(|e| TemplateError::render(&set.id, &e))?;

        Ok(Self { set, tera })
    }

    pub fn template_set(&self) -> &TemplateSet {
        &self.set
    }

    /// Renders every descriptor of `scope`. Content is always rendered, so
    /// template errors surface in dry runs too; only writing depends on the
    /// resulting [`FileState`].
    pub async fn render(
        &self,
        output_dir: &Path,
        scope: Scope,
        context: &Context,
        options: &RenderOptions,
    ) -> Result<Vec<RenderedFile>, TemplateError> {
        let mut files = Vec::new();
        for (index, descriptor) in self.set.manifest.files.iter().enumerate() {
            if descriptor.scope != scope {
                continue;
            }
            let directory = self.render_template(&target_directory_template(index), context)?;
            let file_name = self.render_template(&target_file_template(index), context)?;
            let relative = target_path(&directory, &file_name)?;
            let content = self.render_template(&descriptor.source, context)?;

            let path = output_dir.join(&relative);
            let state = options.state_for(descriptor, file_name.trim());
            if state == FileState::Rendered {
                if let Some(parent) = path.parent() {
                    tokio::fs::create_dir_all(parent).await?;
                }
                tokio::fs::write(&path, content).await?;
            }
            debug!(
                template = %self.set.id,
                file = %relative.display(),
                state = ?state,
                "Rendered file"
            );
            files.push(RenderedFile {
                path,
                relative,
                template_file: descriptor.source.clone(),
                state,
            });
        }
        Ok(files)
    }

    fn render_template(&self, name: &str, context: &Context) -> Result<String, TemplateError> {
        self.tera
            .render(name, context)
            .map_err(|e| TemplateError::render(name, &e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::backends::GoGenerator;
    use crate::templates::manifest::TemplateManifest;
    use indexmap::IndexMap;
    use tempfile::TempDir;

    const MANIFEST: &str = r#"
name: test
files:
  - source: doc.tera
    snippets: macros.tera
    scope: document
    target_file_name: README.md
  - source: model.tera
    scope: model
    target_directory: "models/{{ package }}"
    target_file_name: "{{ name | snake_case }}.go"
"#;

    fn renderer() -> TemplateRenderer {
        let manifest = TemplateManifest::from_yaml(MANIFEST, "test").unwrap();
        let mut files = IndexMap::new();
        files.insert(
            "doc.tera".to_string(),
            "{% import \"macros.tera\" as m %}{{ m::title(text=name) }}".to_string(),
        );
        files.insert(
            "macros.tera".to_string(),
            "{% macro title(text) %}# {{ text }}{% endmacro title %}".to_string(),
        );
        files.insert(
            "model.tera".to_string(),
            "type {{ name | class_name }} struct{} // {{ \"<b>\" }}".to_string(),
        );
        let set = TemplateSet::new("test", manifest, files).unwrap();
        TemplateRenderer::new(set, Arc::new(GoGenerator::new())).unwrap()
    }

    fn context(name: &str) -> Context {
        let mut context = Context::new();
        context.insert("name", name);
        context.insert("package", "petstore");
        context
    }

    #[tokio::test]
    async fn test_render_document_scope_only() {
        let dir = TempDir::new().unwrap();
        let files = renderer()
            .render(dir.path(), Scope::Document, &context("Pets"), &RenderOptions::default())
            .await
            .unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].relative, PathBuf::from("README.md"));
        assert_eq!(files[0].state, FileState::Rendered);
        assert_eq!(
            std::fs::read_to_string(dir.path().join("README.md")).unwrap(),
            "# Pets"
        );
    }

    #[tokio::test]
    async fn test_target_expressions_and_naming_filters() {
        let dir = TempDir::new().unwrap();
        let files = renderer()
            .render(dir.path(), Scope::Model, &context("PetOwner"), &RenderOptions::default())
            .await
            .unwrap();
        assert_eq!(files[0].relative, PathBuf::from("models/petstore/pet_owner.go"));
        let content = std::fs::read_to_string(&files[0].path).unwrap();
        assert_eq!(content, "type PetOwner struct{} // <b>");
    }

    #[tokio::test]
    async fn test_file_state_precedence() {
        let dir = TempDir::new().unwrap();
        let renderer = renderer();

        let dry = RenderOptions {
            dry_run: true,
            ignore_files: vec!["README.md".into()],
            ..Default::default()
        };
        let files = renderer
            .render(dir.path(), Scope::Document, &context("x"), &dry)
            .await
            .unwrap();
        assert_eq!(files[0].state, FileState::DryRun);
        assert!(!dir.path().join("README.md").exists());

        let ignored = RenderOptions {
            ignore_files: vec!["README.md".into()],
            scopes: vec![Scope::Model],
            ..Default::default()
        };
        let files = renderer
            .render(dir.path(), Scope::Document, &context("x"), &ignored)
            .await
            .unwrap();
        assert_eq!(files[0].state, FileState::SkippedByName);

        let scoped = RenderOptions {
            scopes: vec![Scope::Model],
            ..Default::default()
        };
        let files = renderer
            .render(dir.path(), Scope::Document, &context("x"), &scoped)
            .await
            .unwrap();
        assert_eq!(files[0].state, FileState::SkippedByScope);
        assert!(!dir.path().join("README.md").exists());
    }

    #[test]
    fn test_file_state_serialization() {
        assert_eq!(
            serde_json::to_string(&FileState::SkippedByScope).unwrap(),
            "\"skipped-by-scope\""
        );
        assert_eq!(serde_json::to_string(&FileState::DryRun).unwrap(), "\"dry-run\"");
    }

    #[test]
    fn test_target_path_must_stay_inside_output() {
        assert_eq!(target_path("", "a.go").unwrap(), PathBuf::from("a.go"));
        assert_eq!(target_path("./pkg", "a.go").unwrap(), PathBuf::from("pkg/a.go"));
        assert!(target_path("../x", "a.go").is_err());
        assert!(target_path("/etc", "a.go").is_err());
        assert!(target_path("pkg", " ").is_err());
    }

    #[tokio::test]
    async fn test_render_error_names_template() {
        let dir = TempDir::new().unwrap();
        let err = renderer()
            .render(dir.path(), Scope::Model, &Context::new(), &RenderOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, TemplateError::Render { .. }));
    }
}
