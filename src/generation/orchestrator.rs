//! Generation orchestration - coordinates the generation workflow

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::Serialize;
use tera::Context;

use super::builder::build_template_data;
use super::ir::{Auth, DocumentModel, Endpoint, Enum, Model, Operation, Packages, Service};
use super::metadata::{read_metadata, remove_generated_file, stale_files, write_metadata};
use super::{CodeGenerator, GenerationError, GeneratorRegistry};
use crate::core::GeneratorConfig;
use crate::core::utils::to_snake_case;
use crate::openapi::Document;
use crate::templates::{
    DirectoryTemplateLoader, FileState, RenderOptions, RenderedFile, Scope, TemplateLoader,
    TemplateRenderer, template_candidates,
};

/// Project metadata exposed to templates as `metadata`
#[derive(Debug, Clone, Default, Serialize)]
pub struct TemplateMetadata {
    pub artifact_group_id: String,
    pub artifact_id: String,
    pub name: String,
    pub display_name: String,
    pub description: String,
    pub repository_url: String,
    pub license_name: String,
    pub license_url: String,
}

impl TemplateMetadata {
    /// The artifact id falls back to a slug of the API name.
    pub fn new(model: &DocumentModel, config: &GeneratorConfig) -> Self {
        let name = model.name.trim().to_string();
        let artifact_id = if config.artifact_id.is_empty() {
            to_snake_case(&name).replace('_', "-")
        } else {
            config.artifact_id.clone()
        };
        Self {
            artifact_group_id: config.artifact_group_id.clone(),
            artifact_id,
            display_name: model.display_name.trim().to_string(),
            description: model.description.clone(),
            repository_url: config.repository_url.clone(),
            license_name: config.license_name.clone(),
            license_url: config.license_url.clone(),
            name,
        }
    }
}

/// Data shared by every scope, exposed to templates as `common`
#[derive(Debug, Serialize)]
struct CommonData<'a> {
    properties: &'a IndexMap<String, String>,
    endpoints: &'a [Endpoint],
    auth: &'a Auth,
    packages: &'a Packages,
    services: &'a IndexMap<String, Service>,
    operations: &'a [Operation],
    models: &'a [Model],
    enums: &'a [Enum],
}

/// Outcome of one generator run
#[derive(Debug, Clone, Serialize)]
pub struct GenerationResult {
    pub generator: String,
    pub template: String,
    pub files: Vec<RenderedFile>,
    /// Files from the previous run that this run no longer produces
    pub removed: Vec<PathBuf>,
}

impl GenerationResult {
    pub fn count(&self, state: FileState) -> usize {
        self.files.iter().filter(|f| f.state == state).count()
    }
}

/// Orchestrates the code generation workflow
pub struct GenerationOrchestrator {
    registry: Arc<GeneratorRegistry>,
    templates: Arc<dyn TemplateLoader>,
}

impl GenerationOrchestrator {
    /// Create a new generation orchestrator
    pub fn new(registry: Arc<GeneratorRegistry>, templates: Arc<dyn TemplateLoader>) -> Self {
        Self {
            registry,
            templates,
        }
    }

    /// Execute the generation workflow
    pub async fn generate(
        &self,
        document: &Document,
        config: &GeneratorConfig,
    ) -> Result<GenerationResult, GenerationError> {
        // 1. Resolve generator and validate its configuration
        let generator = self.registry.get(&config.language)?;
        generator.validate_config(config)?;
        let options = render_options(config)?;

        // 2. Build template data
        let packages = generator.packages(config);
        let model = build_template_data(document, generator.as_ref(), packages)?;
        tracing::debug!(
            generator = generator.id(),
            operations = model.operations.len(),
            models = model.models.len(),
            enums = model.enums.len(),
            "Template data built"
        );

        // 3. Load the template set
        let candidates = template_candidates(generator.id(), &config.template);
        let set = match &config.template_dir {
            Some(dir) => DirectoryTemplateLoader::new(dir).load_first(&candidates).await?,
            None => self.templates.load_first(&candidates).await?,
        };
        let template_id = set.id.clone();
        let renderer = TemplateRenderer::new(set, generator.clone())?;

        // 4. Render every scope
        let previous = read_metadata(&config.output_dir).await?;
        let files = render_all(&renderer, generator.as_ref(), &model, config, &options).await?;
        tracing::info!(
            generator = generator.id(),
            template = %template_id,
            rendered = files.iter().filter(|f| f.state == FileState::Rendered).count(),
            total = files.len(),
            "Rendered template files"
        );

        // 5. Remove stale files and record this run
        let produced: Vec<PathBuf> = files.iter().map(|f| f.relative.clone()).collect();
        let removed = stale_files(&previous, &produced);
        if !options.dry_run {
            for file in &removed {
                remove_generated_file(&config.output_dir, file).await?;
            }
            let tracked = tracked_files(&previous, &files);
            write_metadata(&config.output_dir, &tracked).await?;
        }

        Ok(GenerationResult {
            generator: generator.id().to_string(),
            template: template_id,
            files,
            removed,
        })
    }
}

fn render_options(config: &GeneratorConfig) -> Result<RenderOptions, GenerationError> {
    let scopes = config
        .scopes
        .iter()
        .map(|s| {
            s.parse::<Scope>()
                .map_err(|e| GenerationError::ValidationError(e.to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(RenderOptions {
        dry_run: config.dry_run,
        scopes,
        ignore_files: config.ignore_files.clone(),
    })
}

/// Rendered files, plus previously tracked files that were only skipped
/// because their scope was not selected this time.
fn tracked_files(previous: &[PathBuf], files: &[RenderedFile]) -> Vec<PathBuf> {
    let previous: BTreeSet<&PathBuf> = previous.iter().collect();
    files
        .iter()
        .filter(|f| match f.state {
            FileState::Rendered => true,
            FileState::SkippedByScope => previous.contains(&f.relative),
            FileState::DryRun | FileState::SkippedByName => false,
        })
        .map(|f| f.relative.clone())
        .collect()
}

fn base_context(
    model: &DocumentModel,
    generator: &dyn CodeGenerator,
    config: &GeneratorConfig,
) -> Result<Context, GenerationError> {
    let common = CommonData {
        properties: &config.properties,
        endpoints: &model.endpoints,
        auth: &model.auth,
        packages: &model.packages,
        services: &model.services,
        operations: &model.operations,
        models: &model.models,
        enums: &model.enums,
    };
    let mut context = Context::new();
    context.insert("metadata", &TemplateMetadata::new(model, config));
    context.insert(
        "common",
        &serde_json::to_value(&common).map_err(GenerationError::SerializationError)?,
    );
    context.insert("generator", generator.id());
    Ok(context)
}

async fn render_all(
    renderer: &TemplateRenderer,
    generator: &dyn CodeGenerator,
    model: &DocumentModel,
    config: &GeneratorConfig,
    options: &RenderOptions,
) -> Result<Vec<RenderedFile>, GenerationError> {
    let base = base_context(model, generator, config)?;
    let output = &config.output_dir;
    let packages = &model.packages;
    let mut files = Vec::new();

    files.extend(renderer.render(output, Scope::Support, &base, options).await?);

    let mut context = base.clone();
    context.insert("package", &packages.client);
    files.extend(renderer.render(output, Scope::Document, &context, options).await?);

    for service in model.services.values() {
        let mut context = base.clone();
        context.insert("package", &packages.client);
        context.insert("name", &service.name);
        context.insert("service", service);
        files.extend(renderer.render(output, Scope::Tag, &context, options).await?);
    }
    for operation in &model.operations {
        let mut context = base.clone();
        context.insert("package", &packages.operations);
        context.insert("name", &operation.name);
        context.insert("operation", operation);
        files.extend(renderer.render(output, Scope::Operation, &context, options).await?);
    }
    for item in &model.models {
        let mut context = base.clone();
        context.insert("package", &packages.models);
        context.insert("name", &item.name);
        context.insert("model", item);
        files.extend(renderer.render(output, Scope::Model, &context, options).await?);
    }
    for item in &model.enums {
        let mut context = base.clone();
        context.insert("package", &packages.enums);
        context.insert("name", &item.name);
        context.insert("enum", item);
        files.extend(renderer.render(output, Scope::Enum, &context, options).await?);
    }

    // the same target may be produced by several scopes; keep the last write
    let mut seen = BTreeSet::new();
    let mut unique: Vec<RenderedFile> = files
        .into_iter()
        .rev()
        .filter(|f| seen.insert(f.relative.clone()))
        .collect();
    unique.reverse();
    Ok(unique)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::openapi::loader::parse_document;
    use crate::templates::EmbeddedTemplateLoader;
    use tempfile::TempDir;

    const PETSTORE: &str = r##"
openapi: 3.0.3
info:
  title: Petstore API
  version: 1.0.0
  description: Sample pets
servers:
  - url: https://pets.example.com/v1/
tags:
  - name: pets
paths:
  /pets/{petId}:
    get:
      operationId: getPet
      tags: [pets]
      parameters:
        - name: petId
          in: path
          required: true
          schema: {type: integer, format: int64}
      responses:
        "200":
          description: ok
          content:
            application/json:
              schema: {$ref: "#/components/schemas/Pet"}
components:
  schemas:
    Pet:
      type: object
      required: [id]
      properties:
        id: {type: integer, format: int64}
        status: {$ref: "#/components/schemas/Status"}
    Status:
      type: string
      enum: [available, sold]
"##;

    fn orchestrator() -> GenerationOrchestrator {
        GenerationOrchestrator::new(
            Arc::new(GeneratorRegistry::with_defaults()),
            Arc::new(EmbeddedTemplateLoader::new()),
        )
    }

    fn config(language: &str, output_dir: &std::path::Path) -> GeneratorConfig {
        GeneratorConfig {
            language: language.to_string(),
            template: "default".to_string(),
            output_dir: output_dir.to_path_buf(),
            artifact_id: "petstore".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_generate_default_template() {
        let dir = TempDir::new().unwrap();
        let doc = parse_document(PETSTORE.as_bytes()).unwrap();

        let result = orchestrator()
            .generate(&doc, &config("default", dir.path()))
            .await
            .unwrap();
        assert_eq!(result.template, "default");
        assert!(dir.path().join("README.md").exists());
        assert!(dir.path().join("project.yaml").exists());
        assert!(dir.path().join("operations/get_pet.md").exists());
        assert!(dir.path().join("models/pet.md").exists());
        assert!(dir.path().join("enums/status.md").exists());

        let readme = std::fs::read_to_string(dir.path().join("README.md")).unwrap();
        assert!(readme.contains("https://pets.example.com/v1"));

        let tracked = read_metadata(dir.path()).await.unwrap();
        assert_eq!(tracked.len(), result.count(FileState::Rendered));
    }

    #[tokio::test]
    async fn test_generate_go_client() {
        let dir = TempDir::new().unwrap();
        let doc = parse_document(PETSTORE.as_bytes()).unwrap();

        let result = orchestrator()
            .generate(&doc, &config("go", dir.path()))
            .await
            .unwrap();
        assert_eq!(result.template, "go/default");
        let model = std::fs::read_to_string(dir.path().join("model_pet.go")).unwrap();
        assert!(model.contains("type Pet struct"));
        assert!(model.contains("`json:\"id\"`"));
        let go_mod = std::fs::read_to_string(dir.path().join("go.mod")).unwrap();
        assert!(go_mod.starts_with("module petstore"));
    }

    #[tokio::test]
    async fn test_stale_files_removed_on_regeneration() {
        let dir = TempDir::new().unwrap();
        let doc = parse_document(PETSTORE.as_bytes()).unwrap();
        let orchestrator = orchestrator();
        orchestrator
            .generate(&doc, &config("default", dir.path()))
            .await
            .unwrap();
        assert!(dir.path().join("enums/status.md").exists());

        let mut smaller = doc.clone();
        smaller.components.schemas.shift_remove("Status");
        if let Some(pet) = smaller
            .components
            .schemas
            .get_mut("Pet")
            .and_then(|s| s.as_inline_mut())
        {
            pet.properties.shift_remove("status");
        }
        let result = orchestrator
            .generate(&smaller, &config("default", dir.path()))
            .await
            .unwrap();
        assert_eq!(result.removed, vec![PathBuf::from("enums/status.md")]);
        assert!(!dir.path().join("enums/status.md").exists());
    }

    #[tokio::test]
    async fn test_dry_run_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let doc = parse_document(PETSTORE.as_bytes()).unwrap();
        let mut config = config("default", dir.path());
        config.dry_run = true;

        let result = orchestrator().generate(&doc, &config).await.unwrap();
        assert!(result.files.iter().all(|f| f.state == FileState::DryRun));
        assert!(!dir.path().join("README.md").exists());
        assert!(read_metadata(dir.path()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_scope_and_missing_artifact() {
        let dir = TempDir::new().unwrap();
        let doc = parse_document(PETSTORE.as_bytes()).unwrap();

        let mut bad_scope = config("default", dir.path());
        bad_scope.scopes = vec!["everything".into()];
        let err = orchestrator().generate(&doc, &bad_scope).await.unwrap_err();
        assert!(matches!(err, GenerationError::ValidationError(_)));

        let mut go = config("go", dir.path());
        go.artifact_id.clear();
        let err = orchestrator().generate(&doc, &go).await.unwrap_err();
        assert!(matches!(err, GenerationError::ValidationError(_)));
    }

    #[test]
    fn test_artifact_id_defaults_to_slug() {
        let model = DocumentModel {
            name: "Petstore Service".into(),
            ..Default::default()
        };
        let metadata = TemplateMetadata::new(&model, &GeneratorConfig::default());
        assert_eq!(metadata.artifact_id, "petstore-service");
    }
}
