//! End-to-end tests for the merge, patch and generate pipeline

use std::path::{Path, PathBuf};
use std::sync::Arc;

use specweave::application::{FileDocumentStore, PipelineRequest, PipelineUseCase};
use specweave::core::PipelineConfig;
use specweave::generation::{GenerationOrchestrator, GeneratorRegistry};
use specweave::openapi::load_document;
use specweave::templates::{EmbeddedTemplateLoader, FileState};
use tempfile::TempDir;

fn fixtures() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn copy_fixtures(dir: &Path) {
    for name in ["books.yaml", "authors.yaml", "rename-title.jsonpatch"] {
        std::fs::copy(fixtures().join(name), dir.join(name)).unwrap();
    }
}

fn use_case() -> PipelineUseCase {
    PipelineUseCase::new(
        Arc::new(FileDocumentStore::new()),
        Arc::new(GenerationOrchestrator::new(
            Arc::new(GeneratorRegistry::with_defaults()),
            Arc::new(EmbeddedTemplateLoader::new()),
        )),
    )
}

const CONFIG: &str = r#"
inputs:
  - books.yaml
  - authors.yaml
info:
  title: Library
  description: Books and authors
patches:
  - jsonpatch:rename-title.jsonpatch
patch_sets:
  - id: code-generation
output: build/openapi.yaml
generator:
  language: go
  artifact_group_id: example.com
  artifact_id: library
  output_dir: build/client
"#;

async fn run(dir: &Path, config: &str) -> specweave::application::PipelineReport {
    let path = dir.join("pipeline.yaml");
    std::fs::write(&path, config).unwrap();
    let config = PipelineConfig::load(&path).await.unwrap();
    use_case()
        .execute(PipelineRequest::from_config(&config, dir.to_path_buf()))
        .await
        .unwrap()
}

#[tokio::test]
async fn test_pipeline_from_config() {
    let dir = TempDir::new().unwrap();
    copy_fixtures(dir.path());

    let report = run(dir.path(), CONFIG).await;
    assert_eq!(report.inputs, 2);
    assert_eq!(report.patches_applied, 7);
    assert!(!report.merge.has_collisions());

    let merged = load_document(&dir.path().join("build/openapi.yaml"))
        .await
        .unwrap();
    assert_eq!(merged.info.title, "Library");
    assert_eq!(merged.info.version, "2.0.0");
    assert!(merged.components.schemas.contains_key("Author"));
    assert!(merged.components.schemas.contains_key("PostBooksV2B"));

    let operation_ids: Vec<&str> = merged
        .operations()
        .map(|(_, _, op)| op.operation_id.as_str())
        .collect();
    assert_eq!(operation_ids.len(), 3);
    assert!(operation_ids.contains(&"getBookByBookIdV1"));
    assert!(operation_ids.contains(&"postBooksV2"));

    let client = dir.path().join("build/client");
    let go_mod = std::fs::read_to_string(client.join("go.mod")).unwrap();
    assert!(go_mod.starts_with("module example.com/library"));
    let author = std::fs::read_to_string(client.join("model_author.go")).unwrap();
    assert!(author.contains("\"time\""));
    assert!(author.contains("`json:\"name\"`"));

    let generation = report.generation.unwrap();
    assert_eq!(generation.template, "go/default");
    assert_eq!(generation.count(FileState::SkippedByName), 0);
}

#[tokio::test]
async fn test_regeneration_is_stable_and_honours_ignore_list() {
    let dir = TempDir::new().unwrap();
    copy_fixtures(dir.path());
    let first = run(dir.path(), CONFIG).await.generation.unwrap();

    let ignored = format!("{CONFIG}  ignore_files: [go.mod]\n");
    std::fs::write(dir.path().join("build/client/go.mod"), "module hand/edited\n").unwrap();
    let second = run(dir.path(), &ignored).await.generation.unwrap();

    assert!(second.removed.is_empty());
    assert_eq!(first.files.len(), second.files.len());
    assert_eq!(second.count(FileState::SkippedByName), 1);
    let go_mod = std::fs::read_to_string(dir.path().join("build/client/go.mod")).unwrap();
    assert_eq!(go_mod, "module hand/edited\n");
}

#[tokio::test]
async fn test_invalid_config_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("pipeline.toml");
    std::fs::write(&path, "inputs = []\n").unwrap();

    let err = PipelineConfig::load(&path).await.unwrap_err();
    assert!(err.to_string().contains("at least one input document is required"));
}
