//! specweave CLI entrypoint
//! Parses command-line arguments and dispatches to the pipeline use case.
#![deny(unsafe_code)]

// Internal imports (std, crate)
use std::path::{Path, PathBuf};
use std::sync::Arc;

use specweave::application::{
    FileDocumentStore, MergeRequest, PatchRequest, PipelineRequest, PipelineUseCase,
};
use specweave::builtin::{self, PatchSet};
use specweave::core::{GeneratorConfig, InfoSeed, PipelineConfig};
use specweave::generation::{GenerationOrchestrator, GenerationResult, GeneratorRegistry};
use specweave::openapi::{Document, Format, render_document};
use specweave::patch::parse_patch_specs;
use specweave::templates::{EmbeddedTemplateLoader, FileState, TemplateLoader};

// External imports (alphabetized)
use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use indexmap::IndexMap;
use tracing::{Level, error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "specweave")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Merge several documents into one
    Merge {
        #[command(flatten)]
        merge: MergeArgs,
        /// Output file; YAML or JSON by extension, stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Apply patches and patch sets to a document
    Patch {
        /// Input document (YAML or JSON)
        #[arg(short, long)]
        input: PathBuf,
        #[command(flatten)]
        patches: PatchArgs,
        /// Output file; YAML or JSON by extension, stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Render a document through a generator's template set
    Generate {
        /// Input document (YAML or JSON)
        #[arg(short, long)]
        input: PathBuf,
        #[command(flatten)]
        generator: GeneratorArgs,
    },
    /// Run a full pipeline described by a configuration file
    Run {
        /// Pipeline configuration (YAML, or TOML by extension)
        #[arg(short, long)]
        config: PathBuf,
    },
    /// List builtin patches and patch sets
    Patches,
    /// List code generators and embedded template sets
    Generators,
}

#[derive(Args, Debug)]
pub struct MergeArgs {
    /// Input documents, merged in order
    #[arg(short, long = "input", required = true)]
    inputs: Vec<PathBuf>,
    /// Document to merge into instead of the first input
    #[arg(long)]
    seed: Option<PathBuf>,
    /// Title for the merged document's info block
    #[arg(long)]
    title: Option<String>,
    /// Description for the merged document's info block
    #[arg(long, requires = "title")]
    description: Option<String>,
    /// License name for the merged document's info block
    #[arg(long, requires = "title")]
    license: Option<String>,
}

impl MergeArgs {
    fn into_request(self) -> MergeRequest {
        let info = self.title.map(|title| InfoSeed {
            title,
            description: self.description,
            license: self.license,
        });
        MergeRequest {
            inputs: self.inputs,
            seed: self.seed,
            info,
        }
    }
}

#[derive(Args, Debug)]
pub struct PatchArgs {
    /// Patch as `type:file`, or a builtin id
    #[arg(short, long = "patch")]
    patches: Vec<String>,
    /// Patch set id, e.g. `code-generation`
    #[arg(long = "patch-set")]
    patch_sets: Vec<String>,
}

impl PatchArgs {
    fn into_request(self) -> anyhow::Result<PatchRequest> {
        Ok(PatchRequest {
            patches: parse_patch_specs(&self.patches).context("Invalid patch reference")?,
            patch_sets: self.patch_sets.iter().map(|id| PatchSet::new(id)).collect(),
            base_dir: PathBuf::from("."),
        })
    }
}

#[derive(Args, Debug)]
pub struct GeneratorArgs {
    /// Generator id or language alias
    #[arg(short, long)]
    language: String,
    /// Template set name
    #[arg(long, default_value = "default")]
    template: String,
    /// Custom template directory
    #[arg(long)]
    template_dir: Option<PathBuf>,
    /// Output directory for generated code
    #[arg(short, long)]
    output_dir: PathBuf,
    /// Render without writing files
    #[arg(long)]
    dry_run: bool,
    /// Only write files of these scopes
    #[arg(long = "scope")]
    scopes: Vec<String>,
    /// Never write files with these names
    #[arg(long = "ignore")]
    ignore_files: Vec<String>,
    #[arg(long)]
    group_id: Option<String>,
    #[arg(long)]
    artifact_id: Option<String>,
    #[arg(long)]
    repository_url: Option<String>,
    #[arg(long)]
    license_name: Option<String>,
    #[arg(long)]
    license_url: Option<String>,
    /// Extra template property as `key=value`
    #[arg(long = "property", value_parser = parse_property)]
    properties: Vec<(String, String)>,
}

impl GeneratorArgs {
    fn into_config(self) -> anyhow::Result<GeneratorConfig> {
        let config = GeneratorConfig {
            language: self.language,
            template: self.template,
            template_dir: self.template_dir,
            output_dir: self.output_dir,
            dry_run: self.dry_run,
            scopes: self.scopes,
            ignore_files: self.ignore_files,
            artifact_group_id: self.group_id.unwrap_or_default(),
            artifact_id: self.artifact_id.unwrap_or_default(),
            repository_url: self.repository_url.unwrap_or_default(),
            license_name: self.license_name.unwrap_or_default(),
            license_url: self.license_url.unwrap_or_default(),
            properties: self.properties.into_iter().collect::<IndexMap<_, _>>(),
        };
        config.validate_urls()?;
        Ok(config)
    }
}

fn parse_property(value: &str) -> Result<(String, String), String> {
    value
        .split_once('=')
        .map(|(k, v)| (k.trim().to_string(), v.to_string()))
        .filter(|(k, _)| !k.is_empty())
        .ok_or_else(|| format!("expected key=value, got '{value}'"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging with default level INFO, DEBUG with --verbose
    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .init();

    let use_case = pipeline_use_case();
    match cli.command {
        Commands::Merge { merge, output } => {
            let outcome = use_case
                .merge(&merge.into_request())
                .await
                .context("Failed to merge documents")?;
            if outcome.report.has_collisions() {
                warn!(
                    collisions = outcome.report.collisions.len(),
                    "Merged with collisions; first writer kept"
                );
            }
            emit(&use_case, &outcome.document, output.as_deref()).await?;
        }
        Commands::Patch {
            input,
            patches,
            output,
        } => {
            let document = load(&input).await?;
            let request = patches.into_request()?;
            let (patched, applied) = use_case
                .patch(&document, &request)
                .await
                .context("Failed to apply patches")?;
            info!(patches = applied, "Patched document");
            emit(&use_case, &patched, output.as_deref()).await?;
        }
        Commands::Generate { input, generator } => {
            let document = load(&input).await?;
            let config = generator.into_config()?;
            let result = use_case
                .generate(&document, &config)
                .await
                .context("Failed to generate code")?;
            summarize(&result);
        }
        Commands::Run { config } => {
            let pipeline = PipelineConfig::load(&config)
                .await
                .with_context(|| format!("Failed to load configuration {}", config.display()))?;
            let base_dir = config
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from("."));
            let report = use_case
                .execute(PipelineRequest::from_config(&pipeline, base_dir))
                .await
                .map_err(|e| {
                    error!(error = %e, "Pipeline failed");
                    e
                })
                .context("Pipeline failed")?;
            if report.output.is_none() && report.generation.is_none() {
                warn!("Configuration has neither output nor generator; nothing was written");
            }
            if let Some(result) = &report.generation {
                summarize(result);
            }
        }
        Commands::Patches => {
            for patch in builtin::registry().list() {
                println!("{:<36} {}", patch.id, patch.description);
            }
            println!();
            for set in builtin::sets::PRESETS {
                println!("{:<36} {} ({})", set.id, set.description, set.patches.join(", "));
            }
        }
        Commands::Generators => {
            for generator in GeneratorRegistry::with_defaults().list() {
                println!("{:<12} {}", generator.id(), generator.description());
            }
            let templates = EmbeddedTemplateLoader::new()
                .list()
                .await
                .context("Failed to list embedded templates")?;
            println!();
            for template in templates {
                println!("template {template}");
            }
        }
    }
    Ok(())
}

fn pipeline_use_case() -> PipelineUseCase {
    let orchestrator = GenerationOrchestrator::new(
        Arc::new(GeneratorRegistry::with_defaults()),
        Arc::new(EmbeddedTemplateLoader::new()),
    );
    PipelineUseCase::new(Arc::new(FileDocumentStore::new()), Arc::new(orchestrator))
}

async fn load(path: &Path) -> anyhow::Result<Document> {
    specweave::openapi::load_document(path)
        .await
        .with_context(|| format!("Failed to load {}", path.display()))
}

/// Writes to `output`, or prints YAML to stdout.
async fn emit(use_case: &PipelineUseCase, document: &Document, output: Option<&Path>) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            use_case
                .write(path, document)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!(path = %path.display(), "Wrote document");
        }
        None => {
            let bytes = render_document(document, Format::Yaml)?;
            print!("{}", String::from_utf8_lossy(&bytes));
        }
    }
    Ok(())
}

fn summarize(result: &GenerationResult) {
    info!(
        generator = %result.generator,
        template = %result.template,
        rendered = result.count(FileState::Rendered),
        dry_run = result.count(FileState::DryRun),
        skipped = result.count(FileState::SkippedByName) + result.count(FileState::SkippedByScope),
        removed = result.removed.len(),
        "Generation finished"
    );
}
