//! Use case running merge, patch and generation over a set of documents

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use crate::application::{
    ApplicationError, DocumentStore, MergeRequest, PatchRequest, PipelineReport, PipelineRequest,
};
use crate::core::GeneratorConfig;
use crate::generation::{GenerationOrchestrator, GenerationResult};
use crate::merge::{MergeOutcome, merge_documents};
use crate::openapi::Document;
use crate::patch::overlay::info_overlay;
use crate::patch::{SpecPatch, apply_patches};

/// Use case for the document pipeline
pub struct PipelineUseCase {
    store: Arc<dyn DocumentStore>,
    generation_orchestrator: Arc<GenerationOrchestrator>,
}

impl PipelineUseCase {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        generation_orchestrator: Arc<GenerationOrchestrator>,
    ) -> Self {
        Self {
            store,
            generation_orchestrator,
        }
    }

    /// Loads and merges the inputs, then applies the info seed if any.
    pub async fn merge(&self, request: &MergeRequest) -> Result<MergeOutcome, ApplicationError> {
        request.validate()?;

        let mut documents = Vec::with_capacity(request.inputs.len());
        for input in &request.inputs {
            documents.push(self.store.load(input).await?);
        }
        let seed = match &request.seed {
            Some(path) => Some(self.store.load(path).await?),
            None => None,
        };

        let mut outcome = merge_documents(&documents, seed)?;
        if let Some(info) = &request.info {
            let overlay = info_overlay(
                &info.title,
                info.description.as_deref(),
                info.license.as_deref(),
            );
            let patch = SpecPatch {
                patch_type: "openapi-overlay".to_string(),
                content: overlay.to_yaml()?,
                description: "Seed document info".to_string(),
                ..Default::default()
            };
            outcome.document = apply_patches(&outcome.document, &[patch], None).await?;
        }
        Ok(outcome)
    }

    /// Applies every patch in order; on failure the input is left untouched.
    pub async fn patch(
        &self,
        document: &Document,
        request: &PatchRequest,
    ) -> Result<(Document, usize), ApplicationError> {
        let patches = request.all_patches();
        let patched =
            apply_patches(document, &patches, Some(request.base_dir.clone())).await?;
        Ok((patched, patches.len()))
    }

    pub async fn generate(
        &self,
        document: &Document,
        config: &GeneratorConfig,
    ) -> Result<GenerationResult, ApplicationError> {
        Ok(self.generation_orchestrator.generate(document, config).await?)
    }

    pub async fn write(&self, path: &Path, document: &Document) -> Result<(), ApplicationError> {
        self.store.write(path, document).await
    }

    pub async fn execute(
        &self,
        request: PipelineRequest,
    ) -> Result<PipelineReport, ApplicationError> {
        let started_at = Utc::now();

        // 1. Merge inputs
        let outcome = self.merge(&request.merge).await?;

        // 2. Patch
        let (document, patches_applied) = self.patch(&outcome.document, &request.patch).await?;

        // 3. Write the transformed document
        if let Some(output) = &request.output {
            self.store.write(output, &document).await?;
            info!(path = %output.display(), "Wrote transformed document");
        }

        // 4. Generate
        let generation = match &request.generator {
            Some(config) => Some(self.generate(&document, config).await?),
            None => None,
        };

        let report = PipelineReport {
            started_at,
            finished_at: Utc::now(),
            inputs: request.merge.inputs.len(),
            merge: outcome.report,
            patches_applied,
            output: request.output,
            generation,
        };
        info!(
            inputs = report.inputs,
            patches = report.patches_applied,
            collisions = report.merge.collisions.len(),
            elapsed_ms = report.elapsed_ms(),
            "Pipeline finished"
        );
        Ok(report)
    }
}
