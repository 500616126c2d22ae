//! Data Transfer Objects for application layer

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::application::ValidationError;
use crate::builtin::PatchSet;
use crate::core::{GeneratorConfig, InfoSeed, PipelineConfig};
use crate::generation::GenerationResult;
use crate::merge::MergeReport;
use crate::patch::SpecPatch;

/// Request to merge several documents into one
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MergeRequest {
    pub inputs: Vec<PathBuf>,
    pub seed: Option<PathBuf>,
    pub info: Option<InfoSeed>,
}

impl MergeRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.inputs.is_empty() {
            return Err(ValidationError::NoInputs);
        }
        if let Some(info) = &self.info {
            if info.title.trim().is_empty() {
                return Err(ValidationError::MissingField("info.title".to_string()));
            }
        }
        Ok(())
    }
}

/// Patches applied after merging; patch files resolve against `base_dir`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PatchRequest {
    pub patches: Vec<SpecPatch>,
    pub patch_sets: Vec<PatchSet>,
    pub base_dir: PathBuf,
}

impl PatchRequest {
    /// Explicit patches followed by every expanded patch set.
    pub fn all_patches(&self) -> Vec<SpecPatch> {
        let mut patches = self.patches.clone();
        patches.extend(crate::builtin::resolve_patch_sets(&self.patch_sets));
        patches
    }
}

/// A full pipeline run as described by a configuration file
#[derive(Debug, Clone)]
pub struct PipelineRequest {
    pub merge: MergeRequest,
    pub patch: PatchRequest,
    pub output: Option<PathBuf>,
    pub generator: Option<GeneratorConfig>,
}

impl PipelineRequest {
    /// `base_dir` is where relative patch files are looked up, normally the
    /// configuration file's directory.
    pub fn from_config(config: &PipelineConfig, base_dir: PathBuf) -> Self {
        Self {
            merge: MergeRequest {
                inputs: config.inputs.clone(),
                seed: config.seed.clone(),
                info: config.info.clone(),
            },
            patch: PatchRequest {
                patches: config.patches.clone(),
                patch_sets: config.patch_sets.clone(),
                base_dir,
            },
            output: config.output.clone(),
            generator: config.generator.clone(),
        }
    }
}

/// Summary of a pipeline run
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub inputs: usize,
    pub merge: MergeReport,
    pub patches_applied: usize,
    pub output: Option<PathBuf>,
    pub generation: Option<GenerationResult>,
}

impl PipelineReport {
    pub fn elapsed_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }
}
