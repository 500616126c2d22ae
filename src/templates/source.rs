//! Template set loading from the binary or from a directory

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use indexmap::IndexMap;
use rust_embed::RustEmbed;
use tracing::debug;

use super::errors::TemplateError;
use super::manifest::{MANIFEST_FILE, TemplateManifest};

/// Template sets embedded at compile time
#[derive(RustEmbed)]
#[folder = "templates/"]
struct EmbeddedTemplates;

/// A loaded template set: its manifest plus every file under its root,
/// keyed by path relative to that root with `/` separators.
#[derive(Debug, Clone)]
pub struct TemplateSet {
    pub id: String,
    pub manifest: TemplateManifest,
    pub files: IndexMap<String, String>,
}

impl TemplateSet {
    /// Builds a set, checking that every file the manifest references exists.
    pub fn new(
        id: impl Into<String>,
        manifest: TemplateManifest,
        files: IndexMap<String, String>,
    ) -> Result<Self, TemplateError> {
        let id = id.into();
        for referenced in manifest.referenced_files() {
            if !files.contains_key(referenced) {
                return Err(TemplateError::invalid_manifest(format!(
                    "{id}: referenced file '{referenced}' does not exist"
                )));
            }
        }
        Ok(Self {
            id,
            manifest,
            files,
        })
    }

    pub fn file(&self, path: &str) -> Option<&str> {
        self.files.get(path).map(String::as_str)
    }
}

/// Lookup order for a template set: generator specific first, then shared.
pub fn template_candidates(generator_id: &str, template: &str) -> Vec<String> {
    vec![format!("{generator_id}/{template}"), template.to_string()]
}

#[async_trait]
pub trait TemplateLoader: Send + Sync {
    /// Loads the set at `id`, or `None` when no manifest lives there.
    async fn try_load(&self, id: &str) -> Result<Option<TemplateSet>, TemplateError>;

    /// Set identifiers this loader can provide
    async fn list(&self) -> Result<Vec<String>, TemplateError>;

    /// First set found among `candidates`
    async fn load_first(&self, candidates: &[String]) -> Result<TemplateSet, TemplateError> {
        for candidate in candidates {
            if let Some(set) = self.try_load(candidate).await? {
                debug!(template = %candidate, files = set.files.len(), "Template set loaded");
                return Ok(set);
            }
        }
        Err(TemplateError::not_found(candidates.join(", ")))
    }
}

/// Loader for the sets shipped inside the binary
#[derive(Debug, Default, Clone, Copy)]
pub struct EmbeddedTemplateLoader;

impl EmbeddedTemplateLoader {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TemplateLoader for EmbeddedTemplateLoader {
    async fn try_load(&self, id: &str) -> Result<Option<TemplateSet>, TemplateError> {
        let id = id.trim_matches('/');
        let manifest_path = format!("{id}/{MANIFEST_FILE}");
        let Some(manifest_file) = EmbeddedTemplates::get(&manifest_path) else {
            return Ok(None);
        };
        let content = std::str::from_utf8(manifest_file.data.as_ref()).map_err(|e| {
            TemplateError::invalid_manifest(format!("{manifest_path}: {e}"))
        })?;
        let manifest = TemplateManifest::from_yaml(content, &manifest_path)?;

        let prefix = format!("{id}/");
        let mut files = IndexMap::new();
        for path in EmbeddedTemplates::iter() {
            let Some(relative) = path.strip_prefix(&prefix) else {
                continue;
            };
            if relative == MANIFEST_FILE {
                continue;
            }
            if let Some(file) = EmbeddedTemplates::get(&path) {
                files.insert(
                    relative.to_string(),
                    String::from_utf8_lossy(&file.data).into_owned(),
                );
            }
        }
        TemplateSet::new(id, manifest, files).map(Some)
    }

    async fn list(&self) -> Result<Vec<String>, TemplateError> {
        let suffix = format!("/{MANIFEST_FILE}");
        let mut ids: Vec<String> = EmbeddedTemplates::iter()
            .filter_map(|p| p.strip_suffix(suffix.as_str()).map(str::to_string))
            .collect();
        ids.sort();
        Ok(ids)
    }
}

/// Loader for sets kept on disk. `root` either is a set itself or holds
/// sets in subdirectories laid out like the embedded ones.
#[derive(Debug, Clone)]
pub struct DirectoryTemplateLoader {
    root: PathBuf,
}

impl DirectoryTemplateLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    async fn read_set(&self, dir: &Path, id: &str) -> Result<TemplateSet, TemplateError> {
        let manifest_path = dir.join(MANIFEST_FILE);
        let content = tokio::fs::read_to_string(&manifest_path).await?;
        let manifest = TemplateManifest::from_yaml(&content, &manifest_path.display().to_string())?;

        let mut files = IndexMap::new();
        let mut pending = vec![dir.to_path_buf()];
        while let Some(current) = pending.pop() {
            let mut entries = tokio::fs::read_dir(&current).await?;
            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                if entry.file_type().await?.is_dir() {
                    pending.push(path);
                    continue;
                }
                let Ok(relative) = path.strip_prefix(dir) else {
                    continue;
                };
                let relative = relative.to_string_lossy().replace('\\', "/");
                if relative == MANIFEST_FILE {
                    continue;
                }
                files.insert(relative, tokio::fs::read_to_string(&path).await?);
            }
        }
        files.sort_keys();
        TemplateSet::new(id, manifest, files)
    }
}

#[async_trait]
impl TemplateLoader for DirectoryTemplateLoader {
    async fn try_load(&self, id: &str) -> Result<Option<TemplateSet>, TemplateError> {
        let nested = self.root.join(id);
        if tokio::fs::try_exists(nested.join(MANIFEST_FILE)).await? {
            return self.read_set(&nested, id).await.map(Some);
        }
        Ok(None)
    }

    async fn list(&self) -> Result<Vec<String>, TemplateError> {
        let mut ids = Vec::new();
        if tokio::fs::try_exists(self.root.join(MANIFEST_FILE)).await? {
            ids.push(".".to_string());
        }
        let mut entries = tokio::fs::read_dir(&self.root).await?;
        while let Some(entry) = entries.next_entry().await? {
            if tokio::fs::try_exists(entry.path().join(MANIFEST_FILE)).await? {
                ids.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        ids.sort();
        Ok(ids)
    }

    /// Falls back to the root itself when no candidate subdirectory matches.
    async fn load_first(&self, candidates: &[String]) -> Result<TemplateSet, TemplateError> {
        for candidate in candidates {
            if let Some(set) = self.try_load(candidate).await? {
                debug!(template = %candidate, root = %self.root.display(), "Template set loaded");
                return Ok(set);
            }
        }
        if tokio::fs::try_exists(self.root.join(MANIFEST_FILE)).await? {
            let id = self.root.display().to_string();
            return self.read_set(&self.root, &id).await;
        }
        Err(TemplateError::not_found(format!(
            "{} (looked for {})",
            self.root.display(),
            candidates.join(", ")
        )))
    }
}
