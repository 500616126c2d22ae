//! Ordered patch application.
//!
//! A patch is one of:
//! - `builtin`: a named in-process transform on the typed document;
//! - `jsonpatch`: RFC 6902 operations on the raw tree;
//! - `git`: a unified diff on the rendered text;
//! - `openapi-overlay`: JSONPath-targeted update and remove actions.
//!
//! `file` patches pick `jsonpatch` or `git` from the file suffix. Text
//! patches render the document, patch the bytes and re-parse the result from
//! scratch; builtins act on the typed model. The first failure aborts the
//! whole sequence and the caller's document is left untouched.

pub mod git_patch;
pub mod json_patch;
pub mod json_path;
pub mod overlay;

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::fs;
use tracing::{debug, info};

use crate::builtin::BuiltinRegistry;
use crate::core::error::{Error, Result};
use crate::openapi::loader::{parse_document, render_document, Format};
use crate::openapi::Document;

/// Free-form per-patch configuration.
pub type PatchConfig = IndexMap<String, Value>;

/// Declarative patch reference as written in configuration or on the command
/// line.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpecPatch {
    #[serde(rename = "type", default)]
    pub patch_type: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub file: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub content: String,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub config: PatchConfig,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

impl SpecPatch {
    pub fn builtin(id: &str) -> Self {
        SpecPatch {
            patch_type: PatchType::Builtin.to_string(),
            id: id.to_string(),
            ..Default::default()
        }
    }

    pub fn with_config(mut self, config: PatchConfig) -> Self {
        self.config = config;
        self
    }
}

impl fmt::Display for SpecPatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (t, id, file) = (&self.patch_type, &self.id, &self.file);
        if !t.is_empty() && !self.content.is_empty() {
            write!(f, "{t}:<content>")
        } else if !t.is_empty() && !file.is_empty() && id.is_empty() {
            write!(f, "{t}:{file}")
        } else if !t.is_empty() && !id.is_empty() && file.is_empty() {
            write!(f, "{t}:{id}")
        } else if t.is_empty() && !file.is_empty() {
            write!(f, "file:{file}")
        } else {
            write!(f, "{t}:{id}:{file}")
        }
    }
}

/// `type:value` shorthand; a bare value names a builtin.
impl FromStr for SpecPatch {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(Error::config("empty patch reference"));
        }
        let (patch_type, value) = s.split_once(':').unwrap_or(("builtin", s));
        if patch_type == "builtin" {
            Ok(SpecPatch::builtin(value))
        } else {
            Ok(SpecPatch {
                patch_type: patch_type.to_string(),
                file: value.to_string(),
                ..Default::default()
            })
        }
    }
}

pub fn parse_patch_specs<S: AsRef<str>>(values: &[S]) -> Result<Vec<SpecPatch>> {
    values.iter().map(|v| v.as_ref().parse()).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PatchType {
    Builtin,
    JsonPatch,
    Git,
    Overlay,
    File,
}

impl fmt::Display for PatchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PatchType::Builtin => "builtin",
            PatchType::JsonPatch => "jsonpatch",
            PatchType::Git => "git",
            PatchType::Overlay => "openapi-overlay",
            PatchType::File => "file",
        })
    }
}

impl FromStr for PatchType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "builtin" | "" => Ok(PatchType::Builtin),
            "jsonpatch" => Ok(PatchType::JsonPatch),
            "git" => Ok(PatchType::Git),
            "openapi-overlay" | "overlay" => Ok(PatchType::Overlay),
            "file" => Ok(PatchType::File),
            other => Err(Error::UnsupportedPatch(format!("type: {other}"))),
        }
    }
}

/// Patch kinds that operate on document text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextPatchKind {
    JsonPatch,
    Git,
    Overlay,
}

impl TextPatchKind {
    /// Resolves the declared type, mapping `file` patches by suffix.
    pub fn for_patch(patch: &SpecPatch) -> Result<Self> {
        match patch.patch_type.parse::<PatchType>()? {
            PatchType::JsonPatch => Ok(TextPatchKind::JsonPatch),
            PatchType::Git => Ok(TextPatchKind::Git),
            PatchType::Overlay => Ok(TextPatchKind::Overlay),
            PatchType::File if patch.file.ends_with(".jsonpatch") => Ok(TextPatchKind::JsonPatch),
            PatchType::File if patch.file.ends_with(".patch") => Ok(TextPatchKind::Git),
            PatchType::File => Err(Error::UnsupportedPatch(format!("file: {}", patch.file))),
            PatchType::Builtin => Err(Error::UnsupportedPatch(
                "builtin patches do not apply to text".to_string(),
            )),
        }
    }

    pub fn apply(&self, input: &[u8], content: &[u8]) -> Result<Vec<u8>> {
        match self {
            TextPatchKind::JsonPatch => json_patch::apply_json_patch(input, content),
            TextPatchKind::Git => git_patch::apply_git_patch(input, content),
            TextPatchKind::Overlay => overlay::apply_overlay(input, content),
        }
    }

    pub fn validate(&self, content: &[u8]) -> Result<()> {
        match self {
            TextPatchKind::JsonPatch => json_patch::validate_json_patch(content),
            TextPatchKind::Git => git_patch::validate_git_patch(content),
            TextPatchKind::Overlay => overlay::validate_overlay(content),
        }
    }
}

/// A patch whose content has been loaded and whose kind is known.
#[derive(Debug, Clone)]
pub enum ResolvedPatch {
    Builtin(SpecPatch),
    Text {
        spec: SpecPatch,
        kind: TextPatchKind,
        content: Vec<u8>,
    },
}

impl ResolvedPatch {
    pub fn spec(&self) -> &SpecPatch {
        match self {
            ResolvedPatch::Builtin(spec) | ResolvedPatch::Text { spec, .. } => spec,
        }
    }
}

/// Loads a patch's content from `content` or from `file`, relative paths
/// resolving against `base_dir`.
pub async fn resolve_patch(spec: &SpecPatch, base_dir: &Path) -> Result<ResolvedPatch> {
    if spec.patch_type.parse::<PatchType>()? == PatchType::Builtin {
        return Ok(ResolvedPatch::Builtin(spec.clone()));
    }
    let kind = TextPatchKind::for_patch(spec)?;
    let content = if !spec.content.is_empty() {
        spec.content.clone().into_bytes()
    } else if !spec.file.is_empty() {
        let path = base_dir.join(&spec.file);
        debug!(patch = %spec, path = %path.display(), "Reading patch file");
        fs::read(&path).await.map_err(|e| {
            Error::patch(spec, format!("failed to read patch file {}: {}", path.display(), e))
        })?
    } else {
        return Err(Error::patch(
            spec,
            "external patch must have either content or file specified",
        ));
    };
    Ok(ResolvedPatch::Text {
        spec: spec.clone(),
        kind,
        content,
    })
}

pub async fn resolve_patches(specs: &[SpecPatch], base_dir: &Path) -> Result<Vec<ResolvedPatch>> {
    let mut resolved = Vec::with_capacity(specs.len());
    for spec in specs {
        resolved.push(resolve_patch(spec, base_dir).await?);
    }
    Ok(resolved)
}

/// Checks a patch without applying it.
pub async fn validate_patch(spec: &SpecPatch, base_dir: &Path, registry: &BuiltinRegistry) -> Result<()> {
    match resolve_patch(spec, base_dir).await? {
        ResolvedPatch::Builtin(spec) => registry
            .get(&spec.id)
            .map(|_| ())
            .ok_or_else(|| Error::patch(&spec, format!("builtin patch [{}] is not supported", spec.id))),
        ResolvedPatch::Text { spec, kind, content } => {
            kind.validate(&content).map_err(|e| with_identity(&spec, e))
        }
    }
}

fn with_identity(spec: &SpecPatch, error: Error) -> Error {
    match error {
        Error::Patch { message, .. } => Error::patch(spec, message),
        other => Error::patch(spec, other),
    }
}

/// Applies patches in order to a copy of `document`.
pub struct PatchEngine<'r> {
    registry: &'r BuiltinRegistry,
}

impl<'r> PatchEngine<'r> {
    pub fn new(registry: &'r BuiltinRegistry) -> Self {
        Self { registry }
    }

    pub fn apply(&self, document: &Document, patches: &[ResolvedPatch]) -> Result<Document> {
        let mut current = document.clone();
        for patch in patches {
            current = self
                .apply_one(current, patch)
                .map_err(|e| with_identity(patch.spec(), e))?;
        }
        info!(patches = patches.len(), "Applied patches");
        Ok(current)
    }

    fn apply_one(&self, mut document: Document, patch: &ResolvedPatch) -> Result<Document> {
        match patch {
            ResolvedPatch::Builtin(spec) => {
                let builtin = self.registry.get(&spec.id).ok_or_else(|| {
                    Error::patch(spec, format!("builtin patch [{}] is not supported", spec.id))
                })?;
                debug!(patch = %spec, "Applying builtin patch");
                (builtin.apply)(&mut document, &spec.config)?;
                Ok(document)
            }
            ResolvedPatch::Text {
                spec,
                kind,
                content,
            } => {
                debug!(patch = %spec, "Applying text patch");
                let input = render_document(&document, Format::Yaml)?;
                let output = kind.apply(&input, content)?;
                parse_document(&output)
            }
        }
    }
}

/// Resolves and applies `specs` to `document` with the default builtin
/// registry.
pub async fn apply_patches(
    document: &Document,
    specs: &[SpecPatch],
    base_dir: Option<PathBuf>,
) -> Result<Document> {
    let base_dir = base_dir.unwrap_or_else(|| PathBuf::from("."));
    let resolved = resolve_patches(specs, &base_dir).await?;
    PatchEngine::new(crate::builtin::registry()).apply(document, &resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::openapi::parse_document;
    use tempfile::tempdir;

    const DOC: &str = r#"
openapi: 3.0.3
info: {title: Pets, version: "1.0"}
paths:
  /pets:
    get:
      responses:
        "200": {description: ok}
"#;

    #[test]
    fn test_display_forms() {
        let content = SpecPatch {
            patch_type: "jsonpatch".into(),
            content: "[]".into(),
            ..Default::default()
        };
        assert_eq!(content.to_string(), "jsonpatch:<content>");
        assert_eq!("git:fix.patch".parse::<SpecPatch>().unwrap().to_string(), "git:fix.patch");
        assert_eq!(SpecPatch::builtin("fix-common").to_string(), "builtin:fix-common");
        let file_only = SpecPatch {
            file: "a.patch".into(),
            ..Default::default()
        };
        assert_eq!(file_only.to_string(), "file:a.patch");
        let both = SpecPatch {
            patch_type: "builtin".into(),
            id: "x".into(),
            file: "y".into(),
            ..Default::default()
        };
        assert_eq!(both.to_string(), "builtin:x:y");
    }

    #[test]
    fn test_parse_shorthand() {
        let specs = parse_patch_specs(&["flatten-components", "jsonpatch:fixes/a.jsonpatch"]).unwrap();
        assert_eq!(specs[0], SpecPatch::builtin("flatten-components"));
        assert_eq!(specs[1].patch_type, "jsonpatch");
        assert_eq!(specs[1].file, "fixes/a.jsonpatch");
        assert!(specs[1].id.is_empty());
    }

    #[test]
    fn test_file_kind_by_suffix() {
        let spec = |file: &str| SpecPatch {
            patch_type: "file".into(),
            file: file.into(),
            ..Default::default()
        };
        assert_eq!(TextPatchKind::for_patch(&spec("a.jsonpatch")).unwrap(), TextPatchKind::JsonPatch);
        assert_eq!(TextPatchKind::for_patch(&spec("a.patch")).unwrap(), TextPatchKind::Git);
        assert!(matches!(
            TextPatchKind::for_patch(&spec("a.zip")),
            Err(Error::UnsupportedPatch(_))
        ));
        assert!("speakeasy".parse::<PatchType>().is_err());
    }

    #[tokio::test]
    async fn test_missing_content_and_file() {
        let spec = SpecPatch {
            patch_type: "jsonpatch".into(),
            ..Default::default()
        };
        let err = resolve_patch(&spec, Path::new(".")).await.unwrap_err();
        assert!(err.to_string().contains("must have either content or file"));
    }

    #[tokio::test]
    async fn test_apply_sequence_from_files() {
        let dir = tempdir().unwrap();
        tokio::fs::write(
            dir.path().join("id.jsonpatch"),
            r#"[{"op": "add", "path": "/paths/~1pets/get/operationId", "value": "listPets"}]"#,
        )
        .await
        .unwrap();
        let doc = parse_document(DOC.as_bytes()).unwrap();
        let specs = parse_patch_specs(&["file:id.jsonpatch", "fix-operation-tags"]).unwrap();

        let patched = apply_patches(&doc, &specs, Some(dir.path().to_path_buf()))
            .await
            .unwrap();
        let op = patched.paths["/pets"].get.as_ref().unwrap();
        assert_eq!(op.operation_id, "listPets");
        assert_eq!(op.tags, vec!["default"]);
    }

    #[tokio::test]
    async fn test_failure_names_patch_and_keeps_document() {
        let doc = parse_document(DOC.as_bytes()).unwrap();
        let failing = SpecPatch {
            patch_type: "jsonpatch".into(),
            content: r#"[{"op": "test", "path": "/openapi", "value": "2.0"}]"#.into(),
            ..Default::default()
        };
        let specs = vec![SpecPatch::builtin("fix-oas-310-version"), failing];
        let err = apply_patches(&doc, &specs, None).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "failed to apply patch jsonpatch:<content>: test failed at /openapi"
        );
        assert_eq!(doc.openapi, "3.0.3");
    }

    #[tokio::test]
    async fn test_unknown_builtin() {
        let doc = parse_document(DOC.as_bytes()).unwrap();
        let err = apply_patches(&doc, &[SpecPatch::builtin("nope")], None)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("builtin patch [nope] is not supported"));
    }
}
