//! Parsing and rendering documents at pipeline boundaries.
//!
//! YAML input is normalized into a `serde_json::Value` tree first, so both
//! formats share one raw representation. Integer mapping keys (response codes)
//! become strings on the way in.

use std::path::Path;

use serde_json::{Map, Number, Value};
use tokio::fs;
use tracing::debug;

use super::document::Document;
use crate::core::error::{Error, Result};

/// Text format of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Yaml,
    Json,
}

impl Format {
    /// Sniffs the format from content: a leading `{` or `[` means JSON.
    pub fn detect(bytes: &[u8]) -> Self {
        match bytes.iter().find(|b| !b.is_ascii_whitespace()) {
            Some(b'{') | Some(b'[') => Format::Json,
            _ => Format::Yaml,
        }
    }

    /// Format implied by a file extension, YAML unless `.json`.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Format::Json,
            _ => Format::Yaml,
        }
    }
}

/// Parses YAML or JSON into a raw tree, returning the detected format.
pub fn parse_raw(bytes: &[u8]) -> Result<(Value, Format)> {
    let format = Format::detect(bytes);
    let value = match format {
        Format::Json => serde_json::from_slice(bytes)?,
        Format::Yaml => {
            let yaml: serde_yaml::Value = serde_yaml::from_slice(bytes)?;
            yaml_to_json(yaml)?
        }
    };
    Ok((value, format))
}

/// Renders a raw tree back to text.
pub fn render_raw(value: &Value, format: Format) -> Result<Vec<u8>> {
    match format {
        Format::Json => {
            let mut out = serde_json::to_vec_pretty(value)?;
            out.push(b'\n');
            Ok(out)
        }
        Format::Yaml => Ok(serde_yaml::to_string(value)?.into_bytes()),
    }
}

pub fn parse_document(bytes: &[u8]) -> Result<Document> {
    let (value, _) = parse_raw(bytes)?;
    document_from_value(value)
}

pub fn document_from_value(value: Value) -> Result<Document> {
    if !value.is_object() {
        return Err(Error::openapi("document root must be a mapping"));
    }
    Ok(serde_json::from_value(value)?)
}

pub fn render_document(document: &Document, format: Format) -> Result<Vec<u8>> {
    render_raw(&serde_json::to_value(document)?, format)
}

/// Renders and re-parses a document so it reflects exactly what its text
/// form would produce.
pub fn normalize(document: &Document) -> Result<Document> {
    document_from_value(serde_json::to_value(document)?)
}

pub async fn load_document(path: &Path) -> Result<Document> {
    debug!(path = %path.display(), "Loading OpenAPI document");
    let bytes = fs::read(path).await?;
    let document = parse_document(&bytes).map_err(|e| {
        Error::openapi(format!("failed to parse {}: {}", path.display(), e))
    })?;
    debug!(
        path = %path.display(),
        title = %document.info.title,
        paths = document.paths.len(),
        "Loaded OpenAPI document"
    );
    Ok(document)
}

pub async fn write_document(path: &Path, document: &Document) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).await?;
        }
    }
    let bytes = render_document(document, Format::from_path(path))?;
    fs::write(path, bytes).await?;
    debug!(path = %path.display(), "Wrote OpenAPI document");
    Ok(())
}

fn yaml_to_json(value: serde_yaml::Value) -> Result<Value> {
    use serde_yaml::Value as Yaml;

    Ok(match value {
        Yaml::Null => Value::Null,
        Yaml::Bool(b) => Value::Bool(b),
        Yaml::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Number(i.into())
            } else if let Some(u) = n.as_u64() {
                Value::Number(u.into())
            } else {
                let f = n.as_f64().unwrap_or(f64::NAN);
                Number::from_f64(f)
                    .map(Value::Number)
                    .ok_or_else(|| Error::openapi(format!("unsupported number {n}")))?
            }
        }
        Yaml::String(s) => Value::String(s),
        Yaml::Sequence(items) => Value::Array(
            items
                .into_iter()
                .map(yaml_to_json)
                .collect::<Result<Vec<_>>>()?,
        ),
        Yaml::Mapping(mapping) => {
            let mut object = Map::with_capacity(mapping.len());
            for (key, value) in mapping {
                object.insert(mapping_key(key)?, yaml_to_json(value)?);
            }
            Value::Object(object)
        }
        Yaml::Tagged(tagged) => yaml_to_json(tagged.value)?,
    })
}

fn mapping_key(key: serde_yaml::Value) -> Result<String> {
    use serde_yaml::Value as Yaml;

    match key {
        Yaml::String(s) => Ok(s),
        Yaml::Number(n) => Ok(n.to_string()),
        Yaml::Bool(b) => Ok(b.to_string()),
        Yaml::Null => Ok("null".to_string()),
        other => Err(Error::openapi(format!(
            "unsupported mapping key: {other:?}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const PETS_YAML: &str = r#"
openapi: 3.0.3
info:
  title: Pets
  version: 1.0.0
paths:
  /pets:
    get:
      operationId: listPets
      responses:
        200:
          description: ok
"#;

    #[test]
    fn test_detect_format() {
        assert_eq!(Format::detect(b"  {\"a\": 1}"), Format::Json);
        assert_eq!(Format::detect(b"openapi: 3.0.0"), Format::Yaml);
        assert_eq!(Format::from_path(Path::new("api.JSON")), Format::Json);
        assert_eq!(Format::from_path(Path::new("api.yml")), Format::Yaml);
    }

    #[test]
    fn test_integer_response_codes_become_strings() {
        let doc = parse_document(PETS_YAML.as_bytes()).unwrap();
        let op = doc.paths["/pets"].get.as_ref().unwrap();
        assert!(op.responses.contains_key("200"));
    }

    #[test]
    fn test_render_and_reparse_is_stable() {
        let doc = parse_document(PETS_YAML.as_bytes()).unwrap();
        let yaml = render_document(&doc, Format::Yaml).unwrap();
        let json = render_document(&doc, Format::Json).unwrap();
        assert_eq!(parse_document(&yaml).unwrap(), doc);
        assert_eq!(parse_document(&json).unwrap(), doc);
    }

    #[test]
    fn test_non_mapping_root_rejected() {
        assert!(parse_document(b"- a\n- b\n").is_err());
    }

    #[tokio::test]
    async fn test_load_and_write_document() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("pets.yaml");
        tokio::fs::write(&input, PETS_YAML).await.unwrap();

        let doc = load_document(&input).await.unwrap();
        let output = dir.path().join("out/pets.json");
        write_document(&output, &doc).await.unwrap();

        let written = tokio::fs::read_to_string(&output).await.unwrap();
        assert!(written.trim_start().starts_with('{'));
        assert_eq!(load_document(&output).await.unwrap(), doc);
    }

    #[tokio::test]
    async fn test_load_missing_file_fails() {
        let dir = tempdir().unwrap();
        assert!(load_document(&dir.path().join("nope.yaml")).await.is_err());
    }
}
