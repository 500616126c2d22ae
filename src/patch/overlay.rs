//! OpenAPI Overlay documents: targeted update and remove actions.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use super::json_path::{query, resolve_mut, Step};
use crate::core::error::{Error, Result};
use crate::openapi::loader::{parse_raw, render_raw};

const KIND: &str = "openapi-overlay";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OverlayInfo {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub version: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OverlayAction {
    #[serde(default)]
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update: Option<Value>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub remove: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Overlay {
    #[serde(default)]
    pub overlay: String,
    #[serde(default)]
    pub info: OverlayInfo,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extends: Option<String>,
    #[serde(default)]
    pub actions: Vec<OverlayAction>,
}

fn fail(message: impl ToString) -> Error {
    Error::patch(KIND, message)
}

impl Overlay {
    pub fn parse(content: &[u8]) -> Result<Self> {
        if content.iter().all(u8::is_ascii_whitespace) {
            return Err(fail("patch content is empty"));
        }
        let (value, _) = parse_raw(content).map_err(fail)?;
        serde_json::from_value(value).map_err(fail)
    }

    /// Checks the overlay version, info block and every action.
    pub fn validate(&self) -> Result<()> {
        let mut problems = Vec::new();
        let mut parts = self.overlay.split('.');
        let major_ok = parts.next() == Some("1");
        let rest: Vec<_> = parts.collect();
        if !major_ok || rest.len() != 2 || rest.iter().any(|p| p.parse::<u32>().is_err()) {
            problems.push(format!(
                "overlay version must be 1.x.y, got \"{}\"",
                self.overlay
            ));
        }
        if self.info.title.is_empty() {
            problems.push("info.title is required".to_string());
        }
        if self.info.version.is_empty() {
            problems.push("info.version is required".to_string());
        }
        for (i, action) in self.actions.iter().enumerate() {
            if action.target.is_empty() {
                problems.push(format!("actions[{i}].target is required"));
            }
            if action.remove && action.update.is_some() {
                problems.push(format!("actions[{i}] cannot both update and remove"));
            }
            if !action.remove && action.update.is_none() {
                problems.push(format!("actions[{i}] needs update or remove"));
            }
        }
        if problems.is_empty() {
            Ok(())
        } else {
            Err(fail(problems.join("; ")))
        }
    }

    /// Applies every action in order to a raw tree.
    pub fn apply_to(&self, root: &mut Value) -> Result<()> {
        for action in &self.actions {
            let targets = query(root, &action.target)?;
            debug!(target = %action.target, matches = targets.len(), "Applying overlay action");
            if action.remove {
                remove_all(root, targets);
            } else if let Some(update) = &action.update {
                for path in targets {
                    if let Some(node) = resolve_mut(root, &path) {
                        apply_update(node, update);
                    }
                }
            }
        }
        Ok(())
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

/// Removes selected nodes; deeper and later array entries go first so earlier
/// indices stay valid.
fn remove_all(root: &mut Value, mut targets: Vec<Vec<Step>>) {
    targets.sort();
    for path in targets.into_iter().rev() {
        let Some((last, parent_path)) = path.split_last() else {
            *root = Value::Null;
            continue;
        };
        match (resolve_mut(root, parent_path), last) {
            (Some(Value::Object(map)), Step::Key(key)) => {
                map.shift_remove(key);
            }
            (Some(Value::Array(items)), Step::Index(i)) if *i < items.len() => {
                items.remove(*i);
            }
            _ => {}
        }
    }
}

/// Objects merge recursively, arrays receive appended items, anything else is
/// replaced.
fn apply_update(node: &mut Value, update: &Value) {
    match (node, update) {
        (Value::Object(target), Value::Object(source)) => merge_objects(target, source),
        (Value::Array(items), Value::Array(more)) => items.extend(more.iter().cloned()),
        (Value::Array(items), other) => items.push(other.clone()),
        (node, other) => *node = other.clone(),
    }
}

fn merge_objects(target: &mut Map<String, Value>, source: &Map<String, Value>) {
    for (key, value) in source {
        match (target.get_mut(key), value) {
            (Some(Value::Object(existing)), Value::Object(incoming)) => {
                merge_objects(existing, incoming)
            }
            _ => {
                target.insert(key.clone(), value.clone());
            }
        }
    }
}

pub fn validate_overlay(content: &[u8]) -> Result<()> {
    Overlay::parse(content)?.validate()
}

/// Applies an overlay to document text. The output keeps the input format.
pub fn apply_overlay(input: &[u8], content: &[u8]) -> Result<Vec<u8>> {
    let overlay = Overlay::parse(content)?;
    let (mut root, format) = parse_raw(input)?;
    overlay.apply_to(&mut root)?;
    render_raw(&root, format)
}

/// Overlay that seeds `info` with a title, description and license.
pub fn info_overlay(title: &str, description: Option<&str>, license: Option<&str>) -> Overlay {
    let mut update = Map::new();
    update.insert("title".to_string(), Value::String(title.to_string()));
    if let Some(description) = description {
        update.insert("description".to_string(), Value::String(description.to_string()));
    }
    if let Some(license) = license {
        let mut license_object = Map::new();
        license_object.insert("name".to_string(), Value::String(license.to_string()));
        update.insert("license".to_string(), Value::Object(license_object));
    }
    Overlay {
        overlay: "1.0.0".to_string(),
        info: OverlayInfo {
            title: "Seed document info".to_string(),
            version: "1.0.0".to_string(),
        },
        extends: None,
        actions: vec![OverlayAction {
            target: "$.info".to_string(),
            description: Some("Set document info".to_string()),
            update: Some(Value::Object(update)),
            remove: false,
        }],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const INPUT: &str = r#"
openapi: 3.1.0
info:
  title: Example API
  version: 1.0.0
paths:
  /example:
    get:
      summary: Example summary
      description: Example description
      operationId: getExample
      responses:
        "200":
          description: OK
"#;

    const OVERLAY: &str = r#"
overlay: 1.0.0
info:
  title: Overlay for Example API
  version: 1.0.0
actions:
  - target: "$.info"
    update:
      title: Updated Example API
      description: This is an updated description for the example API.
  - target: "$.paths['/example'].get"
    remove: true
"#;

    #[test]
    fn test_update_and_remove() {
        let output = apply_overlay(INPUT.as_bytes(), OVERLAY.as_bytes()).unwrap();
        let (value, _) = parse_raw(&output).unwrap();
        assert_eq!(value["info"]["title"], json!("Updated Example API"));
        assert_eq!(value["info"]["version"], json!("1.0.0"));
        assert_eq!(
            value["info"]["description"],
            json!("This is an updated description for the example API.")
        );
        assert_eq!(value["paths"]["/example"], json!({}));
    }

    #[test]
    fn test_validate() {
        assert!(validate_overlay(OVERLAY.as_bytes()).is_ok());

        let invalid = "overlay: 0.1.0\ninfo: {}\nactions: []\n";
        let err = validate_overlay(invalid.as_bytes()).unwrap_err().to_string();
        assert!(err.contains("overlay version must be 1.x.y"));
        assert!(err.contains("info.title is required"));
        assert!(err.contains("info.version is required"));
    }

    #[test]
    fn test_empty_content_rejected() {
        assert!(Overlay::parse(b"  \n").is_err());
    }

    #[test]
    fn test_array_removal_keeps_indices_valid() {
        let mut root = json!({"tags": [{"name": "a"}, {"name": "b"}, {"name": "c"}]});
        let overlay = Overlay {
            actions: vec![OverlayAction {
                target: "$.tags[*]".into(),
                remove: true,
                ..Default::default()
            }],
            ..Default::default()
        };
        overlay.apply_to(&mut root).unwrap();
        assert_eq!(root, json!({"tags": []}));
    }

    #[test]
    fn test_info_overlay_seeds_license() {
        let overlay = info_overlay("Pets", Some("All the pets"), Some("MIT"));
        overlay.validate().unwrap();
        let mut root = json!({"info": {"title": "old", "version": "2"}});
        overlay.apply_to(&mut root).unwrap();
        assert_eq!(
            root["info"],
            json!({"title": "Pets", "version": "2", "description": "All the pets", "license": {"name": "MIT"}})
        );
    }
}
