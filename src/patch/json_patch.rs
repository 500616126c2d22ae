//! RFC 6902 JSON Patch over the raw document tree.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::error::{Error, Result};
use crate::openapi::loader::{parse_raw, render_raw};

const KIND: &str = "jsonpatch";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum PatchOperation {
    Add { path: String, value: Value },
    Remove { path: String },
    Replace { path: String, value: Value },
    Move { from: String, path: String },
    Copy { from: String, path: String },
    Test { path: String, value: Value },
}

fn fail(message: impl ToString) -> Error {
    Error::patch(KIND, message)
}

/// Parses a patch document given as a JSON or YAML array of operations.
pub fn parse_json_patch(patch: &[u8]) -> Result<Vec<PatchOperation>> {
    let (value, _) = parse_raw(patch).map_err(fail)?;
    serde_json::from_value(value).map_err(fail)
}

pub fn validate_json_patch(patch: &[u8]) -> Result<()> {
    for op in parse_json_patch(patch)? {
        let (path, from) = match &op {
            PatchOperation::Move { from, path } | PatchOperation::Copy { from, path } => {
                (path, Some(from))
            }
            PatchOperation::Add { path, .. }
            | PatchOperation::Remove { path }
            | PatchOperation::Replace { path, .. }
            | PatchOperation::Test { path, .. } => (path, None),
        };
        parse_pointer(path)?;
        if let Some(from) = from {
            parse_pointer(from)?;
        }
    }
    Ok(())
}

/// Applies `patch` to `input`. The output keeps the input's text format.
pub fn apply_json_patch(input: &[u8], patch: &[u8]) -> Result<Vec<u8>> {
    let ops = parse_json_patch(patch)?;
    let (mut doc, format) = parse_raw(input)?;
    apply_operations(&mut doc, &ops)?;
    render_raw(&doc, format)
}

/// Applies every operation or none of them.
pub fn apply_operations(doc: &mut Value, ops: &[PatchOperation]) -> Result<()> {
    let mut working = doc.clone();
    for op in ops {
        apply_operation(&mut working, op)?;
    }
    *doc = working;
    Ok(())
}

fn apply_operation(doc: &mut Value, op: &PatchOperation) -> Result<()> {
    match op {
        PatchOperation::Add { path, value } => add(doc, &parse_pointer(path)?, value.clone()),
        PatchOperation::Remove { path } => remove(doc, &parse_pointer(path)?).map(|_| ()),
        PatchOperation::Replace { path, value } => {
            let target = get_mut(doc, &parse_pointer(path)?)
                .ok_or_else(|| fail(format!("replace target {path} does not exist")))?;
            *target = value.clone();
            Ok(())
        }
        PatchOperation::Move { from, path } => {
            if path.starts_with(&format!("{from}/")) {
                return Err(fail(format!("cannot move {from} into its own child {path}")));
            }
            let value = remove(doc, &parse_pointer(from)?)?;
            add(doc, &parse_pointer(path)?, value)
        }
        PatchOperation::Copy { from, path } => {
            let value = get(doc, &parse_pointer(from)?)
                .cloned()
                .ok_or_else(|| fail(format!("copy source {from} does not exist")))?;
            add(doc, &parse_pointer(path)?, value)
        }
        PatchOperation::Test { path, value } => match get(doc, &parse_pointer(path)?) {
            Some(actual) if actual == value => Ok(()),
            _ => Err(fail(format!("test failed at {path}"))),
        },
    }
}

/// Splits an RFC 6901 pointer into unescaped tokens.
pub fn parse_pointer(pointer: &str) -> Result<Vec<String>> {
    if pointer.is_empty() {
        return Ok(Vec::new());
    }
    let Some(rest) = pointer.strip_prefix('/') else {
        return Err(fail(format!("invalid JSON pointer \"{pointer}\"")));
    };
    Ok(rest
        .split('/')
        .map(|token| token.replace("~1", "/").replace("~0", "~"))
        .collect())
}

fn array_index(token: &str, len: usize, allow_end: bool) -> Result<usize> {
    if token == "-" && allow_end {
        return Ok(len);
    }
    let index: usize = token
        .parse()
        .map_err(|_| fail(format!("invalid array index \"{token}\"")))?;
    if index < len || (allow_end && index == len) {
        Ok(index)
    } else {
        Err(fail(format!("array index {index} out of bounds")))
    }
}

fn get<'a>(doc: &'a Value, tokens: &[String]) -> Option<&'a Value> {
    tokens.iter().try_fold(doc, |node, token| match node {
        Value::Object(map) => map.get(token),
        Value::Array(items) => token.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

fn get_mut<'a>(doc: &'a mut Value, tokens: &[String]) -> Option<&'a mut Value> {
    tokens.iter().try_fold(doc, |node, token| match node {
        Value::Object(map) => map.get_mut(token),
        Value::Array(items) => token.parse::<usize>().ok().and_then(|i| items.get_mut(i)),
        _ => None,
    })
}

fn split_parent(tokens: &[String]) -> Option<(&[String], &String)> {
    tokens.split_last().map(|(last, parent)| (parent, last))
}

fn add(doc: &mut Value, tokens: &[String], value: Value) -> Result<()> {
    let Some((parent_tokens, key)) = split_parent(tokens) else {
        *doc = value;
        return Ok(());
    };
    let parent = get_mut(doc, parent_tokens)
        .ok_or_else(|| fail(format!("parent of /{} does not exist", tokens.join("/"))))?;
    match parent {
        Value::Object(map) => {
            map.insert(key.clone(), value);
            Ok(())
        }
        Value::Array(items) => {
            let index = array_index(key, items.len(), true)?;
            items.insert(index, value);
            Ok(())
        }
        _ => Err(fail(format!("cannot add to scalar at /{}", parent_tokens.join("/")))),
    }
}

fn remove(doc: &mut Value, tokens: &[String]) -> Result<Value> {
    let Some((parent_tokens, key)) = split_parent(tokens) else {
        return Err(fail("cannot remove the document root"));
    };
    let parent = get_mut(doc, parent_tokens)
        .ok_or_else(|| fail(format!("parent of /{} does not exist", tokens.join("/"))))?;
    match parent {
        Value::Object(map) => map
            .shift_remove(key)
            .ok_or_else(|| fail(format!("remove target /{} does not exist", tokens.join("/")))),
        Value::Array(items) => {
            let index = array_index(key, items.len(), false)?;
            Ok(items.remove(index))
        }
        _ => Err(fail(format!("cannot remove from scalar at /{}", parent_tokens.join("/")))),
    }
}
