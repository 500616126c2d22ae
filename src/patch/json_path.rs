//! The JSONPath subset overlay targets are written in.
//!
//! Supported: `$`, `.name`, `['name']`, `["name"]`, `[n]` (negative counts
//! from the end), `[*]`, `.*`, `..name` and `..*`. Filter expressions are
//! rejected.

use serde_json::Value;

use crate::core::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Child(String),
    Index(i64),
    Wildcard,
    Descendant(String),
    DescendantWildcard,
}

/// One step of a concrete location inside a tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Step {
    Key(String),
    Index(usize),
}

fn invalid(expr: &str, reason: &str) -> Error {
    Error::patch("openapi-overlay", format!("invalid target \"{expr}\": {reason}"))
}

pub fn parse_path(expr: &str) -> Result<Vec<Segment>> {
    let chars: Vec<char> = expr.trim().chars().collect();
    if chars.first() != Some(&'$') {
        return Err(invalid(expr, "must start with $"));
    }
    let mut segments = Vec::new();
    let mut i = 1;

    while i < chars.len() {
        match chars[i] {
            '.' if chars.get(i + 1) == Some(&'.') => {
                i += 2;
                if chars.get(i) == Some(&'*') {
                    segments.push(Segment::DescendantWildcard);
                    i += 1;
                } else {
                    let (name, next) = read_name(&chars, i);
                    if name.is_empty() {
                        return Err(invalid(expr, "empty name after .."));
                    }
                    segments.push(Segment::Descendant(name));
                    i = next;
                }
            }
            '.' => {
                i += 1;
                if chars.get(i) == Some(&'*') {
                    segments.push(Segment::Wildcard);
                    i += 1;
                } else {
                    let (name, next) = read_name(&chars, i);
                    if name.is_empty() {
                        return Err(invalid(expr, "empty name after ."));
                    }
                    segments.push(Segment::Child(name));
                    i = next;
                }
            }
            '[' => {
                let close = find_bracket_end(&chars, i + 1)
                    .ok_or_else(|| invalid(expr, "unterminated bracket"))?;
                let inner: String = chars[i + 1..close].iter().collect();
                segments.push(parse_bracket(expr, inner.trim())?);
                i = close + 1;
            }
            c => return Err(invalid(expr, &format!("unexpected character '{c}'"))),
        }
    }
    Ok(segments)
}

fn read_name(chars: &[char], start: usize) -> (String, usize) {
    let mut end = start;
    while end < chars.len() && chars[end] != '.' && chars[end] != '[' {
        end += 1;
    }
    (chars[start..end].iter().collect(), end)
}

/// Index of the `]` closing a bracket, skipping quoted text.
fn find_bracket_end(chars: &[char], start: usize) -> Option<usize> {
    let mut quote: Option<char> = None;
    for (offset, &c) in chars[start..].iter().enumerate() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(c),
            (None, ']') => return Some(start + offset),
            (None, _) => {}
        }
    }
    None
}

fn parse_bracket(expr: &str, inner: &str) -> Result<Segment> {
    if inner == "*" {
        return Ok(Segment::Wildcard);
    }
    if inner.starts_with('?') || inner.starts_with('(') {
        return Err(invalid(expr, "filter expressions are not supported"));
    }
    for quote in ['\'', '"'] {
        if inner.len() >= 2 && inner.starts_with(quote) && inner.ends_with(quote) {
            return Ok(Segment::Child(inner[1..inner.len() - 1].to_string()));
        }
    }
    inner
        .parse::<i64>()
        .map(Segment::Index)
        .map_err(|_| invalid(expr, &format!("unsupported selector [{inner}]")))
}

pub fn resolve<'a>(root: &'a Value, path: &[Step]) -> Option<&'a Value> {
    path.iter().try_fold(root, |node, step| match (node, step) {
        (Value::Object(map), Step::Key(key)) => map.get(key),
        (Value::Array(items), Step::Index(i)) => items.get(*i),
        _ => None,
    })
}

pub fn resolve_mut<'a>(root: &'a mut Value, path: &[Step]) -> Option<&'a mut Value> {
    path.iter().try_fold(root, |node, step| match (node, step) {
        (Value::Object(map), Step::Key(key)) => map.get_mut(key),
        (Value::Array(items), Step::Index(i)) => items.get_mut(*i),
        _ => None,
    })
}

fn children(node: &Value, base: &[Step], out: &mut Vec<Vec<Step>>) {
    match node {
        Value::Object(map) => {
            for key in map.keys() {
                out.push(extend(base, Step::Key(key.clone())));
            }
        }
        Value::Array(items) => {
            for i in 0..items.len() {
                out.push(extend(base, Step::Index(i)));
            }
        }
        _ => {}
    }
}

/// `base` itself followed by every location below it, pre-order.
fn descendants(root: &Value, base: Vec<Step>, out: &mut Vec<Vec<Step>>) {
    let Some(node) = resolve(root, &base) else {
        return;
    };
    let mut direct = Vec::new();
    children(node, &base, &mut direct);
    out.push(base);
    for child in direct {
        descendants(root, child, out);
    }
}

fn extend(base: &[Step], step: Step) -> Vec<Step> {
    let mut path = base.to_vec();
    path.push(step);
    path
}

/// Concrete locations selected by `segments`, in document order.
pub fn select(root: &Value, segments: &[Segment]) -> Vec<Vec<Step>> {
    let mut current: Vec<Vec<Step>> = vec![Vec::new()];
    for segment in segments {
        let mut next = Vec::new();
        for path in &current {
            let Some(node) = resolve(root, path) else {
                continue;
            };
            match segment {
                Segment::Child(name) => {
                    if node.as_object().is_some_and(|m| m.contains_key(name)) {
                        next.push(extend(path, Step::Key(name.clone())));
                    }
                }
                Segment::Index(index) => {
                    if let Some(items) = node.as_array() {
                        let len = items.len() as i64;
                        let resolved = if *index < 0 { len + index } else { *index };
                        if (0..len).contains(&resolved) {
                            next.push(extend(path, Step::Index(resolved as usize)));
                        }
                    }
                }
                Segment::Wildcard => children(node, path, &mut next),
                Segment::Descendant(name) => {
                    let mut all = Vec::new();
                    descendants(root, path.clone(), &mut all);
                    for candidate in all {
                        let has_name = resolve(root, &candidate)
                            .and_then(Value::as_object)
                            .is_some_and(|m| m.contains_key(name));
                        if has_name {
                            next.push(extend(&candidate, Step::Key(name.clone())));
                        }
                    }
                }
                Segment::DescendantWildcard => {
                    let mut all = Vec::new();
                    descendants(root, path.clone(), &mut all);
                    next.extend(all.into_iter().skip(1));
                }
            }
        }
        let mut seen = std::collections::HashSet::new();
        next.retain(|p| seen.insert(p.clone()));
        current = next;
    }
    current
}

/// Parses `expr` and selects from `root`.
pub fn query(root: &Value, expr: &str) -> Result<Vec<Vec<Step>>> {
    Ok(select(root, &parse_path(expr)?))
}
