//! Unified diff (`git diff`) patches applied to document text.
//!
//! Only the first file section of a diff is applied. Each hunk is tried at the
//! line it names first and then searched for further down; a hunk whose
//! context cannot be found aborts the patch.

use crate::core::error::{Error, Result};

const KIND: &str = "git";

fn fail(message: impl ToString) -> Error {
    Error::patch(KIND, message)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HunkLine {
    Context(String),
    Remove(String),
    Add(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Hunk {
    pub old_start: usize,
    pub old_len: usize,
    pub new_start: usize,
    pub new_len: usize,
    pub lines: Vec<HunkLine>,
    /// `\ No newline at end of file` followed the old side's last line.
    pub old_missing_newline: bool,
    /// Same for the new side.
    pub new_missing_newline: bool,
}

impl Hunk {
    fn old_lines(&self) -> Vec<&str> {
        self.lines
            .iter()
            .filter_map(|l| match l {
                HunkLine::Context(s) | HunkLine::Remove(s) => Some(s.as_str()),
                HunkLine::Add(_) => None,
            })
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilePatch {
    pub old_path: Option<String>,
    pub new_path: Option<String>,
    pub hunks: Vec<Hunk>,
}

/// Parses `@@ -a,b +c,d @@`; omitted lengths default to 1.
fn parse_hunk_header(line: &str) -> Result<Hunk> {
    let inner = line
        .strip_prefix("@@ ")
        .and_then(|rest| rest.split(" @@").next())
        .ok_or_else(|| fail(format!("malformed hunk header: {line}")))?;
    let mut ranges = inner.split_whitespace();
    let old = ranges.next().and_then(|r| r.strip_prefix('-'));
    let new = ranges.next().and_then(|r| r.strip_prefix('+'));
    let (Some(old), Some(new)) = (old, new) else {
        return Err(fail(format!("malformed hunk header: {line}")));
    };
    let (old_start, old_len) = parse_range(old, line)?;
    let (new_start, new_len) = parse_range(new, line)?;
    Ok(Hunk {
        old_start,
        old_len,
        new_start,
        new_len,
        ..Default::default()
    })
}

fn parse_range(range: &str, line: &str) -> Result<(usize, usize)> {
    let bad = || fail(format!("malformed hunk header: {line}"));
    match range.split_once(',') {
        Some((start, len)) => Ok((
            start.parse().map_err(|_| bad())?,
            len.parse().map_err(|_| bad())?,
        )),
        None => Ok((range.parse().map_err(|_| bad())?, 1)),
    }
}

fn strip_diff_path(path: &str) -> Option<String> {
    let path = path.split('\t').next().unwrap_or(path).trim();
    if path == "/dev/null" {
        return None;
    }
    Some(
        path.strip_prefix("a/")
            .or_else(|| path.strip_prefix("b/"))
            .unwrap_or(path)
            .to_string(),
    )
}

/// Parses every file section of a unified diff.
pub fn parse_git_patch(content: &str) -> Result<Vec<FilePatch>> {
    let mut files: Vec<FilePatch> = Vec::new();
    let mut current: Option<Hunk> = None;
    let (mut old_seen, mut new_seen) = (0usize, 0usize);

    fn finish(files: &mut Vec<FilePatch>, hunk: Option<Hunk>) {
        if let (Some(hunk), Some(file)) = (hunk, files.last_mut()) {
            file.hunks.push(hunk);
        }
    }

    for raw in content.split('\n') {
        let line = raw.strip_suffix('\r').unwrap_or(raw);

        if let Some(hunk) = current.as_mut() {
            let in_body = old_seen < hunk.old_len || new_seen < hunk.new_len;
            if let Some(marker) = line.strip_prefix('\\') {
                if marker.contains("No newline") {
                    match hunk.lines.last() {
                        Some(HunkLine::Remove(_)) => hunk.old_missing_newline = true,
                        Some(HunkLine::Add(_)) => hunk.new_missing_newline = true,
                        Some(HunkLine::Context(_)) => {
                            hunk.old_missing_newline = true;
                            hunk.new_missing_newline = true;
                        }
                        None => {}
                    }
                }
                continue;
            }
            if in_body {
                let (kind, text) = match line.chars().next() {
                    Some(' ') => ('c', &line[1..]),
                    Some('-') => ('-', &line[1..]),
                    Some('+') => ('+', &line[1..]),
                    None => ('c', ""),
                    Some(_) => return Err(fail(format!("unexpected line in hunk: {line}"))),
                };
                match kind {
                    '-' => {
                        old_seen += 1;
                        hunk.lines.push(HunkLine::Remove(text.to_string()));
                    }
                    '+' => {
                        new_seen += 1;
                        hunk.lines.push(HunkLine::Add(text.to_string()));
                    }
                    _ => {
                        old_seen += 1;
                        new_seen += 1;
                        hunk.lines.push(HunkLine::Context(text.to_string()));
                    }
                }
                continue;
            }
            finish(&mut files, current.take());
        }

        if line.starts_with("diff --git ") {
            files.push(FilePatch::default());
        } else if let Some(path) = line.strip_prefix("--- ") {
            if files.last().is_none_or(|f| !f.hunks.is_empty() || f.old_path.is_some()) {
                files.push(FilePatch::default());
            }
            if let Some(file) = files.last_mut() {
                file.old_path = strip_diff_path(path);
            }
        } else if let Some(path) = line.strip_prefix("+++ ") {
            if let Some(file) = files.last_mut() {
                file.new_path = strip_diff_path(path);
            }
        } else if line.starts_with("@@ ") {
            if files.is_empty() {
                files.push(FilePatch::default());
            }
            current = Some(parse_hunk_header(line)?);
            old_seen = 0;
            new_seen = 0;
        }
    }
    if let Some(hunk) = current.as_ref() {
        if old_seen < hunk.old_len || new_seen < hunk.new_len {
            return Err(fail("patch ends inside a hunk"));
        }
    }
    finish(&mut files, current.take());

    files.retain(|f| !f.hunks.is_empty());
    if files.is_empty() {
        return Err(fail("no file changes found in patch"));
    }
    Ok(files)
}

pub fn validate_git_patch(content: &[u8]) -> Result<()> {
    let text = std::str::from_utf8(content).map_err(fail)?;
    parse_git_patch(text).map(|_| ())
}

fn matches_at(lines: &[&str], at: usize, expected: &[&str]) -> bool {
    at + expected.len() <= lines.len() && lines[at..at + expected.len()] == *expected
}

/// Applies the first file section of `patch` to `input`.
pub fn apply_git_patch(input: &[u8], patch: &[u8]) -> Result<Vec<u8>> {
    let text = std::str::from_utf8(input).map_err(fail)?;
    let patch = std::str::from_utf8(patch).map_err(fail)?;
    let files = parse_git_patch(patch)?;
    let file = &files[0];

    let mut trailing_newline = text.ends_with('\n');
    let body = text.strip_suffix('\n').unwrap_or(text);
    let lines: Vec<&str> = if text.is_empty() {
        Vec::new()
    } else {
        body.split('\n').collect()
    };

    let mut output: Vec<String> = Vec::with_capacity(lines.len());
    let mut cursor = 0usize;

    for (index, hunk) in file.hunks.iter().enumerate() {
        let expected = hunk.old_lines();
        let preferred = if hunk.old_len == 0 {
            hunk.old_start
        } else {
            hunk.old_start.saturating_sub(1)
        };
        let position = if preferred >= cursor && matches_at(&lines, preferred, &expected) {
            Some(preferred)
        } else {
            (cursor..=lines.len()).find(|&at| matches_at(&lines, at, &expected))
        };
        let Some(position) = position else {
            return Err(fail(format!(
                "hunk #{} (@@ -{},{} +{},{} @@) does not match the input",
                index + 1,
                hunk.old_start,
                hunk.old_len,
                hunk.new_start,
                hunk.new_len
            )));
        };

        output.extend(lines[cursor..position].iter().map(|l| l.to_string()));
        for line in &hunk.lines {
            match line {
                HunkLine::Context(s) | HunkLine::Add(s) => output.push(s.clone()),
                HunkLine::Remove(_) => {}
            }
        }
        cursor = position + expected.len();

        if cursor == lines.len() && (hunk.old_missing_newline || hunk.new_missing_newline) {
            trailing_newline = !hunk.new_missing_newline;
        }
    }
    output.extend(lines[cursor..].iter().map(|l| l.to_string()));

    let mut result = output.join("\n");
    if trailing_newline && !output.is_empty() {
        result.push('\n');
    }
    Ok(result.into_bytes())
}
