//! Identifier hygiene shared by the backends.

use crate::core::utils::to_pascal_case;

/// Whole-name replacements for identifiers made only of operators.
const SYMBOL_NAMES: &[(&str, &str)] = &[
    ("=", "EQUALS"),
    ("==", "EQUALS"),
    ("!=", "NOT_EQUALS"),
    ("<", "LESS_THAN"),
    ("<=", "LESS_OR_EQUALS"),
    (">", "GREATER_THAN"),
    (">=", "GREATER_OR_EQUALS"),
    ("~=", "MATCHES"),
    ("+", "PLUS"),
    ("-", "MINUS"),
    ("*", "ASTERISK"),
    ("/", "SLASH"),
    ("%", "PERCENT"),
    ("&", "AMPERSAND"),
    ("|", "PIPE"),
    ("^", "CARET"),
    ("~", "TILDE"),
    ("!", "EXCLAMATION"),
    ("?", "QUESTION_MARK"),
    ("@", "AT"),
    ("#", "HASH"),
    ("$", "DOLLAR"),
    (".", "DOT"),
    (",", "COMMA"),
    (":", "COLON"),
    (";", "SEMICOLON"),
];

/// Characters no target language accepts inside an identifier.
const RESERVED_CHARS: &[char] = &[
    '$', '#', '%', '^', '&', '*', '(', ')', '+', '=', '/', '\\', '|', '~', '`', '!', '<', '>',
    ',', ':', ';', ' ', '?', '"', '\'', '{', '}', '[', ']',
];

/// Maps operator-only names to words, guards a leading digit with `p` and
/// replaces reserved characters with `_`. Empty input becomes `EMPTY`.
pub fn sanitize(name: &str) -> String {
    let name = name.trim();
    if name.is_empty() {
        return "EMPTY".to_string();
    }
    if let Some((_, word)) = SYMBOL_NAMES.iter().find(|(symbol, _)| *symbol == name) {
        return (*word).to_string();
    }
    let name: String = name
        .chars()
        .map(|c| if RESERVED_CHARS.contains(&c) { '_' } else { c })
        .collect();
    if name.starts_with(|c: char| c.is_ascii_digit()) {
        return format!("p{name}");
    }
    name
}

/// Leading underscores carry meaning in some APIs (`_links`); keep it as a
/// word so the case conversion does not drop it.
pub fn expand_leading_underscore(name: &str) -> String {
    match name.strip_prefix('_') {
        Some(rest) if !rest.is_empty() => format!("additional{}", to_pascal_case(rest)),
        _ => name.to_string(),
    }
}

/// A language's reserved words.
#[derive(Debug, Clone, Copy)]
pub struct ReservedWords(pub &'static [&'static str]);

impl ReservedWords {
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(&name)
    }

    /// Appends `suffix` when `name` is reserved.
    pub fn escape(&self, name: String, suffix: &str) -> String {
        if self.contains(&name) {
            name + suffix
        } else {
            name
        }
    }
}
