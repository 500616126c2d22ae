//! Core types for the generation domain

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Supported target languages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Go,
    Java,
    Kotlin,
    Python,
    CSharp,
    TypeScript,
    /// Language-neutral scaffolding that keeps schema type names as-is
    Default,
}

impl Language {
    /// Get the display name for this language
    pub fn display_name(&self) -> &'static str {
        match self {
            Language::Go => "Go",
            Language::Java => "Java",
            Language::Kotlin => "Kotlin",
            Language::Python => "Python",
            Language::CSharp => "C#",
            Language::TypeScript => "TypeScript",
            Language::Default => "Default",
        }
    }

    /// Get the file extension for this language
    pub fn file_extension(&self) -> &'static str {
        match self {
            Language::Go => "go",
            Language::Java => "java",
            Language::Kotlin => "kt",
            Language::Python => "py",
            Language::CSharp => "cs",
            Language::TypeScript => "ts",
            Language::Default => "txt",
        }
    }

    /// Get the generator id for this language
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Go => "go",
            Language::Java => "java",
            Language::Kotlin => "kotlin",
            Language::Python => "python",
            Language::CSharp => "csharp",
            Language::TypeScript => "typescript",
            Language::Default => "default",
        }
    }

    /// Get all supported languages
    pub fn all() -> Vec<Language> {
        vec![
            Language::Go,
            Language::Java,
            Language::Kotlin,
            Language::Python,
            Language::CSharp,
            Language::TypeScript,
            Language::Default,
        ]
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = crate::generation::GenerationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "go" | "golang" => Ok(Language::Go),
            "java" => Ok(Language::Java),
            "kotlin" | "kt" => Ok(Language::Kotlin),
            "python" | "py" => Ok(Language::Python),
            "csharp" | "c#" | "cs" => Ok(Language::CSharp),
            "typescript" | "ts" => Ok(Language::TypeScript),
            "default" | "scaffolding" => Ok(Language::Default),
            _ => Err(crate::generation::GenerationError::InvalidLanguage(
                s.to_string(),
            )),
        }
    }
}
