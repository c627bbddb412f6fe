//! Language detection and enumeration
//!
//! This module provides language detection from file extensions
//! and the per-language naming conventions used by symbol lookup.

use serde::{Deserialize, Serialize};

/// Supported programming languages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Language {
    C,
    Cpp,
    Python,
    JavaScript,
    TypeScript,
}

impl Language {
    /// All supported languages, in registration order
    pub const ALL: [Language; 5] = [
        Language::C,
        Language::Cpp,
        Language::Python,
        Language::JavaScript,
        Language::TypeScript,
    ];

    /// Detect language from file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "c" | "h" => Some(Language::C),
            "cpp" | "cc" | "cxx" | "hpp" | "hh" | "hxx" => Some(Language::Cpp),
            "py" | "pyi" => Some(Language::Python),
            "js" | "jsx" | "mjs" | "cjs" => Some(Language::JavaScript),
            "ts" | "tsx" | "mts" | "cts" => Some(Language::TypeScript),
            _ => None,
        }
    }

    /// Detect language from file path
    pub fn from_path(path: &std::path::Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    /// Get default file extensions for this language
    pub fn extensions(&self) -> &[&str] {
        match self {
            Language::C => &["c", "h"],
            Language::Cpp => &["cpp", "cc", "cxx", "hpp", "hh", "hxx"],
            Language::Python => &["py", "pyi"],
            Language::JavaScript => &["js", "jsx", "mjs", "cjs"],
            Language::TypeScript => &["ts", "tsx", "mts", "cts"],
        }
    }

    /// Get the configuration key for this language
    pub fn config_key(&self) -> &str {
        match self {
            Language::C => "c",
            Language::Cpp => "cpp",
            Language::Python => "python",
            Language::JavaScript => "javascript",
            Language::TypeScript => "typescript",
        }
    }

    /// Parse a configuration key back into a language
    pub fn from_config_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|lang| lang.config_key() == key)
    }

    /// Get human-readable name
    pub fn name(&self) -> &str {
        match self {
            Language::C => "C",
            Language::Cpp => "C++",
            Language::Python => "Python",
            Language::JavaScript => "JavaScript",
            Language::TypeScript => "TypeScript",
        }
    }

    /// Separator joining a scope and a member name
    pub fn scope_separator(&self) -> &'static str {
        match self {
            Language::C | Language::Cpp => "::",
            _ => ".",
        }
    }

    /// Namespace consulted last by unqualified lookups
    pub fn fallback_scope(&self) -> Option<&'static str> {
        match self {
            Language::Python => Some("builtins"),
            Language::JavaScript | Language::TypeScript => Some("global"),
            _ => None,
        }
    }

    /// Whether each file forms its own module named after the file stem
    pub fn is_module_based(&self) -> bool {
        matches!(
            self,
            Language::Python | Language::JavaScript | Language::TypeScript
        )
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
