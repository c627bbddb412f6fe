//! Error types for symbol extraction and project analysis
//!
//! Structured errors built with thiserror. Project operations also mirror
//! their failures into a `(code, message)` error state on the project
//! context, so `ProjectError::code` maps every variant onto a
//! [`ProjectErrorCode`].

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Coarse error category stored on the project context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ProjectErrorCode {
    #[default]
    None,
    Memory,
    TooManyFiles,
    IncludeDepth,
    InvalidPath,
    Io,
    Parse,
}

impl ProjectErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::Memory => "MEMORY",
            Self::TooManyFiles => "TOO_MANY_FILES",
            Self::IncludeDepth => "INCLUDE_DEPTH",
            Self::InvalidPath => "INVALID_PATH",
            Self::Io => "IO",
            Self::Parse => "PARSE",
        }
    }
}

impl std::fmt::Display for ProjectErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Main error type for project operations
#[derive(Error, Debug)]
pub enum ProjectError {
    /// File system errors
    #[error("Failed to read file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to read directory '{path}': {reason}")]
    DirectoryRead { path: PathBuf, reason: String },

    #[error("Invalid path '{path}': {reason}")]
    InvalidPath { path: PathBuf, reason: String },

    /// Capacity limits
    #[error("Maximum number of files ({limit}) reached, cannot add '{path}'")]
    TooManyFiles { path: PathBuf, limit: usize },

    #[error("Include depth {depth} exceeds the configured maximum of {limit}")]
    IncludeDepthExceeded { depth: usize, limit: usize },

    /// Parsing errors
    #[error("Unsupported file type '{extension}' for file '{path}'. Supported types: .c, .h, .cpp, .hpp, .py, .js, .ts")]
    UnsupportedFileType { path: PathBuf, extension: String },

    #[error("Failed to parse {language} file '{path}': {reason}")]
    Parse {
        path: PathBuf,
        language: String,
        reason: String,
    },

    /// Configuration errors
    #[error("Invalid configuration: {reason}")]
    Config { reason: String },
}

impl ProjectError {
    /// Get a stable status code for this error type.
    ///
    /// Returns a string identifier suitable for JSON output.
    pub fn status_code(&self) -> String {
        match self {
            Self::FileRead { .. } => "FILE_READ_ERROR",
            Self::DirectoryRead { .. } => "DIRECTORY_READ_ERROR",
            Self::InvalidPath { .. } => "INVALID_PATH",
            Self::TooManyFiles { .. } => "TOO_MANY_FILES",
            Self::IncludeDepthExceeded { .. } => "INCLUDE_DEPTH_EXCEEDED",
            Self::UnsupportedFileType { .. } => "UNSUPPORTED_FILE_TYPE",
            Self::Parse { .. } => "PARSE_ERROR",
            Self::Config { .. } => "CONFIG_ERROR",
        }
        .to_string()
    }

    /// Category recorded in the project's error state
    pub fn code(&self) -> ProjectErrorCode {
        match self {
            Self::FileRead { .. } | Self::DirectoryRead { .. } => ProjectErrorCode::Io,
            Self::InvalidPath { .. } | Self::UnsupportedFileType { .. } => {
                ProjectErrorCode::InvalidPath
            }
            Self::TooManyFiles { .. } => ProjectErrorCode::TooManyFiles,
            Self::IncludeDepthExceeded { .. } => ProjectErrorCode::IncludeDepth,
            Self::Parse { .. } => ProjectErrorCode::Parse,
            // Raised while loading settings, before any project exists
            Self::Config { .. } => ProjectErrorCode::None,
        }
    }

    /// Get recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            Self::FileRead { .. } => vec![
                "Check that the file exists and you have read permissions",
                "Ensure the file is not locked by another process",
            ],
            Self::TooManyFiles { .. } => vec![
                "Raise project.max_files in settings.toml (0 means unlimited)",
                "Restrict the scan with --ext to the languages you need",
            ],
            Self::IncludeDepthExceeded { .. } => vec![
                "Raise project.max_include_depth in settings.toml",
                "Disable project.follow_includes to stop chasing dependencies",
            ],
            Self::UnsupportedFileType { .. } => vec![
                "Supported languages are C, C++, Python, JavaScript and TypeScript",
            ],
            Self::Config { .. } => vec![
                "Check .symgraph/settings.toml for typos and value types",
                "Environment overrides use SYMGRAPH_ with __ between levels",
            ],
            _ => vec![],
        }
    }
}

/// Errors raised by the parsing front end
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Failed to initialize {language} parser: {reason}")]
    ParserInit { language: String, reason: String },

    #[error("Parser produced no syntax tree for '{path}'")]
    NoTree { path: PathBuf },

    #[error("No front end registered for {language}")]
    UnsupportedLanguage { language: String },

    #[error("Invalid UTF-8 in source file")]
    InvalidUtf8,
}

/// Result type alias for project operations
pub type ProjectResult<T> = Result<T, ProjectError>;

/// Result type alias for parse operations
pub type ParseResult<T> = Result<T, ParseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_map_to_project_state() {
        let err = ProjectError::TooManyFiles {
            path: PathBuf::from("a.c"),
            limit: 1,
        };
        assert_eq!(err.code(), ProjectErrorCode::TooManyFiles);
        assert_eq!(err.status_code(), "TOO_MANY_FILES");
        assert!(!err.recovery_suggestions().is_empty());

        let err = ProjectError::FileRead {
            path: PathBuf::from("missing.c"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        assert_eq!(err.code(), ProjectErrorCode::Io);
        assert!(err.to_string().contains("missing.c"));
        assert_eq!(ProjectErrorCode::default(), ProjectErrorCode::None);
        assert_eq!(ProjectErrorCode::IncludeDepth.to_string(), "INCLUDE_DEPTH");
    }
}
