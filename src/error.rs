//! Error types for index construction and scanning.

use std::fmt;
use thiserror::Error;

/// Result type for index operations.
pub type Result<T> = std::result::Result<T, IndexError>;

/// Errors raised by the document model, the scanner and their helpers.
#[derive(Debug, Error)]
pub enum IndexError {
    /// One or more metadata header rules were violated.
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// Index or package name rejected by the naming rules.
    #[error("invalid name '{0}'")]
    InvalidName(String),

    /// A version with the same normalized identity already exists.
    #[error("version '{0}' already exists")]
    DuplicateVersion(String),

    /// File ownership collision reported by the conflict detector.
    #[error("{0}")]
    Conflict(String),

    /// No URL template is configured on the index.
    #[error("unable to generate download links: empty url template")]
    MissingTemplate,

    /// URL template lacks the mandatory `$path` placeholder.
    #[error("invalid url template '{0}': $path placeholder is missing")]
    InvalidTemplate(String),

    /// Provided file or pattern does not match anything in the file pool.
    #[error("file not found '{0}'")]
    FileNotFound(String),

    /// Malformed provides line.
    #[error("invalid provides line '{0}'")]
    Parse(String),

    /// Provides option that is neither a platform, a type nor a section spec.
    #[error("unknown option '{0}'")]
    UnknownOption(String),

    /// Package file is not located inside a category directory.
    #[error("invalid package path '{0}': packages must be inside a category")]
    InvalidPath(String),

    /// Persisted document could not be understood.
    #[error("corrupt index document: {0}")]
    CorruptDocument(String),

    /// Underlying I/O failure.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// XML reader or writer failure.
    #[error(transparent)]
    Xml(#[from] quick_xml::Error),
}

/// Aggregated header validation failures for a single file.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationError {
    /// Individual rule violations in header order.
    pub messages: Vec<String>,
}

impl ValidationError {
    /// Build from a list of messages.
    #[must_use]
    pub const fn new(messages: Vec<String>) -> Self {
        Self { messages }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("invalid metadata:")?;
        for message in &self.messages {
            write!(f, "\n  {message}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}
