use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Position of a persisted record (file + 1-based line number).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordOrigin {
    /// File the record was read from.
    pub path: PathBuf,
    /// 1-based line number inside `path`.
    pub line: usize,
}

impl fmt::Display for RecordOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.path.display(), self.line)
    }
}

/// Errors shared by every crate of the workspace.
#[derive(Error, Debug)]
pub enum SidError {
    /// A coefficient is NaN or infinite.
    #[error("Non-finite coefficient {value} at index {coefficient}{}", origin_suffix(.origin.as_ref()))]
    InvalidFeatureValue {
        /// Index of the offending coefficient inside its frame.
        coefficient: usize,
        /// The rejected value.
        value: f64,
        /// Where the value was read from, when it came from a file.
        origin: Option<RecordOrigin>,
    },

    /// A frame was built from a slice of the wrong length.
    #[error("Invalid frame dimension: expected {expected}, got {actual}")]
    InvalidDimension {
        /// Required number of coefficients.
        expected: usize,
        /// Number of coefficients supplied.
        actual: usize,
    },

    /// A zero-frame sequence was supplied where alignment is required.
    #[error("Empty feature sequence{}", .context.as_ref().map(|c| format!(" ({c})")).unwrap_or_default())]
    EmptySequence {
        /// Optional description of where the sequence came from.
        context: Option<String>,
    },

    /// A directory or file is absent or cannot be read.
    #[error("Missing or unreadable source: {}", .path.display())]
    MissingOrUnreadableSource {
        /// Path that could not be accessed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A persisted line does not parse into the expected coefficients.
    #[error("Malformed record at {origin}: {reason}")]
    MalformedRecord {
        /// File and line of the record.
        origin: RecordOrigin,
        /// Human readable cause.
        reason: String,
    },

    /// Banded or beam strategy requested without a positive width.
    #[error("Strategy '{strategy}' requires a positive pruning width (got {})", .width.map_or_else(|| "none".to_string(), |w| w.to_string()))]
    MissingPruningParameter {
        /// Strategy name ("banded" or "beam").
        strategy: &'static str,
        /// The width that was supplied, if any.
        width: Option<i64>,
    },

    /// A file or directory could not be written.
    #[error("Cannot write {}", .path.display())]
    WriteFailed {
        /// Destination path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The same label was inserted twice into a store.
    #[error("Duplicate speaker label: {0}")]
    DuplicateLabel(String),

    /// A label is empty or cannot be used as a file name.
    #[error("Invalid speaker label: '{0}'")]
    InvalidLabel(String),

    /// Invalid configuration value or structure.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The run was interrupted through its cancellation token.
    #[error("Operation cancelled")]
    Cancelled,
}

fn origin_suffix(origin: Option<&RecordOrigin>) -> String {
    origin.map(|o| format!(" ({o})")).unwrap_or_default()
}

impl SidError {
    /// Shorthand for an `EmptySequence` error carrying a context string.
    #[must_use]
    pub fn empty_sequence(context: impl Into<String>) -> Self {
        Self::EmptySequence {
            context: Some(context.into()),
        }
    }

    /// Attach a file origin to an `InvalidFeatureValue` error.
    ///
    /// Other variants are returned unchanged.
    #[must_use]
    pub fn with_origin(self, origin: RecordOrigin) -> Self {
        match self {
            Self::InvalidFeatureValue {
                coefficient, value, ..
            } => Self::InvalidFeatureValue {
                coefficient,
                value,
                origin: Some(origin),
            },
            Self::InvalidDimension { expected, actual } => Self::MalformedRecord {
                origin,
                reason: format!("expected {expected} coefficients, found {actual}"),
            },
            other => other,
        }
    }
}

/// Result alias used across the workspace.
pub type SidResult<T> = Result<T, SidError>;
