//! Error types for rollview-core

use thiserror::Error;

/// Main error type for the rollview-core library
#[derive(Error, Debug)]
pub enum Error {
    /// A transcript line could not be decoded or lacks the minimal record shape
    #[error("line {line_number}: {reason}")]
    Parse { line_number: usize, reason: String },

    /// Reconstruction was handed something that is not a well-formed parsed transcript
    #[error("malformed parsed transcript: {0}")]
    Shape(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    pub(crate) fn parse(line_number: usize, reason: impl Into<String>) -> Self {
        Error::Parse {
            line_number,
            reason: reason.into(),
        }
    }

    /// Source line number for parse errors.
    pub fn line_number(&self) -> Option<usize> {
        match self {
            Error::Parse { line_number, .. } => Some(*line_number),
            _ => None,
        }
    }
}

/// Result type alias for rollview-core
pub type Result<T> = std::result::Result<T, Error>;
