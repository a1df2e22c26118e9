//! Error types for chemical file I/O
//!
//! "No format recognized" is only an error for APIs that need a reader;
//! detection itself reports it as a value (see [`crate::MatchResult`]).

use chemio_mol::MolError;
use thiserror::Error;

/// Errors that can occur while detecting, reading or writing structures
#[derive(Error, Debug)]
pub enum IoError {
    /// Standard I/O error; always fatal regardless of reader mode
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Structural violation with location information
    #[error("Parse error at line {line}: {message}")]
    Parse {
        /// Line number where the error occurred (1-based)
        line: usize,
        /// Error message
        message: String,
    },

    /// Malformed XML document
    #[error("XML error at byte {position}: {message}")]
    Xml {
        /// Byte offset in the document
        position: u64,
        message: String,
    },

    /// No registered format matched the input
    #[error("Unknown format: {0}")]
    UnknownFormat(String),

    /// The format was recognized but has no in-process reader
    #[error("No reader available for format '{0}'")]
    NoReader(String),

    /// The format has no in-process writer
    #[error("No writer available for format '{0}'")]
    NoWriter(String),

    /// File is empty or contains no molecules
    #[error("Empty file or no molecules found")]
    EmptyFile,

    /// Decompression error
    #[error("Decompression error: {0}")]
    Decompression(String),

    /// A named reader setting received a value it does not accept
    #[error("Invalid value for setting {name}: {reason}")]
    InvalidSetting { name: String, reason: String },

    /// Unsupported feature in the file format
    #[error("Unsupported feature: {0}")]
    Unsupported(String),

    /// The molecule model rejected the parsed content
    #[error(transparent)]
    Mol(#[from] MolError),
}

impl IoError {
    /// Create a parse error at a specific line
    pub fn parse(line: usize, message: impl Into<String>) -> Self {
        IoError::Parse {
            line,
            message: message.into(),
        }
    }

    pub fn xml(position: u64, message: impl Into<String>) -> Self {
        IoError::Xml {
            position,
            message: message.into(),
        }
    }

    /// Create an unsupported feature error
    pub fn unsupported(feature: impl Into<String>) -> Self {
        IoError::Unsupported(feature.into())
    }

    pub fn invalid_setting(name: impl Into<String>, reason: impl Into<String>) -> Self {
        IoError::InvalidSetting {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Line number of a parse error
    pub fn line(&self) -> Option<usize> {
        match self {
            IoError::Parse { line, .. } => Some(*line),
            _ => None,
        }
    }
}

/// Result type for chemical file I/O operations
pub type IoResult<T> = Result<T, IoError>;
