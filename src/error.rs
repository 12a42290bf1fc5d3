//! Error types.
//!
//! Per-line failures (`ParseError`) are routine and never abort a run.
//! Input and output failures are fatal and surface as the process exit code.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Why a single input line could not be turned into a prediction record.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The line is not valid UTF-8.
    #[error("line is not valid UTF-8")]
    InvalidUtf8,

    /// The line is not a JSON document.
    #[error("malformed line: {message}")]
    InvalidJson { message: String },

    /// A required field along a nested path is absent.
    #[error("missing field `{path}`")]
    MissingField { path: String },

    /// A field exists but has the wrong JSON type.
    #[error("field `{path}` is not {expected}")]
    WrongType { path: String, expected: &'static str },

    /// The embedded response text is not a JSON document.
    #[error("response payload is not valid JSON: {message}")]
    InvalidPayload { message: String },

    /// The decoded payload lacks one of the two subject labels.
    #[error("payload is missing label `{field}`")]
    MissingLabel { field: String },

    /// A subject label is present but not a boolean.
    #[error("payload label `{field}` is not a boolean")]
    LabelNotBoolean { field: String },
}

/// Fatal problems with the input file.
#[derive(Error, Debug)]
pub enum InputError {
    #[error("Input file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("Permission denied accessing input file: {}", path.display())]
    PermissionDenied { path: PathBuf },

    #[error("Failed to read input file {}: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl InputError {
    /// Classify an I/O error raised while opening or reading `path`.
    pub fn from_io(path: &Path, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => InputError::NotFound {
                path: path.to_path_buf(),
            },
            io::ErrorKind::PermissionDenied => InputError::PermissionDenied {
                path: path.to_path_buf(),
            },
            _ => InputError::Unreadable {
                path: path.to_path_buf(),
                source: err,
            },
        }
    }
}

/// Fatal problems writing a report file.
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl OutputError {
    pub fn write(path: &Path, source: io::Error) -> Self {
        OutputError::Write {
            path: path.to_path_buf(),
            source,
        }
    }
}
