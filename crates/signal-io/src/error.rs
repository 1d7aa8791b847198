//! Signal I/O Error Types

use std::path::PathBuf;
use thiserror::Error;

/// Errors while reading or writing signal and prediction files
#[derive(Debug, Error)]
pub enum SignalIoError {
    /// Underlying filesystem error
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// First line does not start with the parameter marker
    #[error("missing parameter header: first line must start with {marker:?}")]
    MissingHeader { marker: &'static str },

    /// Header JSON could not be parsed
    #[error("invalid parameter header JSON: {0}")]
    InvalidHeader(#[from] serde_json::Error),

    /// A token in the body is not a floating-point number
    #[error("line {line}: cannot parse {token:?} as a number")]
    InvalidNumber { line: usize, token: String },

    /// A body row has a different column count from the first row
    #[error("line {line}: expected {expected} columns, found {found}")]
    RaggedRow {
        line: usize,
        expected: usize,
        found: usize,
    },

    /// The body holds no samples
    #[error("signal body is empty")]
    EmptyBody,

    /// Not enough samples to fill every channel
    #[error("{samples} samples cannot be split into {channels} non-empty channels")]
    TooFewSamples { samples: usize, channels: usize },
}

impl SignalIoError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SignalIoError::Io {
            path: path.into(),
            source,
        }
    }
}
