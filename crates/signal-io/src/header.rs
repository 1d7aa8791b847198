//! Parameter header line

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::SignalIoError;

/// Marker that opens the first line of every signal file
pub const HEADER_MARKER: &str = "# Parameters: ";

/// Model path used when the header does not name one
pub const DEFAULT_MODEL_PATH: &str = "model.pth";

/// Parameters carried by the header line
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterHeader {
    /// Path of the weight file to load
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_path: Option<String>,

    /// Any other keys, kept verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ParameterHeader {
    /// Header that names a model path
    pub fn with_model_path(model_path: impl Into<String>) -> Self {
        Self {
            model_path: Some(model_path.into()),
            extra: Map::new(),
        }
    }

    /// Parse a full header line, marker included.
    ///
    /// The marker is removed as an exact prefix; characters of the marker
    /// that happen to appear inside the JSON are left alone.
    pub fn parse_line(line: &str) -> Result<Self, SignalIoError> {
        let json = line
            .trim_end()
            .strip_prefix(HEADER_MARKER)
            .ok_or(SignalIoError::MissingHeader {
                marker: HEADER_MARKER,
            })?;
        Ok(serde_json::from_str(json)?)
    }

    /// Render the header line without a trailing newline
    pub fn to_line(&self) -> Result<String, SignalIoError> {
        Ok(format!("{}{}", HEADER_MARKER, serde_json::to_string(self)?))
    }

    /// Model path from the header, or `default` when absent
    pub fn model_path_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.model_path.as_deref().unwrap_or(default)
    }
}
