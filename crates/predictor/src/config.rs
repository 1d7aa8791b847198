//! Predictor configuration

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use config::{Config, ConfigError, Environment, File};
use scalogram::CwtConfig;
use serde::{Deserialize, Serialize};
use signal_io::DEFAULT_MODEL_PATH;
use tracing::Level;

/// Environment variable prefix, e.g. `SIGNAL_PREDICT_LOG_LEVEL=debug`
pub const ENV_PREFIX: &str = "SIGNAL_PREDICT";

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Predictor configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictorConfig {
    /// Maximum log level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Log line format
    pub log_format: LogFormat,

    /// Weights used when the input header names none
    pub default_model_path: String,

    /// Extension appended to the input path for the result file
    pub output_extension: String,

    /// Wavelet transform settings (`[cwt]` table)
    pub cwt: CwtConfig,
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
            default_model_path: DEFAULT_MODEL_PATH.to_string(),
            output_extension: "data".to_string(),
            cwt: CwtConfig::default(),
        }
    }
}

impl PredictorConfig {
    /// Layer defaults, an optional file and `SIGNAL_PREDICT_*` variables
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }

        builder
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build()?
            .try_deserialize()
    }

    pub fn max_level(&self) -> Result<Level, <Level as FromStr>::Err> {
        self.log_level.parse()
    }

    /// `<input>.<output_extension>`
    pub fn output_path(&self, input: &Path) -> PathBuf {
        let mut name = OsString::from(input.as_os_str());
        name.push(".");
        name.push(&self.output_extension);
        PathBuf::from(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PredictorConfig::default();
        assert_eq!(config.log_format, LogFormat::Text);
        assert_eq!(config.default_model_path, "model.pth");
        assert_eq!(config.max_level().unwrap(), Level::INFO);
    }

    #[test]
    fn test_output_path_appends_extension() {
        let config = PredictorConfig::default();
        assert_eq!(
            config.output_path(Path::new("/tmp/run/signal.txt")),
            PathBuf::from("/tmp/run/signal.txt.data")
        );
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("predictor.toml");
        std::fs::write(
            &path,
            "log_level = \"debug\"\nlog_format = \"json\"\noutput_extension = \"out\"\n",
        )
        .unwrap();

        let config = PredictorConfig::load(Some(&path)).unwrap();
        assert_eq!(config.max_level().unwrap(), Level::DEBUG);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.output_extension, "out");
        assert_eq!(config.default_model_path, "model.pth");
    }

    #[test]
    fn test_cwt_table_overrides_band() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("predictor.toml");
        std::fs::write(&path, "[cwt]\nband_hz = [1e-9, 1e-8]\ntotal_scales = 128\n").unwrap();

        let config = PredictorConfig::load(Some(&path)).unwrap();
        assert_eq!(config.cwt.band_hz, (1e-9, 1e-8));
        assert_eq!(config.cwt.total_scales, 128);
        assert_eq!(config.cwt.wavelet, "cmor1-1");
        assert_eq!(config.cwt.dt, 1e-7);
    }

    #[test]
    fn test_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(PredictorConfig::load(Some(&dir.path().join("absent.toml"))).is_err());
    }

    #[test]
    fn test_bad_level() {
        let config = PredictorConfig {
            log_level: "loud".to_string(),
            ..Default::default()
        };
        assert!(config.max_level().is_err());
    }
}
