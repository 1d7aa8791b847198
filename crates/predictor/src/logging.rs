//! Log subscriber setup

use anyhow::{Context, Result};
use tracing_subscriber::FmtSubscriber;

use crate::config::{LogFormat, PredictorConfig};

/// Install the global subscriber. Logs go to stderr.
pub fn init_logging(config: &PredictorConfig) -> Result<()> {
    let level = config
        .max_level()
        .with_context(|| format!("invalid log level {:?}", config.log_level))?;

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr);

    match config.log_format {
        LogFormat::Text => tracing::subscriber::set_global_default(builder.finish()),
        LogFormat::Json => tracing::subscriber::set_global_default(builder.json().finish()),
    }
    .context("Failed to set tracing subscriber")
}
