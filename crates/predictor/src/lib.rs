//! Signal Predictor
//!
//! Drives one prediction: read a signal file, build its composite
//! scalogram, classify it and write the logits next to the input.

pub mod config;
pub mod logging;
pub mod pipeline;

pub use config::{LogFormat, PredictorConfig, ENV_PREFIX};
pub use logging::init_logging;
pub use pipeline::{run, PipelineOptions, PipelineOutcome, Stage};
