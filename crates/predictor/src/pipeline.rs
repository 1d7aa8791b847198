//! Prediction pipeline
//!
//! Stages run in order: load input, select device, load model, transform,
//! infer, write output. The first failing stage aborts the run; its name
//! is attached to the error and nothing is written.

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use classifier::{device_name, select_device, Classifier, WeightSource};
use scalogram::{from_channels, CwtConfig, CwtTransformer, CHANNELS};
use signal_io::{read_signal_file, write_prediction, Prediction};
use tracing::{debug, info};

use crate::config::PredictorConfig;

/// Pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    LoadInput,
    SelectDevice,
    LoadModel,
    Transform,
    Infer,
    WriteOutput,
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::LoadInput => "load input",
            Stage::SelectDevice => "select device",
            Stage::LoadModel => "load model",
            Stage::Transform => "transform",
            Stage::Infer => "infer",
            Stage::WriteOutput => "write output",
        }
    }

    fn enter(self) -> Self {
        info!("Stage: {}", self);
        self
    }

    fn failed(&self) -> String {
        format!("{} stage failed", self)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One invocation's inputs
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Signal file to classify
    pub input: PathBuf,
    /// Optional PNG export of the composite scalogram
    pub scalogram: Option<PathBuf>,
}

impl PipelineOptions {
    pub fn new(input: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            scalogram: None,
        }
    }
}

/// What a successful run produced
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub output: PathBuf,
    pub prediction: Prediction,
    pub weights: WeightSource,
}

/// Run every stage for one input file
pub fn run(options: &PipelineOptions, config: &PredictorConfig) -> Result<PipelineOutcome> {
    let input = options.input.as_path();

    let stage = Stage::LoadInput.enter();
    let record = read_signal_file(input)
        .with_context(|| format!("failed to read {}", input.display()))
        .with_context(|| stage.failed())?;
    let channels = record
        .channels(CHANNELS)
        .with_context(|| stage.failed())?;
    let model_path = PathBuf::from(record.header.model_path_or(&config.default_model_path));
    info!(
        "Loaded {} samples ({} rows x {} columns)",
        record.samples.len(),
        record.rows(),
        record.columns
    );

    let stage = Stage::SelectDevice.enter();
    let device = select_device().with_context(|| stage.failed())?;

    let stage = Stage::LoadModel.enter();
    let classifier = Classifier::load(&model_path, &device)
        .with_context(|| format!("failed to load weights from {}", model_path.display()))
        .with_context(|| stage.failed())?;
    info!(
        "Model ready on {} ({})",
        device_name(classifier.device()),
        classifier.source()
    );

    let stage = Stage::Transform.enter();
    let composite = transform(&config.cwt, &channels, options.scalogram.as_deref())
        .with_context(|| stage.failed())?;

    let stage = Stage::Infer.enter();
    let logits = classifier
        .predict(&composite.to_tensor())
        .with_context(|| stage.failed())?;
    let prediction = Prediction::from(logits);
    if let Some(location) = prediction.location() {
        info!(
            "Prediction: x={:.6}, y={:.6}, size={:.6}",
            location.x, location.y, location.size
        );
    }

    let stage = Stage::WriteOutput.enter();
    let output = config.output_path(input);
    write_prediction(&output, &prediction)
        .with_context(|| format!("failed to write {}", output.display()))
        .with_context(|| stage.failed())?;
    info!("Wrote {} values to {}", prediction.len(), output.display());

    Ok(PipelineOutcome {
        output,
        prediction,
        weights: classifier.source().clone(),
    })
}

fn transform(
    cwt: &CwtConfig,
    channels: &[&[f64]],
    export: Option<&Path>,
) -> Result<scalogram::CompositeImage> {
    let mut transformer = CwtTransformer::new(cwt.clone())?;
    debug!(
        "{} scales, band rows: {}",
        transformer.scales().len(),
        transformer.band_rows().len()
    );

    let composite = from_channels(&mut transformer, channels)?;
    if let Some(path) = export {
        composite
            .save_png(path)
            .with_context(|| format!("failed to save scalogram to {}", path.display()))?;
        info!("Saved scalogram to {}", path.display());
    }
    Ok(composite)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_names() {
        assert_eq!(Stage::LoadInput.to_string(), "load input");
        assert_eq!(Stage::WriteOutput.failed(), "write output stage failed");
    }

    #[test]
    fn test_transform_uses_configured_band() {
        let signal: Vec<f64> = (0..300).map(|i| (i as f64 / 8.0).sin()).collect();
        let channels: Vec<&[f64]> = signal.chunks(100).collect();

        let full = transform(&CwtConfig::default(), &channels, None).unwrap();
        let narrow = CwtConfig {
            band_hz: (1e-9, 1e-8),
            ..Default::default()
        };
        let banded = transform(&narrow, &channels, None).unwrap();

        assert_eq!(full.width(), banded.width());
        assert_ne!(full.plane(), banded.plane());
    }

    #[test]
    fn test_unreadable_input_names_stage() {
        let dir = tempfile::tempdir().unwrap();
        let options = PipelineOptions::new(dir.path().join("absent.txt"));

        let err = run(&options, &PredictorConfig::default()).unwrap_err();
        assert_eq!(err.to_string(), "load input stage failed");
        assert!(format!("{:?}", err).contains("absent.txt"));
    }

    #[test]
    fn test_too_few_samples_fails_before_model() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("short.txt");
        std::fs::write(&input, "# Parameters: {}\n1.0\n2.0\n").unwrap();

        let config = PredictorConfig::default();
        let err = run(&PipelineOptions::new(&input), &config).unwrap_err();
        assert_eq!(err.to_string(), "load input stage failed");
        assert!(!config.output_path(&input).exists());
    }
}
