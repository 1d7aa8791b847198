//! Signal Classifier
//!
//! EfficientNet-B0 image classifier run on composite scalograms:
//! - Model definition matching the trained PyTorch checkpoints
//! - Strict weight loading with a random-initialization fallback
//! - Device selection (CUDA, Metal, CPU)

pub mod device;
pub mod model;
pub mod weights;

pub use device::{device_name, select_device};
pub use model::{SignalClassifier, FEATURE_DIM, NUM_CLASSES};
pub use weights::{check_keys, expected_keys, load_classifier, random_classifier, WeightSource};

use std::path::Path;

use candle_core::{Device, Module, Tensor};
use ndarray::Array4;
use thiserror::Error;
use tracing::debug;

/// Classifier error types
#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("Model load failed: {0}")]
    ModelLoad(String),

    #[error(
        "Weight keys do not match the model: missing [{}], unexpected [{}]",
        preview(.missing),
        preview(.unexpected)
    )]
    WeightMismatch {
        missing: Vec<String>,
        unexpected: Vec<String>,
    },

    #[error("Device initialization failed: {0}")]
    Device(#[source] candle_core::Error),

    #[error("Invalid input shape: expected {expected}, got {actual}")]
    InvalidInputShape { expected: String, actual: String },

    #[error("Inference failed: {0}")]
    Inference(#[from] candle_core::Error),
}

pub type Result<T> = std::result::Result<T, ClassifierError>;

fn preview(keys: &[String]) -> String {
    const SHOWN: usize = 5;
    let mut text = keys.iter().take(SHOWN).cloned().collect::<Vec<_>>().join(", ");
    if keys.len() > SHOWN {
        text.push_str(&format!(", ... ({} total)", keys.len()));
    }
    text
}

/// Loaded model bound to a device
pub struct Classifier {
    model: SignalClassifier,
    device: Device,
    source: WeightSource,
}

impl Classifier {
    /// Load weights from `path`, falling back to random weights if it is absent
    pub fn load(path: impl AsRef<Path>, device: &Device) -> Result<Self> {
        let (model, source) = load_classifier(path.as_ref(), device)?;
        Ok(Self {
            model,
            device: device.clone(),
            source,
        })
    }

    pub fn random(device: &Device) -> Result<Self> {
        Ok(Self {
            model: random_classifier(device)?,
            device: device.clone(),
            source: WeightSource::RandomInit,
        })
    }

    pub fn from_model(model: SignalClassifier, device: &Device, source: WeightSource) -> Self {
        Self {
            model,
            device: device.clone(),
            source,
        }
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    pub fn source(&self) -> &WeightSource {
        &self.source
    }

    /// Run one (1, 3, H, W) image through the model and return its logits
    pub fn predict(&self, input: &Array4<f32>) -> Result<Vec<f32>> {
        let shape = input.shape();
        if shape[0] != 1 || shape[1] != 3 {
            return Err(ClassifierError::InvalidInputShape {
                expected: "[1, 3, H, W]".to_string(),
                actual: format!("{:?}", shape),
            });
        }

        let data: Vec<f32> = input.iter().copied().collect();
        let tensor = Tensor::from_vec(data, shape, &self.device)?;
        let logits = self.model.forward(&tensor)?.squeeze(0)?.to_vec1::<f32>()?;

        debug!("Logits: {:?}", logits);
        Ok(logits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_truncates() {
        let keys: Vec<String> = (0..8).map(|i| format!("k{i}")).collect();
        assert_eq!(preview(&keys[..2]), "k0, k1");
        assert_eq!(preview(&keys), "k0, k1, k2, k3, k4, ... (8 total)");
    }

    #[test]
    fn test_predict_rejects_bad_shape() {
        let classifier = Classifier::random(&Device::Cpu).unwrap();
        let input = Array4::<f32>::zeros((1, 1, 8, 8));
        assert!(matches!(
            classifier.predict(&input),
            Err(ClassifierError::InvalidInputShape { .. })
        ));
    }

    #[test]
    fn test_predict_returns_three_logits() {
        let classifier = Classifier::random(&Device::Cpu).unwrap();
        let input = Array4::<f32>::from_elem((1, 3, 32, 32), 0.5);
        let logits = classifier.predict(&input).unwrap();
        assert_eq!(logits.len(), NUM_CLASSES);
        assert!(logits.iter().all(|v| v.is_finite()));
    }
}
