//! Weight loading
//!
//! Checkpoints are read from either a safetensors file or a PyTorch pickle
//! (`.pth`/`.pt`) holding a state dict. Loading is strict: the key set must
//! match the model exactly, and every tensor must have the expected shape.
//! When no checkpoint exists the classifier falls back to random weights.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use candle_core::{DType, Device, Tensor};
use candle_nn::{VarBuilder, VarMap};
use tracing::{debug, info, warn};

use crate::model::{SignalClassifier, NUM_CLASSES};
use crate::{ClassifierError, Result};

/// BatchNorm bookkeeping counter, not needed for inference
const IGNORED_SUFFIX: &str = ".num_batches_tracked";

/// Where the classifier parameters came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WeightSource {
    Checkpoint(PathBuf),
    RandomInit,
}

impl fmt::Display for WeightSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WeightSource::Checkpoint(path) => write!(f, "{}", path.display()),
            WeightSource::RandomInit => write!(f, "random initialization"),
        }
    }
}

/// Build a classifier from `path`, or from random weights if it does not exist
pub fn load_classifier(path: &Path, device: &Device) -> Result<(SignalClassifier, WeightSource)> {
    if !path.exists() {
        warn!(
            "Weight file {} not found, using randomly initialized weights",
            path.display()
        );
        let model = random_classifier(device)?;
        return Ok((model, WeightSource::RandomInit));
    }

    let tensors = read_tensors(path)?;
    debug!("Read {} tensors from {}", tensors.len(), path.display());

    check_keys(expected_keys()?, tensors.keys())?;

    let vb = VarBuilder::from_tensors(tensors, DType::F32, device);
    let model = SignalClassifier::new(NUM_CLASSES, vb)
        .map_err(|e| ClassifierError::ModelLoad(format!("{}: {}", path.display(), e)))?;

    info!("Loaded weights from {}", path.display());
    Ok((model, WeightSource::Checkpoint(path.to_path_buf())))
}

/// Classifier with freshly initialized parameters
pub fn random_classifier(device: &Device) -> Result<SignalClassifier> {
    let varmap = VarMap::new();
    let vb = VarBuilder::from_varmap(&varmap, DType::F32, device);
    Ok(SignalClassifier::new(NUM_CLASSES, vb)?)
}

static EXPECTED_KEYS: OnceLock<BTreeSet<String>> = OnceLock::new();

/// Parameter and buffer names the classifier expects.
///
/// Collected from a throwaway CPU model on first use and cached for the
/// rest of the process.
pub fn expected_keys() -> Result<&'static BTreeSet<String>> {
    if let Some(keys) = EXPECTED_KEYS.get() {
        return Ok(keys);
    }
    let keys = collect_keys()?;
    Ok(EXPECTED_KEYS.get_or_init(|| keys))
}

fn collect_keys() -> Result<BTreeSet<String>> {
    let varmap = VarMap::new();
    let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
    SignalClassifier::new(NUM_CLASSES, vb)?;

    let data = varmap
        .data()
        .lock()
        .map_err(|e| ClassifierError::ModelLoad(e.to_string()))?;
    Ok(data.keys().cloned().collect())
}

/// Compare a checkpoint's key set against the expected one
pub fn check_keys<'a>(
    expected: &BTreeSet<String>,
    found: impl IntoIterator<Item = &'a String>,
) -> Result<()> {
    let found: BTreeSet<&String> = found.into_iter().collect();

    let missing: Vec<String> = expected
        .iter()
        .filter(|k| !found.contains(k))
        .cloned()
        .collect();
    let unexpected: Vec<String> = found
        .iter()
        .filter(|k| !expected.contains(k.as_str()))
        .map(|k| k.to_string())
        .collect();

    if missing.is_empty() && unexpected.is_empty() {
        Ok(())
    } else {
        Err(ClassifierError::WeightMismatch {
            missing,
            unexpected,
        })
    }
}

/// Read all tensors from a checkpoint, dropping BatchNorm counters
fn read_tensors(path: &Path) -> Result<HashMap<String, Tensor>> {
    let load_err = |e: candle_core::Error| ClassifierError::ModelLoad(format!("{}: {}", path.display(), e));

    let mut tensors: HashMap<String, Tensor> = match path.extension().and_then(|e| e.to_str()) {
        Some("safetensors") => candle_core::safetensors::load(path, &Device::Cpu).map_err(load_err)?,
        _ => candle_core::pickle::read_all(path)
            .map_err(load_err)?
            .into_iter()
            .collect(),
    };

    tensors.retain(|name, _| !name.ends_with(IGNORED_SUFFIX));
    Ok(tensors)
}
