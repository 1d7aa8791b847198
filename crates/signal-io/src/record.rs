//! Loaded signal and channel splitting

use crate::{ParameterHeader, SignalIoError};

/// One acquisition read from a signal file
#[derive(Debug, Clone, PartialEq)]
pub struct SignalRecord {
    /// Parsed header parameters
    pub header: ParameterHeader,
    /// Samples in row-major order
    pub samples: Vec<f64>,
    /// Column count of the body matrix (1 for one sample per line)
    pub columns: usize,
}

impl SignalRecord {
    /// Number of body rows
    pub fn rows(&self) -> usize {
        if self.columns == 0 {
            0
        } else {
            self.samples.len() / self.columns
        }
    }

    /// Split the samples into `parts` contiguous channels
    pub fn channels(&self, parts: usize) -> Result<Vec<&[f64]>, SignalIoError> {
        split_channels(&self.samples, parts)
    }
}

/// Split `samples` into `parts` contiguous, near-equal channels.
///
/// The first `len % parts` channels hold one extra sample, so 3001 samples
/// become channels of 1001, 1000 and 1000.
pub fn split_channels(samples: &[f64], parts: usize) -> Result<Vec<&[f64]>, SignalIoError> {
    if parts == 0 || samples.len() < parts {
        return Err(SignalIoError::TooFewSamples {
            samples: samples.len(),
            channels: parts,
        });
    }

    let base = samples.len() / parts;
    let extra = samples.len() % parts;

    let mut channels = Vec::with_capacity(parts);
    let mut start = 0;
    for i in 0..parts {
        let len = base + usize::from(i < extra);
        channels.push(&samples[start..start + len]);
        start += len;
    }
    Ok(channels)
}
