//! Scalogram Engine
//!
//! Turns raw signal channels into the time-frequency images fed to the
//! classifier:
//! - Complex Morlet wavelets and their integrated forms
//! - Continuous wavelet transform with band selection
//! - Cubic spline resampling
//! - Composite three-channel model input

pub mod composite;
pub mod cwt;
pub mod resample;
pub mod wavelet;

pub use composite::{assemble, from_channels, CompositeImage, CHANNELS, TARGET_HEIGHT, TARGET_WIDTH};
pub use cwt::{Cwt, CwtConfig, CwtTransformer};
pub use resample::zoom;
pub use wavelet::ComplexMorlet;

use thiserror::Error;

/// Scalogram error types
#[derive(Debug, Error)]
pub enum ScalogramError {
    #[error("unsupported wavelet name: {0}")]
    UnsupportedWavelet(String),

    #[error("scale {0} too small for the wavelet sampling")]
    ScaleTooSmall(f64),

    #[error("cannot transform an empty signal")]
    EmptySignal,

    #[error("expected {expected} channel images, got {actual}")]
    ChannelCount { expected: usize, actual: usize },

    #[error("cannot resample an empty image ({rows}x{cols})")]
    EmptyImage { rows: usize, cols: usize },

    #[error("Image processing failed: {0}")]
    ImageProcessing(#[from] image::ImageError),
}
