//! Continuous Wavelet Transform

use ndarray::{Array2, Axis};
use rustfft::{num_complex::Complex, FftPlanner};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::wavelet::ComplexMorlet;
use crate::ScalogramError;

/// Sampling precision used when estimating the wavelet's central frequency
const CENTRAL_FREQUENCY_PRECISION: u32 = 8;

/// Acquisition and transform settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CwtConfig {
    /// Sampling interval (seconds)
    pub dt: f64,
    /// Acquisition window (seconds)
    pub total_time: f64,
    /// Wavelet name, `cmor{B}-{C}`
    pub wavelet: String,
    /// Number of scales
    pub total_scales: usize,
    /// Multiplier applied to `central_frequency * total_scales`
    pub scale_factor: f64,
    /// Retained frequency band (Hz), inclusive
    pub band_hz: (f64, f64),
    /// Wavelet sampling precision (`2^precision` points)
    pub precision: u32,
}

impl Default for CwtConfig {
    fn default() -> Self {
        Self {
            dt: 1e-7,
            total_time: 1e-3,
            wavelet: "cmor1-1".to_string(),
            total_scales: 256,
            scale_factor: 10.0,
            band_hz: (50e3, 400e3),
            precision: 10,
        }
    }
}

impl CwtConfig {
    /// Sampling rate (Hz)
    pub fn sampling_rate(&self) -> f64 {
        1.0 / self.dt
    }

    /// Sample count implied by the acquisition window
    pub fn nominal_samples(&self) -> usize {
        (self.total_time / self.dt) as usize + 1
    }
}

/// Convolution-based CWT over an integrated wavelet
pub struct Cwt {
    /// Conjugated running integral of the wavelet
    int_psi: Vec<Complex<f64>>,
    /// Sample positions of `int_psi`
    x: Vec<f64>,
    planner: FftPlanner<f64>,
}

impl Cwt {
    pub fn new(wavelet: &ComplexMorlet, precision: u32) -> Self {
        let (int_psi, x) = wavelet.integrate(precision);
        Self {
            int_psi: int_psi.into_iter().map(|c| c.conj()).collect(),
            x,
            planner: FftPlanner::new(),
        }
    }

    /// Integrated wavelet stretched to `scale`, time-reversed for convolution
    pub fn kernel(&self, scale: f64) -> Result<Vec<Complex<f64>>, ScalogramError> {
        if !(scale > 0.0) {
            return Err(ScalogramError::ScaleTooSmall(scale));
        }

        let step = self.x[1] - self.x[0];
        let span = self.x[self.x.len() - 1] - self.x[0];
        let count = (scale * span + 1.0).ceil() as usize;

        let mut kernel: Vec<Complex<f64>> = (0..count)
            .map(|k| (k as f64 / (scale * step)) as usize)
            .take_while(|&j| j < self.int_psi.len())
            .map(|j| self.int_psi[j])
            .collect();
        kernel.reverse();
        Ok(kernel)
    }

    /// Complex coefficients, one row per scale, one column per sample
    pub fn transform(
        &mut self,
        signal: &[f64],
        scales: &[f64],
    ) -> Result<Array2<Complex<f64>>, ScalogramError> {
        if signal.is_empty() {
            return Err(ScalogramError::EmptySignal);
        }

        let n = signal.len();
        let mut out = Array2::from_elem((scales.len(), n), Complex::new(0.0, 0.0));

        for (row, &scale) in scales.iter().enumerate() {
            let kernel = self.kernel(scale)?;
            let m = kernel.len();

            // Trim the differentiated full convolution back to the signal length
            let excess = (m as f64 - 2.0) / 2.0;
            if excess < 0.0 {
                return Err(ScalogramError::ScaleTooSmall(scale));
            }
            let start = excess.floor() as usize;

            let conv = self.convolve(signal, &kernel);
            let gain = -scale.sqrt();
            for (col, dst) in out.row_mut(row).iter_mut().enumerate() {
                let k = start + col;
                *dst = (conv[k + 1] - conv[k]) * gain;
            }
        }

        Ok(out)
    }

    /// Full linear convolution through zero-padded FFTs
    fn convolve(&mut self, signal: &[f64], kernel: &[Complex<f64>]) -> Vec<Complex<f64>> {
        let len = signal.len() + kernel.len() - 1;
        let size = len.next_power_of_two();

        let mut a: Vec<Complex<f64>> = signal.iter().map(|&v| Complex::new(v, 0.0)).collect();
        a.resize(size, Complex::new(0.0, 0.0));
        let mut b = kernel.to_vec();
        b.resize(size, Complex::new(0.0, 0.0));

        let forward = self.planner.plan_fft_forward(size);
        forward.process(&mut a);
        forward.process(&mut b);

        for (x, y) in a.iter_mut().zip(&b) {
            *x *= *y;
        }

        let inverse = self.planner.plan_fft_inverse(size);
        inverse.process(&mut a);

        let norm = 1.0 / size as f64;
        a.truncate(len);
        for v in &mut a {
            *v *= norm;
        }
        a
    }
}

/// Signal channel to normalized, band-limited magnitude image
pub struct CwtTransformer {
    config: CwtConfig,
    cwt: Cwt,
    scales: Vec<f64>,
    /// Equivalent frequency of each scale row
    frequencies: Vec<f64>,
}

impl CwtTransformer {
    pub fn new(config: CwtConfig) -> Result<Self, ScalogramError> {
        let wavelet: ComplexMorlet = config.wavelet.parse()?;
        let central = wavelet.central_frequency(CENTRAL_FREQUENCY_PRECISION);

        let cparam = config.scale_factor * central * config.total_scales as f64;
        let scales: Vec<f64> = (1..=config.total_scales)
            .rev()
            .map(|index| cparam / index as f64)
            .collect();

        // Pseudo-frequency divided by the sampling rate
        let sampling_rate = config.sampling_rate();
        let frequencies = scales
            .iter()
            .map(|&scale| central / scale / sampling_rate)
            .collect();

        debug!(
            "CWT: wavelet={} central_frequency={} scales={:.3}..{:.3}",
            wavelet,
            central,
            scales.first().copied().unwrap_or_default(),
            scales.last().copied().unwrap_or_default()
        );

        Ok(Self {
            cwt: Cwt::new(&wavelet, config.precision),
            config,
            scales,
            frequencies,
        })
    }

    pub fn config(&self) -> &CwtConfig {
        &self.config
    }

    /// Scales in row order (ascending)
    pub fn scales(&self) -> &[f64] {
        &self.scales
    }

    /// Equivalent frequency per scale row
    pub fn frequencies(&self) -> &[f64] {
        &self.frequencies
    }

    /// Row indices whose frequency lies inside the configured band
    pub fn band_rows(&self) -> Vec<usize> {
        let (low, high) = self.config.band_hz;
        self.frequencies
            .iter()
            .enumerate()
            .filter(|&(_, &f)| f >= low && f <= high)
            .map(|(i, _)| i)
            .collect()
    }

    /// Transform one channel into a `[0, 1]` magnitude image.
    ///
    /// Rows outside the band are dropped; when no row is inside the band the
    /// full normalized matrix is returned.
    pub fn transform(&mut self, signal: &[f64]) -> Result<Array2<f64>, ScalogramError> {
        if signal.len() != self.config.nominal_samples() {
            debug!(
                "Channel has {} samples, acquisition window implies {}",
                signal.len(),
                self.config.nominal_samples()
            );
        }

        let coefs = self.cwt.transform(signal, &self.scales)?;
        let mut magnitude = coefs.mapv(|c| c.norm());
        normalize_min_max(&mut magnitude);
        debug!("CWT output shape: {:?}", magnitude.dim());

        let rows = self.band_rows();
        if rows.is_empty() {
            let (lo, hi) = min_max(self.frequencies.iter().copied());
            warn!(
                "No scale inside {:.2e}-{:.2e} Hz (scale frequencies span {:.2e}-{:.2e} Hz), keeping all {} rows",
                self.config.band_hz.0,
                self.config.band_hz.1,
                lo,
                hi,
                magnitude.nrows()
            );
            return Ok(magnitude);
        }

        let filtered = magnitude.select(Axis(0), &rows);
        debug!("Band-limited shape: {:?}", filtered.dim());
        Ok(filtered)
    }
}

/// Min-max normalize in place; a constant image becomes all zeros
fn normalize_min_max(image: &mut Array2<f64>) {
    let (min, max) = min_max(image.iter().copied());
    if max > min {
        let range = max - min;
        image.mapv_inplace(|v| (v - min) / range);
    } else {
        image.fill(0.0);
    }
}

fn min_max(values: impl Iterator<Item = f64>) -> (f64, f64) {
    values.fold((f64::MAX, f64::MIN), |(lo, hi), v| (lo.min(v), hi.max(v)))
}
