//! Complex Morlet wavelet

use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

use rustfft::{num_complex::Complex, FftPlanner};

use crate::ScalogramError;

/// Support of the sampled wavelet
const LOWER_BOUND: f64 = -8.0;
const UPPER_BOUND: f64 = 8.0;

/// Complex Morlet wavelet `cmor{B}-{C}`:
/// `psi(x) = exp(-x^2 / B) * exp(2*pi*i*C*x) / sqrt(pi * B)`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComplexMorlet {
    /// Bandwidth parameter B
    bandwidth: f64,
    /// Center frequency C
    center: f64,
}

impl ComplexMorlet {
    /// Create a wavelet from bandwidth and center frequency
    pub fn new(bandwidth: f64, center: f64) -> Self {
        Self { bandwidth, center }
    }

    pub fn bandwidth(&self) -> f64 {
        self.bandwidth
    }

    pub fn center(&self) -> f64 {
        self.center
    }

    /// Evaluate the wavelet at `x`
    pub fn psi(&self, x: f64) -> Complex<f64> {
        let envelope = (-x * x / self.bandwidth).exp() / (PI * self.bandwidth).sqrt();
        Complex::from_polar(envelope, 2.0 * PI * self.center * x)
    }

    /// Sample the wavelet on `2^precision` evenly spaced points over its support
    pub fn wavefun(&self, precision: u32) -> (Vec<Complex<f64>>, Vec<f64>) {
        let x = linspace(LOWER_BOUND, UPPER_BOUND, 1usize << precision);
        let psi = x.iter().map(|&v| self.psi(v)).collect();
        (psi, x)
    }

    /// Running integral of the sampled wavelet (cumulative sum times step)
    pub fn integrate(&self, precision: u32) -> (Vec<Complex<f64>>, Vec<f64>) {
        let (psi, x) = self.wavefun(precision);
        let step = x[1] - x[0];

        let mut acc = Complex::new(0.0, 0.0);
        let integral = psi
            .iter()
            .map(|&v| {
                acc += v;
                acc * step
            })
            .collect();
        (integral, x)
    }

    /// Central frequency estimated from the spectral peak of the sampled
    /// wavelet, in cycles per unit of `x`
    pub fn central_frequency(&self, precision: u32) -> f64 {
        let (mut spectrum, x) = self.wavefun(precision);
        let n = spectrum.len();
        let domain = x[n - 1] - x[0];

        let fft = FftPlanner::new().plan_fft_forward(n);
        fft.process(&mut spectrum);

        // First peak of |FFT| ignoring the DC bin
        let (peak, _) = spectrum[1..]
            .iter()
            .enumerate()
            .fold((0, f64::MIN), |best, (i, c)| {
                let magnitude = c.norm();
                if magnitude > best.1 {
                    (i, magnitude)
                } else {
                    best
                }
            });

        let mut index = peak + 2;
        if index as f64 > n as f64 / 2.0 {
            index = n - index + 2;
        }
        1.0 / (domain / (index - 1) as f64)
    }

    /// Pseudo-frequency of `scale`, in cycles per sample
    pub fn scale_to_frequency(&self, scale: f64, precision: u32) -> f64 {
        self.central_frequency(precision) / scale
    }
}

impl FromStr for ComplexMorlet {
    type Err = ScalogramError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        let unsupported = || ScalogramError::UnsupportedWavelet(name.to_string());

        let params = name.strip_prefix("cmor").ok_or_else(unsupported)?;
        let (bandwidth, center) = params.split_once('-').ok_or_else(unsupported)?;
        let bandwidth: f64 = bandwidth.parse().map_err(|_| unsupported())?;
        let center: f64 = center.parse().map_err(|_| unsupported())?;

        if !(bandwidth > 0.0 && center > 0.0) {
            return Err(unsupported());
        }
        Ok(Self::new(bandwidth, center))
    }
}

impl fmt::Display for ComplexMorlet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cmor{}-{}", self.bandwidth, self.center)
    }
}

/// `n` evenly spaced points from `start` to `stop` inclusive
fn linspace(start: f64, stop: f64, n: usize) -> Vec<f64> {
    if n == 1 {
        return vec![start];
    }
    let step = (stop - start) / (n - 1) as f64;
    let mut points: Vec<f64> = (0..n).map(|i| start + i as f64 * step).collect();
    points[n - 1] = stop;
    points
}
