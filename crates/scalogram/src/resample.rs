//! Cubic B-spline image resampling
//!
//! Corner-aligned zoom: output sample `o` of an axis reads input coordinate
//! `o * (in - 1) / (out - 1)`. The image is first converted to cubic spline
//! coefficients, then sampled separably along columns and rows. Both steps
//! extend the image by mirroring about the edge samples.

use ndarray::{Array1, Array2, ArrayView1, Axis};

use crate::ScalogramError;

/// Pole of the cubic B-spline prefilter
const POLE: f64 = -0.267_949_192_431_122_7; // sqrt(3) - 2

/// Resize `image` to `shape` (rows, cols) by cubic spline interpolation
pub fn zoom(image: &Array2<f64>, shape: (usize, usize)) -> Result<Array2<f64>, ScalogramError> {
    let (rows, cols) = image.dim();
    if rows == 0 || cols == 0 || shape.0 == 0 || shape.1 == 0 {
        return Err(ScalogramError::EmptyImage { rows, cols });
    }

    let mut coefficients = image.to_owned();
    for axis in [Axis(0), Axis(1)] {
        for mut lane in coefficients.lanes_mut(axis) {
            let mut values = lane.to_vec();
            spline_filter(&mut values);
            lane.assign(&Array1::from(values));
        }
    }

    // Along columns first, then along rows
    let col_taps = taps(cols, shape.1);
    let mut partial = Array2::zeros((rows, shape.1));
    for (src, mut dst) in coefficients.outer_iter().zip(partial.outer_iter_mut()) {
        for (value, tap) in dst.iter_mut().zip(&col_taps) {
            *value = tap.apply(src);
        }
    }

    let row_taps = taps(rows, shape.0);
    let mut out = Array2::zeros(shape);
    for (src, mut dst) in partial.axis_iter(Axis(1)).zip(out.axis_iter_mut(Axis(1))) {
        for (value, tap) in dst.iter_mut().zip(&row_taps) {
            *value = tap.apply(src);
        }
    }

    Ok(out)
}

/// Four input indices and their cubic B-spline weights
struct Tap {
    indices: [usize; 4],
    weights: [f64; 4],
}

impl Tap {
    fn apply(&self, lane: ArrayView1<'_, f64>) -> f64 {
        self.indices
            .iter()
            .zip(&self.weights)
            .map(|(&i, &w)| lane[i] * w)
            .sum()
    }
}

fn taps(in_len: usize, out_len: usize) -> Vec<Tap> {
    let step = if out_len > 1 {
        (in_len - 1) as f64 / (out_len - 1) as f64
    } else {
        1.0
    };

    (0..out_len)
        .map(|o| {
            let coord = o as f64 * step;
            let base = coord.floor();
            let t = coord - base;
            let start = base as isize - 1;

            let mut indices = [0; 4];
            for (k, index) in indices.iter_mut().enumerate() {
                *index = mirror(start + k as isize, in_len);
            }
            Tap {
                indices,
                weights: bspline_weights(t),
            }
        })
        .collect()
}

/// Cubic B-spline weights for samples at offsets -1, 0, 1, 2 from `floor(coord)`
fn bspline_weights(t: f64) -> [f64; 4] {
    let t2 = t * t;
    let t3 = t2 * t;
    let u = 1.0 - t;
    [
        u * u * u / 6.0,
        (4.0 - 6.0 * t2 + 3.0 * t3) / 6.0,
        (1.0 + 3.0 * t + 3.0 * t2 - 3.0 * t3) / 6.0,
        t3 / 6.0,
    ]
}

/// Whole-sample mirror extension: `d c b | a b c d | c b a`
fn mirror(index: isize, len: usize) -> usize {
    if len == 1 {
        return 0;
    }
    let period = 2 * (len as isize - 1);
    let wrapped = index.rem_euclid(period);
    if wrapped >= len as isize {
        (period - wrapped) as usize
    } else {
        wrapped as usize
    }
}

/// Convert samples to cubic spline coefficients in place (mirror boundary)
fn spline_filter(c: &mut [f64]) {
    let n = c.len();
    if n < 2 {
        return;
    }

    let z = POLE;
    let gain = (1.0 - z) * (1.0 - 1.0 / z);
    for v in c.iter_mut() {
        *v *= gain;
    }

    // Causal initialization
    let z_n_1 = z.powi(n as i32 - 1);
    let mut z_i = z;
    c[0] += z_n_1 * c[n - 1];
    for i in 1..n - 1 {
        c[0] += z_i * (c[i] + z_n_1 * c[n - 1 - i]);
        z_i *= z;
    }
    c[0] /= 1.0 - z_n_1 * z_n_1;

    for i in 1..n {
        c[i] += z * c[i - 1];
    }

    // Anti-causal initialization
    c[n - 1] = (z * c[n - 2] + c[n - 1]) * z / (z * z - 1.0);

    for i in (0..n - 1).rev() {
        c[i] = z * (c[i + 1] - c[i]);
    }
}
