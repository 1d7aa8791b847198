//! Signal and prediction file writers

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::{ParameterHeader, Prediction, SignalIoError};

/// Write a signal file: the header line, then one sample per line
pub fn write_signal_file(
    path: impl AsRef<Path>,
    header: &ParameterHeader,
    samples: &[f64],
) -> Result<(), SignalIoError> {
    let path = path.as_ref();
    let line = header.to_line()?;

    write_atomically(path, |out| {
        writeln!(out, "{}", line)?;
        for sample in samples {
            writeln!(out, "{}", sample)?;
        }
        Ok(())
    })?;

    debug!("Wrote {} samples to {}", samples.len(), path.display());
    Ok(())
}

/// Write a prediction, one value per line in `%.18e` notation.
///
/// The file is written next to its destination and renamed into place, so
/// a failed write leaves no output file behind.
pub fn write_prediction(path: impl AsRef<Path>, prediction: &Prediction) -> Result<(), SignalIoError> {
    let path = path.as_ref();

    write_atomically(path, |out| {
        for value in &prediction.logits {
            writeln!(out, "{}", format_savetxt(*value))?;
        }
        Ok(())
    })?;

    debug!("Wrote {} values to {}", prediction.len(), path.display());
    Ok(())
}

/// Format a value the way NumPy's `savetxt` default (`%.18e`) does,
/// e.g. `-1.250000000000000000e-03`.
pub fn format_savetxt(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }

    let formatted = format!("{:.18e}", value);
    match formatted.split_once('e') {
        Some((mantissa, exponent)) => {
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exponent),
            };
            format!("{}e{}{:0>2}", mantissa, sign, digits)
        }
        None => formatted,
    }
}

fn write_atomically<F>(path: &Path, fill: F) -> Result<(), SignalIoError>
where
    F: FnOnce(&mut BufWriter<File>) -> std::io::Result<()>,
{
    let tmp = temp_sibling(path);

    let result = File::create(&tmp).and_then(|file| {
        let mut out = BufWriter::new(file);
        fill(&mut out)?;
        out.flush()
    });

    if let Err(e) = result.and_then(|_| fs::rename(&tmp, path)) {
        let _ = fs::remove_file(&tmp);
        return Err(SignalIoError::io(path, e));
    }
    Ok(())
}

fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}
