//! Signal and prediction file readers

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::{ParameterHeader, Prediction, SignalIoError, SignalRecord};

/// Read and parse a signal file
pub fn read_signal_file(path: impl AsRef<Path>) -> Result<SignalRecord, SignalIoError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|e| SignalIoError::io(path, e))?;
    let record = parse_signal(&text)?;
    debug!(
        "Read {} samples ({} rows x {} columns) from {}",
        record.samples.len(),
        record.rows(),
        record.columns,
        path.display()
    );
    Ok(record)
}

/// Parse signal file contents: header line, then a whitespace-separated
/// numeric matrix. Blank lines are skipped and `#` starts a comment.
pub fn parse_signal(text: &str) -> Result<SignalRecord, SignalIoError> {
    let mut lines = text.lines();
    let header_line = lines.next().ok_or(SignalIoError::MissingHeader {
        marker: crate::HEADER_MARKER,
    })?;
    let header = ParameterHeader::parse_line(header_line)?;

    let mut samples = Vec::new();
    let mut columns = 0;

    for (idx, raw) in lines.enumerate() {
        let line_no = idx + 2;
        let content = raw.split('#').next().unwrap_or_default();

        let row = parse_row(content, line_no)?;
        if row.is_empty() {
            continue;
        }

        if columns == 0 {
            columns = row.len();
        } else if row.len() != columns {
            return Err(SignalIoError::RaggedRow {
                line: line_no,
                expected: columns,
                found: row.len(),
            });
        }
        samples.extend(row);
    }

    if samples.is_empty() {
        return Err(SignalIoError::EmptyBody);
    }

    Ok(SignalRecord {
        header,
        samples,
        columns,
    })
}

/// Read a prediction file written by [`crate::write_prediction`]
pub fn read_prediction(path: impl AsRef<Path>) -> Result<Prediction, SignalIoError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|e| SignalIoError::io(path, e))?;

    let mut logits = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        logits.extend(parse_row(line, idx + 1)?);
    }
    Ok(Prediction::new(logits))
}

fn parse_row(content: &str, line: usize) -> Result<Vec<f64>, SignalIoError> {
    content
        .split_whitespace()
        .map(|token| {
            token.parse::<f64>().map_err(|_| SignalIoError::InvalidNumber {
                line,
                token: token.to_string(),
            })
        })
        .collect()
}
