//! Signal File I/O
//!
//! Reads acquisition files (a `# Parameters: ` JSON header line followed by a
//! numeric body), splits the samples into channels, and writes/reads the
//! prediction result files exchanged with the host application.

mod error;
mod header;
mod prediction;
mod reader;
mod record;
mod writer;

pub use error::SignalIoError;
pub use header::{ParameterHeader, DEFAULT_MODEL_PATH, HEADER_MARKER};
pub use prediction::{LocationEstimate, Prediction};
pub use reader::{parse_signal, read_prediction, read_signal_file};
pub use record::{split_channels, SignalRecord};
pub use writer::{format_savetxt, write_prediction, write_signal_file};
