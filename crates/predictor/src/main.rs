//! Signal Predictor - Main Entry Point

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::Parser;
use predictor::{init_logging, run, PipelineOptions, PredictorConfig};
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "signal-predict", version)]
#[command(about = "Classify a signal file from its wavelet scalogram", long_about = None)]
struct Args {
    /// Signal file: a `# Parameters: {json}` line followed by samples
    input: PathBuf,

    /// Configuration file (toml, yaml or json)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Also write the composite scalogram as a PNG
    #[arg(long, value_name = "PNG")]
    scalogram: Option<PathBuf>,
}

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => e.exit(),
        Err(e) => {
            // Usage errors share the failure exit code with pipeline errors
            let _ = e.print();
            return ExitCode::FAILURE;
        }
    };

    match predict(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:?}", e);
            ExitCode::FAILURE
        }
    }
}

fn predict(args: Args) -> Result<()> {
    let config = PredictorConfig::load(args.config.as_deref()).context("failed to load configuration")?;
    init_logging(&config)?;

    info!("=== Signal Predictor v{} ===", env!("CARGO_PKG_VERSION"));

    let options = PipelineOptions {
        input: args.input,
        scalogram: args.scalogram,
    };
    let outcome = run(&options, &config)?;

    info!(
        "Done: {} ({} weights)",
        outcome.output.display(),
        outcome.weights
    );
    Ok(())
}
