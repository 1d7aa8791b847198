//! End-to-end runs of the predictor

use std::path::Path;
use std::process::Command;

use predictor::{run, PipelineOptions, PredictorConfig};
use signal_io::{read_prediction, write_signal_file, ParameterHeader};

const BIN: &str = env!("CARGO_BIN_EXE_signal-predict");

fn write_zero_signal(path: &Path, samples: usize) {
    let header = ParameterHeader::with_model_path("missing.pth");
    write_signal_file(path, &header, &vec![0.0; samples]).unwrap();
}

#[test]
fn test_zero_signal_with_missing_weights() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("signal.txt");
    write_zero_signal(&input, 3001);

    let output = Command::new(BIN)
        .arg(&input)
        .current_dir(dir.path())
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let result = dir.path().join("signal.txt.data");
    let text = std::fs::read_to_string(&result).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 3);
    for line in lines {
        assert!(line.contains('e'), "not savetxt format: {line}");
        assert!(line.parse::<f64>().unwrap().is_finite());
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("not found"), "no fallback warning in: {stderr}");
}

#[test]
fn test_malformed_header_fails_without_output() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("signal.txt");
    std::fs::write(&input, "Parameters: {\"model_path\": \"m.pth\"}\n1\n2\n3\n").unwrap();

    let output = Command::new(BIN)
        .arg(&input)
        .current_dir(dir.path())
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(!dir.path().join("signal.txt.data").exists());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("load input stage failed"), "stderr: {stderr}");
}

#[test]
fn test_missing_argument_exits_with_failure() {
    let output = Command::new(BIN).output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(!output.stderr.is_empty());

    let output = Command::new(BIN).arg("--unknown-flag").arg("x").output().unwrap();
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_help_exits_successfully() {
    let output = Command::new(BIN).arg("--help").output().unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("signal-predict"));
}

#[test]
fn test_config_file_and_env_override() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("signal.txt");
    write_zero_signal(&input, 300);

    let config = dir.path().join("predictor.toml");
    std::fs::write(&config, "log_format = \"json\"\noutput_extension = \"result\"\n").unwrap();

    let output = Command::new(BIN)
        .arg(&input)
        .arg("--config")
        .arg(&config)
        .env("SIGNAL_PREDICT_OUTPUT_EXTENSION", "out")
        .current_dir(dir.path())
        .output()
        .unwrap();
    assert!(output.status.success());
    assert!(dir.path().join("signal.txt.out").exists());
    assert!(!dir.path().join("signal.txt.result").exists());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.lines().any(|l| l.starts_with('{')), "no json lines: {stderr}");
}

#[test]
fn test_library_run_exports_scalogram() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("signal.txt");
    let header = ParameterHeader::with_model_path(
        dir.path().join("absent.pth").to_string_lossy().into_owned(),
    );
    let samples: Vec<f64> = (0..600).map(|i| (i as f64 / 25.0).sin()).collect();
    write_signal_file(&input, &header, &samples).unwrap();

    let png = dir.path().join("scalogram.png");
    let options = PipelineOptions {
        input: input.clone(),
        scalogram: Some(png.clone()),
    };
    let outcome = run(&options, &PredictorConfig::default()).unwrap();

    assert_eq!(outcome.output, dir.path().join("signal.txt.data"));
    assert_eq!(outcome.weights, classifier::WeightSource::RandomInit);
    assert_eq!(read_prediction(&outcome.output).unwrap(), outcome.prediction);
    assert!(outcome.prediction.location().is_some());
    assert!(png.exists());
}
