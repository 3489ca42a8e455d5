use assert_cmd::cargo::cargo_bin_cmd;
use ecg_lib::{detectors::ecg::BeatDetection, metrics::spectrum::Spectrum, signal::TimeSeries};
use std::{error::Error, fs, path::PathBuf};
use tempfile::tempdir;

#[test]
fn detect_beats_reads_named_csv_column() -> Result<(), Box<dyn Error>> {
    let recording = sample_path("test_data/pulse_train_75bpm.csv");

    let mut cmd = cargo_bin_cmd!("ecg");
    cmd.args([
        "detect-beats",
        "--input",
        recording.as_str(),
        "--column",
        "lead_ii",
        "--fs",
        "500",
    ]);
    let output = cmd.assert().success().get_output().stdout.clone();
    let detection: BeatDetection = serde_json::from_slice(&output)?;

    assert_eq!(detection.sample_count, 3200);
    assert_eq!(
        detection.peaks.indices,
        (0..8).map(|k| 200 + 400 * k).collect::<Vec<_>>()
    );
    assert!(detection.rr.rr.iter().all(|rr| (rr - 0.8).abs() < 1e-12));
    assert!((detection.heart_rate.average_bpm - 75.0).abs() < 1e-9);
    Ok(())
}

#[test]
fn detect_beats_on_flat_signal_fails() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let input = dir.path().join("flat.txt");
    fs::write(&input, "0.0\n".repeat(1000))?;

    let mut cmd = cargo_bin_cmd!("ecg");
    cmd.args([
        "detect-beats",
        "--input",
        input.to_str().expect("utf8 path"),
    ]);
    let output = cmd.assert().failure().get_output().stderr.clone();
    assert!(String::from_utf8_lossy(&output).contains("detected 0"));
    Ok(())
}

#[test]
fn filter_preserves_length_from_stdin() -> Result<(), Box<dyn Error>> {
    let samples = fs::read_to_string(sample_path("test_data/pulse_train_50bpm.txt"))?;

    let mut cmd = cargo_bin_cmd!("ecg");
    cmd.args(["filter", "--fs", "500"]).write_stdin(samples);
    let output = cmd.assert().success().get_output().stdout.clone();
    let filtered: TimeSeries = serde_json::from_slice(&output)?;

    assert_eq!(filtered.fs, 500.0);
    assert_eq!(filtered.len(), 6000);
    let apex = filtered.data[300];
    assert!(apex > 0.5 && apex < 1.0, "apex {apex}");
    Ok(())
}

#[test]
fn filter_rejects_inverted_cutoffs() {
    let recording = sample_path("test_data/pulse_train_50bpm.txt");
    let mut cmd = cargo_bin_cmd!("ecg");
    cmd.args([
        "filter",
        "--input",
        recording.as_str(),
        "--low-cutoff",
        "50",
        "--high-cutoff",
        "0.5",
    ]);
    let output = cmd.assert().failure().get_output().stderr.clone();
    assert!(String::from_utf8_lossy(&output).contains("invalid filter spec"));
}

#[test]
fn filter_rejects_cutoff_above_nyquist() {
    let recording = sample_path("test_data/pulse_train_50bpm.txt");
    let mut cmd = cargo_bin_cmd!("ecg");
    cmd.args([
        "filter",
        "--input",
        recording.as_str(),
        "--fs",
        "80",
        "--high-cutoff",
        "50",
    ]);
    cmd.assert().failure();
}

#[test]
fn spectrum_bins_follow_sampling_rate() -> Result<(), Box<dyn Error>> {
    let recording = sample_path("test_data/pulse_train_50bpm.txt");

    let mut cmd = cargo_bin_cmd!("ecg");
    cmd.args(["spectrum", "--input", recording.as_str(), "--fs", "500"]);
    let output = cmd.assert().success().get_output().stdout.clone();
    let spectrum: Spectrum = serde_json::from_slice(&output)?;

    assert_eq!(spectrum.len(), 3000);
    assert_eq!(spectrum.frequencies_hz[0], 0.0);
    assert!((spectrum.frequencies_hz[1] - 500.0 / 6000.0).abs() < 1e-12);
    // 10 triangles of area 25 samples each.
    assert!((spectrum.magnitudes[0] - 250.0).abs() < 1e-6);
    Ok(())
}

#[test]
fn add_noise_is_seeded() -> Result<(), Box<dyn Error>> {
    let recording = sample_path("test_data/pulse_train_50bpm.txt");
    let run = |seed: &str| -> Vec<u8> {
        let mut cmd = cargo_bin_cmd!("ecg");
        cmd.args([
            "add-noise",
            "--input",
            recording.as_str(),
            "--kind",
            "uniform",
            "--level",
            "0.1",
            "--seed",
            seed,
        ]);
        cmd.assert().success().get_output().stdout.clone()
    };

    let first = run("3");
    assert_eq!(first, run("3"));
    assert_ne!(first, run("4"));

    let text = String::from_utf8(first)?;
    let values: Vec<f64> = text
        .lines()
        .map(|line| line.parse::<f64>())
        .collect::<Result<_, _>>()?;
    assert_eq!(values.len(), 6000);
    let clean: Vec<f64> = fs::read_to_string(&recording)?
        .lines()
        .map(|line| line.parse::<f64>())
        .collect::<Result<_, _>>()?;
    assert!(values
        .iter()
        .zip(&clean)
        .all(|(noisy, x)| (noisy - x).abs() <= 0.1 + 1e-12));
    Ok(())
}

#[test]
fn add_noise_rejects_unknown_kind() {
    let recording = sample_path("test_data/pulse_train_50bpm.txt");
    let mut cmd = cargo_bin_cmd!("ecg");
    cmd.args(["add-noise", "--input", recording.as_str(), "--kind", "pink"]);
    let output = cmd.assert().failure().get_output().stderr.clone();
    assert!(String::from_utf8_lossy(&output).contains("unrecognized noise kind"));
}

fn workspace_root() -> PathBuf {
    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    manifest_dir
        .parent()
        .expect("crates dir")
        .parent()
        .expect("workspace root")
        .to_path_buf()
}

fn sample_path(relative: &str) -> String {
    workspace_root()
        .join(relative)
        .to_string_lossy()
        .to_string()
}
