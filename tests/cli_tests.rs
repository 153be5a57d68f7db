//! Integration tests for the CLI application
//!
//! These tests run the compiled binary against real CSV files and artifact
//! directories.

use std::io::Write;
use std::process::{Command, Output, Stdio};
use tempfile::{NamedTempFile, TempDir};

/// Helper to create a labeled CSV dataset
struct TestData {
    pub csv_file: NamedTempFile,
}

impl TestData {
    fn new() -> std::io::Result<Self> {
        let mut csv_file = NamedTempFile::with_suffix(".csv")?;
        writeln!(csv_file, ",label,text,label_num")?;
        let rows = [
            ("spam", "\"Subject: WIN a FREE prize!!! claim your cash now\"", 1),
            ("ham", "\"Subject: meeting agenda attached, see you Monday\"", 0),
            ("spam", "\"Subject: free money offer, click http://x.example\"", 1),
            ("ham", "\"Subject: project report for review\"", 0),
            ("spam", "\"Subject: cheap meds, huge discount, free shipping\"", 1),
            ("ham", "\"Subject: gas nominations for December, attached\"", 0),
            ("spam", "\"Subject: you won a cash prize, claim reward\"", 1),
            ("ham", "\"Subject: lunch to discuss the project schedule\"", 0),
            ("spam", "\"Subject: exclusive offer, free gift card\"", 1),
            ("ham", "\"Subject: minutes from the planning meeting\"", 0),
        ];
        for (i, (label, text, label_num)) in rows.iter().enumerate() {
            writeln!(csv_file, "{i},{label},{text},{label_num}")?;
        }
        csv_file.flush()?;
        Ok(TestData { csv_file })
    }
}

fn spamham() -> Command {
    Command::new(env!("CARGO_BIN_EXE_spamham"))
}

fn train_into(data: &TestData, dir: &TempDir) -> Output {
    spamham()
        .args([
            "train",
            "--data",
            data.csv_file.path().to_str().unwrap(),
            "--output",
            dir.path().to_str().unwrap(),
        ])
        .output()
        .expect("Failed to run CLI train command")
}

#[test]
fn test_cli_train_command() {
    let data = TestData::new().expect("Failed to create test data");
    let dir = TempDir::new().expect("Failed to create temp dir");

    let output = train_into(&data, &dir);
    assert!(
        output.status.success(),
        "Train command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(dir.path().join("model.json").exists());
    assert!(dir.path().join("vectorizer.json").exists());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Run ID"));
    assert!(stdout.contains("Test Accuracy"));
}

#[test]
fn test_cli_train_with_parameters() {
    let data = TestData::new().expect("Failed to create test data");
    let dir = TempDir::new().expect("Failed to create temp dir");

    let output = spamham()
        .args([
            "train",
            "--data",
            data.csv_file.path().to_str().unwrap(),
            "--output",
            dir.path().to_str().unwrap(),
            "--max-features",
            "20",
            "--test-size",
            "0.3",
            "--seed",
            "11",
            "-C",
            "2.0",
            "--max-iterations",
            "200",
        ])
        .output()
        .expect("Failed to run CLI train command");

    assert!(
        output.status.success(),
        "Train command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

#[test]
fn test_cli_predict_texts() {
    let data = TestData::new().expect("Failed to create test data");
    let dir = TempDir::new().expect("Failed to create temp dir");
    assert!(train_into(&data, &dir).status.success());

    let output = spamham()
        .args([
            "predict",
            "--model",
            dir.path().to_str().unwrap(),
            "--text",
            "free cash prize, claim now",
            "--text",
            "agenda for the project meeting",
        ])
        .output()
        .expect("Failed to run CLI predict command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 2);
    for line in lines {
        let value: serde_json::Value = serde_json::from_str(line).unwrap();
        let label = value["prediction"].as_str().unwrap();
        assert!(label == "spam" || label == "ham");
    }
}

#[test]
fn test_cli_predict_with_probability() {
    let data = TestData::new().expect("Failed to create test data");
    let dir = TempDir::new().expect("Failed to create temp dir");
    assert!(train_into(&data, &dir).status.success());

    let output = spamham()
        .args([
            "predict",
            "--model",
            dir.path().to_str().unwrap(),
            "--probability",
            "--text",
            "free cash prize, claim now",
        ])
        .output()
        .expect("Failed to run CLI predict command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let value: serde_json::Value = serde_json::from_str(stdout.trim()).unwrap();
    let p = value["spam_probability"].as_f64().unwrap();
    let confidence = value["confidence"].as_f64().unwrap();
    assert!((0.5..=1.0).contains(&confidence));
    let expected = if value["prediction"] == "spam" { p } else { 1.0 - p };
    assert_eq!(confidence, expected);
}

#[test]
fn test_cli_predict_stdin_skips_empty_lines() {
    let data = TestData::new().expect("Failed to create test data");
    let dir = TempDir::new().expect("Failed to create temp dir");
    assert!(train_into(&data, &dir).status.success());

    let mut child = spamham()
        .args(["predict", "--model", dir.path().to_str().unwrap()])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to spawn CLI predict command");

    child
        .stdin
        .take()
        .unwrap()
        .write_all(b"free prize\n\n   \nmeeting agenda\n")
        .unwrap();
    let output = child.wait_with_output().unwrap();

    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout).lines().count(), 2);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(stderr.matches("client error").count(), 2);
}

#[test]
fn test_cli_evaluate_reproduces_accuracy() {
    let data = TestData::new().expect("Failed to create test data");
    let dir = TempDir::new().expect("Failed to create temp dir");
    assert!(train_into(&data, &dir).status.success());

    let output = spamham()
        .args([
            "evaluate",
            "--model",
            dir.path().to_str().unwrap(),
            "--data",
            data.csv_file.path().to_str().unwrap(),
            "--detailed",
        ])
        .output()
        .expect("Failed to run CLI evaluate command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Reproduced: yes"));
    assert!(stdout.contains("F1 Score"));
}

#[test]
fn test_cli_info_command() {
    let data = TestData::new().expect("Failed to create test data");
    let dir = TempDir::new().expect("Failed to create temp dir");
    assert!(train_into(&data, &dir).status.success());

    let output = spamham()
        .args(["info", dir.path().to_str().unwrap()])
        .output()
        .expect("Failed to run CLI info command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Spam/Ham Model Summary"));
    assert!(stdout.contains("Vocabulary Size"));
    assert!(stdout.contains("Format Version: 1"));
}

#[test]
fn test_cli_error_handling() {
    // Nonexistent dataset
    let dir = TempDir::new().expect("Failed to create temp dir");
    let output = spamham()
        .args([
            "train",
            "--data",
            "/nonexistent/emails.csv",
            "--output",
            dir.path().to_str().unwrap(),
        ])
        .output()
        .expect("Failed to run CLI");
    assert!(!output.status.success());

    // Directory without artifacts
    let output = spamham()
        .args(["predict", "--model", dir.path().to_str().unwrap(), "--text", "hi"])
        .output()
        .expect("Failed to run CLI");
    assert!(!output.status.success());

    // Dataset without the required label column
    let mut bad = NamedTempFile::with_suffix(".csv").unwrap();
    writeln!(bad, "text,label").unwrap();
    writeln!(bad, "hello,ham").unwrap();
    bad.flush().unwrap();
    let output = spamham()
        .args([
            "train",
            "--data",
            bad.path().to_str().unwrap(),
            "--output",
            dir.path().to_str().unwrap(),
        ])
        .output()
        .expect("Failed to run CLI");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("label_num"));
}

#[test]
fn test_cli_help() {
    let output = spamham().arg("--help").output().expect("Failed to run CLI");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for command in ["train", "predict", "evaluate", "info"] {
        assert!(stdout.contains(command));
    }
}
