//! Runs the `lekha` binary against replayed passes.

use std::fs;
use std::process::Command;

use tempfile::TempDir;

const PASSES: &str = r#"{
  "passes": {
    "Standard": { "output": { "text": "D.L. No: 03-066-041605\nName: RAM BAHADUR THAPA\nD.O.I: 15-01-2020 D.O.E: 14-01-2030", "confidence": 90.0 } },
    "Precise": { "error": "engine crashed" }
  }
}"#;

fn lekha(dir: &TempDir) -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_lekha"));
    command.current_dir(dir.path()).env_remove("RUST_LOG");
    command
}

#[test]
fn test_catalog_prints_default_entries() {
    let dir = TempDir::new().unwrap();
    let output = lekha(&dir).arg("catalog").output().expect("Failed to run lekha");
    assert!(output.status.success());

    let catalog: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let names: Vec<&str> = catalog
        .as_array()
        .unwrap()
        .iter()
        .map(|entry| entry["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Standard", "Precise"]);
}

#[test]
fn test_extract_replay_then_validate_round_trip() {
    let dir = TempDir::new().unwrap();
    let passes = dir.path().join("card.passes.json");
    fs::write(&passes, PASSES).unwrap();

    let output = lekha(&dir)
        .args(["extract", "--replay"])
        .arg(&passes)
        .output()
        .expect("Failed to run lekha");
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let outcome: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(outcome["status"], "completed");
    let record = &outcome["value"]["record"];
    assert_eq!(record["fields"]["license_number"]["value"], "03-066-041605");
    assert_eq!(record["failed_passes"][0], "Precise");

    let stored = dir.path().join("result.json");
    fs::write(&stored, &output.stdout).unwrap();
    let output = lekha(&dir).arg("validate").arg(&stored).output().expect("Failed to run lekha");
    assert!(output.status.success(), "stdout: {}", String::from_utf8_lossy(&output.stdout));
}

#[test]
fn test_validate_reports_invalid_record() {
    let dir = TempDir::new().unwrap();
    let record = dir.path().join("record.json");
    fs::write(
        &record,
        r#"{"fields": {"license_number": {"value": "03066041605", "confidence": 1.0}}}"#,
    )
    .unwrap();

    let output = lekha(&dir)
        .args(["validate", "--format", "text"])
        .arg(&record)
        .output()
        .expect("Failed to run lekha");
    assert_eq!(output.status.code(), Some(2));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("suggestion [license_number]: 03-066-041605"), "{stdout}");
    assert!(stdout.contains("Valid: no"));
}

#[test]
fn test_extract_without_engine_or_image_fails() {
    let dir = TempDir::new().unwrap();
    let output = lekha(&dir).arg("extract").output().expect("Failed to run lekha");
    assert!(!output.status.success());
}
