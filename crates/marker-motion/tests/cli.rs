mod common;

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;

fn cli() -> Command {
    Command::cargo_bin("marker-motion").expect("binary")
}

#[test]
fn writes_motion_csv() {
    let calib = tempfile::tempdir().expect("tempdir");
    let seq = tempfile::tempdir().expect("tempdir");
    common::write_calibration(calib.path());
    common::write_sequence(seq.path(), 2);
    let output = seq.path().join("motion.csv");

    cli()
        .arg(calib.path())
        .arg(seq.path())
        .arg(&output)
        .args(["--log-level", "info"])
        .assert()
        .success()
        .stderr(predicate::str::contains("finished writing results"));

    let text = fs::read_to_string(&output).expect("read result");
    assert_eq!(text.lines().count(), 4);
    for line in text.lines() {
        let fields: Vec<&str> = line.split(',').collect();
        assert_eq!(fields.len(), 5, "{line}");
        for value in &fields[2..] {
            let v: f64 = value.parse().expect("number");
            assert!(v.abs() < 1e-6, "{line}");
        }
    }
}

#[test]
fn reads_json_config() {
    let calib = tempfile::tempdir().expect("tempdir");
    let seq = tempfile::tempdir().expect("tempdir");
    common::write_calibration(calib.path());
    common::write_sequence(seq.path(), 1);
    fs::rename(seq.path().join("markers2.csv"), seq.path().join("right.csv")).expect("rename");
    let config = seq.path().join("run.json");
    fs::write(&config, r#"{ "sequence": { "markers_b": "right.csv" } }"#).expect("write");
    let output = seq.path().join("motion.csv");

    cli()
        .arg(calib.path())
        .arg(seq.path())
        .arg(&output)
        .arg("--config")
        .arg(&config)
        .args(["--log-level", "off"])
        .assert()
        .success();
    assert!(output.exists());
}

#[test]
fn missing_calibration_fails_with_message() {
    let calib = tempfile::tempdir().expect("tempdir");
    let seq = tempfile::tempdir().expect("tempdir");
    common::write_sequence(seq.path(), 1);
    let output = seq.path().join("motion.csv");

    cli()
        .arg(calib.path())
        .arg(seq.path())
        .arg(&output)
        .assert()
        .failure()
        .stderr(predicate::str::contains("error:").and(predicate::str::contains("K1.csv")));
    assert!(!output.exists());
}

#[test]
fn wrong_argument_count_is_a_usage_error() {
    cli().arg("only-one").assert().failure().stderr(predicate::str::contains("Usage"));
}
