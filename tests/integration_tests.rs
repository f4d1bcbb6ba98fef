//! Integration tests for the railcast CLI

use std::fs;
use std::process::{Command, Output};

use tempfile::TempDir;

fn railcast(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_railcast"))
        .args(args)
        .env("RUST_LOG", "off")
        .output()
        .expect("Failed to execute command")
}

/// Test that the CLI shows help with explicit help flag
#[test]
fn test_cli_help() {
    let output = railcast(&["--help"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("railcast"));
    assert!(stdout.contains("Train running data collection"));
    for command in ["collect", "fetch-one", "realtime", "merge", "skew", "outliers"] {
        assert!(stdout.contains(command), "missing {command} in help");
    }
}

/// Reversed date ranges are rejected before any download happens
#[test]
fn test_collect_rejects_reversed_range() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("merged.csv");
    let output = railcast(&[
        "collect",
        "2024-06-02",
        "20240601",
        "http://127.0.0.1:9/data_{date}.csv",
        out.to_str().unwrap(),
    ]);

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("start date must be on or before end date"), "{stderr}");
    assert!(!out.exists());
}

/// Invalid dates are reported by the argument parser
#[test]
fn test_collect_rejects_bad_date() {
    let output = railcast(&["collect", "June 1st", "2024-06-02", "http://x/{date}", "out.csv"]);

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Use YYYY-MM-DD or YYYYMMDD"), "{stderr}");
}

/// Unknown placeholders in the template are rejected
#[test]
fn test_collect_rejects_bad_template() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("merged.csv");
    let output = railcast(&[
        "collect",
        "2024-06-01",
        "2024-06-01",
        "http://127.0.0.1:9/{day}.csv",
        out.to_str().unwrap(),
    ]);

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Unknown placeholder"), "{stderr}");
}

/// Merge sorts rows from several files by run date and booked times
#[test]
fn test_merge_command() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("location_RDG_2.csv"),
        "run_date,gbtt_arr,gbtt_dep,train_identity\n2024-06-02,0700,0702,1A02\n",
    )
    .unwrap();
    fs::write(
        dir.path().join("location_RDG_1.csv"),
        "run_date,gbtt_arr,gbtt_dep,train_identity\n2024-06-01,0900,0902,1A03\n2024-06-01,0800,0802,1A01\n",
    )
    .unwrap();
    let out = dir.path().join("all").join("merged.csv");

    let output = railcast(&["merge", dir.path().to_str().unwrap(), "--output", out.to_str().unwrap()]);

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let merged = fs::read_to_string(&out).unwrap();
    let ids: Vec<&str> = merged
        .lines()
        .skip(1)
        .map(|line| line.rsplit(',').next().unwrap())
        .collect();
    assert_eq!(ids, vec!["1A01", "1A03", "1A02"]);
}

/// Skew prints a report for each numeric column
#[test]
fn test_skew_command() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("rdg.csv");
    fs::write(
        &input,
        "train_identity,actual_arr_delay_mins,platform\n1A01,1,9\n1A02,2,9A\n1A03,3,10\n1A04,4,7\n1A05,10,\n",
    )
    .unwrap();

    let output = railcast(&["skew", "--input", input.to_str().unwrap()]);

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("actual_arr_delay_mins, Skew: 1.70"));
    assert!(!stdout.contains("platform, Skew"));
}

/// Outliers writes the flagged service rows as CSV
#[test]
fn test_outliers_command() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("rdg.csv");
    fs::write(
        &input,
        "train_identity,actual_dep_delay_mins\n1A01,0\n1A02,1\n1A03,2\n1A04,1\n1A05,45\n",
    )
    .unwrap();

    let output = railcast(&["outliers", "--input", input.to_str().unwrap(), "--column", "actual_dep_delay_mins"]);

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout, "train_identity,actual_dep_delay_mins\n1A05,45\n");
}

/// Unknown columns fail with exit status 2
#[test]
fn test_outliers_unknown_column() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("rdg.csv");
    fs::write(&input, "train_identity,delay\n1A01,0\n").unwrap();

    let output = railcast(&["outliers", "--input", input.to_str().unwrap(), "--column", "nope"]);

    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Unknown column: nope"));
}

/// A non-positive fence multiplier is rejected instead of flagging every row
#[test]
fn test_outliers_rejects_negative_multiplier() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("rdg.csv");
    fs::write(&input, "train_identity,d\nA,0\nB,1\nC,2\nD,1\nE,45\n").unwrap();

    let output = railcast(&["outliers", "--input", input.to_str().unwrap(), "--column", "d", "--multiplier=-1"]);

    assert_eq!(output.status.code(), Some(2));
    assert!(output.stdout.is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Whisker multiplier must be a positive number"));
}

/// Oversized bin counts fail with a message rather than aborting
#[test]
fn test_skew_rejects_huge_bin_count() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("rdg.csv");
    fs::write(&input, "d\n1\n2\n3\n").unwrap();

    let output = railcast(&["skew", "--input", input.to_str().unwrap(), "--bins", "100000000000000"]);

    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Error: Invalid input: Histogram bins cannot exceed 200"));
}
