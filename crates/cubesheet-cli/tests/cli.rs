//! Integration tests for the cubesheet binary.
//!
//! Inputs are pasted text and pre-parsed JSON, so pdftotext is not needed.

use assert_cmd::Command;
use calamine::{Data, Reader, Xlsx};
use predicates::prelude::*;
use std::path::{Path, PathBuf};

const REPORT: &str = "Material Tech Company Limited
TEST REPORT
Report No.: 04428CU763515
Pour Location: 23/F-25/F Zone 2
Core wall and slab
Date Cast: 01-Aug-2025
CU058493 20250801-60D-6A 60/20D PFA 200 / 230 100.1 x 100.2 x 100.2 2.413 2400 795.6 79.2 S -
CU058494 20250801-60D-6B 60/20D PFA 200 / 230 100.0 x 100.1 x 100.2 2.410 2400 788.1 78.7 S -
CU058595 20250802-45DWP- 45/20 PFA+WP 150 / 160 100.0 x 100.0 x 100.1 2.380 2380 609.2 60.7 S -
1A
";

const RECORDS_JSON: &str = r#"[
  {
    "mark_prefix": "20250801-60D-",
    "mark_number": "6",
    "mark_suffix": "A",
    "report_number": "R1",
    "date_cast": "01-Aug-2025",
    "pour_location": "Zone 2",
    "compressive_strength": "79.2"
  },
  {
    "mark_prefix": "20250801-60D-",
    "mark_number": "6",
    "mark_suffix": "A",
    "report_number": "R1",
    "date_cast": "31-Feb-2025",
    "pour_location": "Zone 2",
    "compressive_strength": ""
  }
]"#;

fn cmd() -> Command {
    let mut cmd = Command::cargo_bin("cubesheet").unwrap();
    cmd.env_remove("RUST_LOG");
    cmd
}

fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

#[test]
fn parse_text_prints_table() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_file(dir.path(), "report.txt", REPORT);

    cmd()
        .args(["parse", input.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("20250801-60D-"))
        .stdout(predicate::str::contains("20250802-45DWP-"))
        .stdout(predicate::str::contains("report=04428CU763515"))
        .stdout(predicate::str::contains("3 cube record(s)"));
}

#[test]
fn parse_json_output_with_trace() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_file(dir.path(), "report.txt", REPORT);

    let output = cmd()
        .args(["parse", input.to_str().unwrap(), "-o", "json", "--trace"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let records = json["records"].as_array().unwrap();
    assert_eq!(records.len(), 3);
    assert_eq!(records[2]["mark_number"], "1");
    assert_eq!(records[2]["pour_location"], "23/F-25/F Zone 2 Core wall and slab");
    assert_eq!(json["trace"]["trace_schema_version"], "1.0");
    assert!(!json["trace"]["entries"].as_array().unwrap().is_empty());
}

#[test]
fn parse_without_trace_omits_it() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_file(dir.path(), "report.txt", REPORT);

    let output = cmd()
        .args(["parse", input.to_str().unwrap(), "-o", "json"])
        .output()
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert!(json.get("trace").is_none());
}

#[test]
fn parse_text_without_records_fails() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_file(dir.path(), "empty.txt", "TEST REPORT\nReport No.: X1\n");

    cmd()
        .args(["parse", input.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no cube data extracted"));
}

#[test]
fn process_writes_workbook_and_log() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_file(dir.path(), "report.txt", REPORT);
    let out_dir = dir.path().join("out");
    let output = out_dir.join("report.xlsx");

    cmd()
        .args([
            "process",
            input.to_str().unwrap(),
            output.to_str().unwrap(),
            "--validate",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Processed 3 cube record(s)"));

    let mut wb: Xlsx<_> = calamine::open_workbook(&output).unwrap();
    assert_eq!(wb.sheet_names(), vec!["Raw", "45D", "60D", "45DWP", "60DWP"]);
    let sixty = wb.worksheet_range("60D").unwrap();
    assert_eq!(sixty.height(), 3);
    assert_eq!(
        sixty.get_value((1, 0)),
        Some(&Data::String("20250801-60D-".into()))
    );

    let log = std::fs::read_to_string(out_dir.join("cube_automation.log")).unwrap();
    assert!(log.contains("Extracted 3 cube record(s)"));
    assert!(log.contains("Total cubes: 3"));
    assert!(!log.contains("\x1b["));
}

#[test]
fn process_csv_output() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_file(dir.path(), "report.txt", REPORT);
    let output = dir.path().join("report.csv");
    let log = dir.path().join("logs/run.log");

    cmd()
        .args([
            "process",
            input.to_str().unwrap(),
            output.to_str().unwrap(),
            "--log-file",
            log.to_str().unwrap(),
        ])
        .assert()
        .success();

    let csv = std::fs::read_to_string(&output).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(
        lines[0],
        "20250801-60D-|6|A|04428CU763515|01-Aug-2025|79.2|23/F-25/F Zone 2 Core wall and slab"
    );
    assert!(log.exists());
}

#[test]
fn process_json_records() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_file(dir.path(), "records.json", RECORDS_JSON);
    let output = dir.path().join("records.xlsx");

    cmd()
        .args(["process", input.to_str().unwrap(), output.to_str().unwrap()])
        .assert()
        .success();
    assert!(output.exists());
}

#[test]
fn process_missing_input_fails() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("out.xlsx");

    cmd()
        .args([
            "process",
            dir.path().join("nope.pdf").to_str().unwrap(),
            output.to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("input not found"));
    assert!(!output.exists());
}

#[test]
fn process_unsupported_input_fails() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_file(dir.path(), "report.docx", "x");

    cmd()
        .args([
            "process",
            input.to_str().unwrap(),
            dir.path().join("out.xlsx").to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unsupported input"));
}

#[test]
fn batch_with_only_unreadable_pdfs_fails() {
    let dir = tempfile::tempdir().unwrap();
    let folder = dir.path().join("in");
    std::fs::create_dir(&folder).unwrap();
    write_file(&folder, "broken.pdf", "not a pdf");
    let out_dir = dir.path().join("out");

    cmd()
        .args([
            "process",
            "--folder",
            folder.to_str().unwrap(),
            "--output-dir",
            out_dir.to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("all 1 document(s) failed"));
    assert!(out_dir.join("cube_automation.log").exists());
    assert!(!out_dir.join("broken_processed.xlsx").exists());
}

#[test]
fn batch_with_empty_folder_fails() {
    let dir = tempfile::tempdir().unwrap();

    cmd()
        .args([
            "process",
            "--folder",
            dir.path().to_str().unwrap(),
            "--output-dir",
            dir.path().join("out").to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no PDF files found"));
}

#[test]
fn folder_requires_output_dir() {
    cmd()
        .args(["process", "--folder", "somewhere"])
        .assert()
        .failure();
}

#[test]
fn validate_reports_issues_as_json() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_file(dir.path(), "records.json", RECORDS_JSON);

    let output = cmd()
        .args(["validate", input.to_str().unwrap(), "-o", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["errors"][0]["kind"], "missing_field");
    assert_eq!(json["errors"][0]["field"], "compressive_strength");
    let kinds: Vec<&str> = json["warnings"]
        .as_array()
        .unwrap()
        .iter()
        .map(|w| w["kind"].as_str().unwrap())
        .collect();
    assert!(kinds.contains(&"duplicate_mark"));
    assert!(kinds.contains(&"invalid_date"));
    assert_eq!(json["stats"]["total_cubes"], 2);
}

#[test]
fn validate_table_output() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_file(dir.path(), "report.txt", REPORT);

    cmd()
        .args(["validate", input.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Total cubes: 3"))
        .stdout(predicate::str::contains("No issues found."));
}

#[test]
fn config_show_prints_defaults() {
    cmd()
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"raw_sheet\": \"Raw\""))
        .stdout(predicate::str::contains("\"60DWP\""));
}

#[test]
fn config_validate_rejects_bad_range() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_file(
        dir.path(),
        "bad.json",
        r#"{
            "raw_sheet": "Raw",
            "headers": ["a", "b", "c", "d", "e", "f", "g"],
            "concrete_types": ["45D"],
            "min_strength": "90",
            "max_strength": "20",
            "pour_location_column": "G",
            "merge_columns": ["A"]
        }"#,
    );

    cmd()
        .args(["config", "validate", file.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("min_strength"));
}

#[test]
fn config_validate_accepts_good_file() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_file(
        dir.path(),
        "good.json",
        r#"{
            "raw_sheet": "All",
            "headers": ["a", "b", "c", "d", "e", "f", "g"],
            "concrete_types": ["45D", "60D"],
            "min_strength": "20",
            "max_strength": "90",
            "pour_location_column": "G",
            "merge_columns": ["A", "B"]
        }"#,
    );

    cmd()
        .args(["config", "validate", file.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("is valid"));
}
