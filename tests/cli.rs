//! End-to-end tests for the pdf2dicom binary.

use assert_cmd::Command;
use pdf2dicom::models::metadata::read_summary;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const PDF: &[u8] = b"%PDF-1.4\n1 0 obj\n<<>>\nendobj\n%%EOF\n";

fn cli() -> Command {
    Command::new(env!("CARGO_BIN_EXE_pdf2dicom"))
}

fn write_pdf(dir: &Path, name: &str) -> String {
    let path = dir.join(name);
    fs::write(&path, PDF).unwrap();
    path.to_string_lossy().into_owned()
}

fn batch_report(output: &[u8]) -> serde_json::Value {
    serde_json::from_slice(output).expect("stdout should be a single JSON report")
}

#[test]
fn single_pdf_uses_todays_date() {
    let dir = TempDir::new().unwrap();
    let pdf = write_pdf(dir.path(), "report.pdf");
    let output = dir.path().join("dicom/report.dcm");
    let today = chrono::Local::now().format("%Y%m%d").to_string();

    cli()
        .arg(&pdf)
        .arg(&output)
        .args(["DOE^JANE", "123", "ACC1"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("OK:"))
        .stdout(predicate::str::contains("report.dcm"));

    assert!(output.exists());
    let summary = read_summary(&output).unwrap();
    assert_eq!(summary.study_date.as_deref(), Some(today.as_str()));
    assert_eq!(summary.patient_name.as_deref(), Some("DOE^JANE"));
    assert_eq!(summary.series_number, Some(1));
}

#[test]
fn single_pdf_with_explicit_study_date() {
    let dir = TempDir::new().unwrap();
    let pdf = write_pdf(dir.path(), "report.pdf");
    let output = dir.path().join("report.dcm");

    cli()
        .arg(&pdf)
        .arg(&output)
        .args(["DOE^JANE", "123", "ACCESSION-NUMBER-0042", "20240115"])
        .assert()
        .success();

    let summary = read_summary(&output).unwrap();
    assert_eq!(summary.study_date.as_deref(), Some("20240115"));
    assert_eq!(summary.study_id.as_deref(), Some("ACCESSION-NUMBER"));
    assert_eq!(summary.accession_number.as_deref(), Some("ACCESSION-NUMBER-0042"));
}

#[test]
fn missing_pdf_fails_without_output() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nowhere.pdf");
    let output = dir.path().join("out.dcm");

    cli()
        .arg(&missing)
        .arg(&output)
        .args(["DOE^JANE", "123", "ACC1"])
        .assert()
        .failure()
        .stdout(predicate::str::starts_with("ERROR:"))
        .stdout(predicate::str::contains("nowhere.pdf"));

    assert!(!output.exists());
}

#[test]
fn batch_with_one_malformed_entry() {
    let dir = TempDir::new().unwrap();
    let first = write_pdf(dir.path(), "main.pdf");
    let third = write_pdf(dir.path(), "annex.pdf");
    let out = dir.path().join("dicom");

    let config = serde_json::json!({
        "patient_name": "DOE^JANE",
        "patient_id": "123",
        "accession_number": "ACC1",
        "study_instance_uid": "1.2.826.0.1.3680043.2.1125.42",
        "pdfs": [
            {"input": first, "output": out.join("1.dcm"), "description": "Main Report"},
            {"output": out.join("2.dcm")},
            {"input": third, "output": out.join("3.dcm")}
        ]
    });
    let config_path = dir.path().join("batch.json");
    fs::write(&config_path, config.to_string()).unwrap();

    let assert = cli().arg("--batch").arg(&config_path).assert().failure().code(1);
    let report = batch_report(&assert.get_output().stdout);

    assert_eq!(report["success"], false);
    assert_eq!(report["total"], 3);
    assert_eq!(report["exitosos"], 2);
    assert_eq!(report["errores"], 1);
    assert_eq!(report["study_instance_uid"], "1.2.826.0.1.3680043.2.1125.42");

    let results = report["results"].as_array().unwrap();
    assert_eq!(results[1]["success"], false);
    assert_eq!(results[1]["error"], "missing input or output path");
    assert!(!out.join("2.dcm").exists());
    assert_eq!(results[2]["description"], "Document 3");

    for index in [0usize, 2] {
        assert_eq!(results[index]["study_uid"], "1.2.826.0.1.3680043.2.1125.42");
    }
    assert_ne!(results[0]["series_uid"], results[2]["series_uid"]);

    let third_summary = read_summary(&out.join("3.dcm")).unwrap();
    assert_eq!(third_summary.series_number, Some(3));
}

#[test]
fn successful_batch_exits_zero_and_logs() {
    let dir = TempDir::new().unwrap();
    let pdf = write_pdf(dir.path(), "main.pdf");
    let log_file = dir.path().join("logs.csv");
    let config = serde_json::json!({
        "patient_name": "DOE^JANE",
        "patient_id": "123",
        "accession_number": "ACC1",
        "pdfs": [{"input": pdf, "output": dir.path().join("out/1.dcm")}]
    });
    let config_path = dir.path().join("batch.json");
    fs::write(&config_path, config.to_string()).unwrap();

    let assert = cli()
        .arg("--batch")
        .arg(&config_path)
        .arg("--log-file")
        .arg(&log_file)
        .assert()
        .success();
    let report = batch_report(&assert.get_output().stdout);
    assert_eq!(report["success"], true);
    assert_eq!(report["exitosos"], 1);

    let log = fs::read_to_string(&log_file).unwrap();
    assert_eq!(log.lines().count(), 2);
    assert!(log.lines().nth(1).unwrap().contains(",ok,"));
}

#[test]
fn malformed_config_reports_failure() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("batch.json");
    fs::write(&config_path, "{ \"pdfs\": [").unwrap();

    let assert = cli().arg("--batch").arg(&config_path).assert().failure();
    let report = batch_report(&assert.get_output().stdout);
    assert_eq!(report["success"], false);
    assert!(report["error"]
        .as_str()
        .unwrap()
        .starts_with("Error reading config"));
    assert_eq!(report["results"].as_array().unwrap().len(), 0);
}

#[test]
fn scan_output_feeds_batch_mode() {
    let dir = TempDir::new().unwrap();
    let reports = dir.path().join("reports");
    fs::create_dir_all(&reports).unwrap();
    write_pdf(&reports, "informe.pdf");
    write_pdf(&reports, "anexo.pdf");

    let assert = cli()
        .arg("scan")
        .arg(&reports)
        .arg("--output-root")
        .arg(dir.path().join("dicom"))
        .args(["--patient-name", "DOE JANE", "--patient-id", "123", "--accession", "ACC7"])
        .assert()
        .success();
    let plan = assert.get_output().stdout.clone();
    let config: serde_json::Value = serde_json::from_slice(&plan).unwrap();
    assert_eq!(config["patient_name"], "DOE^JANE");
    assert_eq!(config["pdfs"].as_array().unwrap().len(), 2);

    let config_path = dir.path().join("planned.json");
    fs::write(&config_path, &plan).unwrap();
    cli().arg("--batch").arg(&config_path).assert().success();

    assert!(dir.path().join("dicom/ACC7/ACC7_123_anexo.dcm").exists());
    assert!(dir.path().join("dicom/ACC7/ACC7_123_informe.dcm").exists());
}
