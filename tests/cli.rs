use assert_cmd::Command;
use predicates::prelude::*;

mod common;

fn birka() -> Command {
    let mut cmd = Command::cargo_bin("birka").unwrap();
    cmd.env_remove("BIRKA_PATH_FILTER");
    cmd
}

#[test]
fn runs() {
    birka().assert().success();
}

#[test]
fn outputs_tool_name() {
    let mut cmd = birka();
    cmd.arg("-V");
    cmd.assert()
        .success()
        .stdout(format!("birka {}\n", env!("CARGO_PKG_VERSION")));
}

// Validate subcommand tests

#[test]
fn validate_consistent_batch_succeeds() {
    let mut cmd = birka();
    cmd.args([
        "validate",
        "tests/fixtures/consistent.records.json",
        "--format",
        "json",
    ]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Validation passed"));
}

#[test]
fn validate_reports_duplicate_paths() {
    let mut cmd = birka();
    cmd.args([
        "validate",
        "tests/fixtures/duplicates.records.json",
        "--format",
        "json",
    ]);
    cmd.assert()
        .failure()
        .stdout(predicate::str::contains("DuplicatePath"))
        .stdout(predicate::str::contains("error(s)"));
}

#[test]
fn validate_empty_batch_fails() {
    let mut cmd = birka();
    cmd.args([
        "validate",
        "tests/fixtures/empty.records.json",
        "--format",
        "json",
    ]);
    cmd.assert()
        .failure()
        .stdout(predicate::str::contains("EmptyCollection"));
}

#[test]
fn validate_mismatch_is_a_warning() {
    let mut cmd = birka();
    cmd.args([
        "validate",
        "tests/fixtures/mixed.records.json",
        "--format",
        "json",
    ]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("DtypeMismatch"))
        .stdout(predicate::str::contains("plate1/a3.tif"));
}

#[test]
fn validate_strict_fails_on_warnings() {
    let mut cmd = birka();
    cmd.args([
        "validate",
        "tests/fixtures/mixed.records.json",
        "--format",
        "json",
        "--strict",
    ]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Validation failed"));
}

#[test]
fn validate_json_output_format() {
    let mut cmd = birka();
    cmd.args([
        "validate",
        "tests/fixtures/mixed.records.json",
        "--format",
        "json",
        "--output",
        "json",
    ]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("\"error_count\": 0"))
        .stdout(predicate::str::contains("\"warning_count\": 1"))
        .stdout(predicate::str::contains("\"severity\": \"warning\""));
}

#[test]
fn validate_filter_from_environment() {
    let mut cmd = birka();
    cmd.env("BIRKA_PATH_FILTER", r"plate1/a[12]\.tif");
    cmd.args([
        "validate",
        "tests/fixtures/consistent.records.json",
        "--format",
        "json",
        "--strict",
    ]);
    cmd.assert()
        .failure()
        .stdout(predicate::str::contains("PathFilterMismatch"))
        .stdout(predicate::str::contains("plate1/a3.tif"));
}

#[test]
fn validate_invalid_filter_fails() {
    let mut cmd = birka();
    cmd.args([
        "validate",
        "tests/fixtures/consistent.records.json",
        "--format",
        "json",
        "--filter",
        "plate(",
    ]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Invalid filter pattern"));
}

#[test]
fn validate_nonexistent_file_fails() {
    let mut cmd = birka();
    cmd.args(["validate", "nonexistent_file.json", "--format", "json"]);
    cmd.assert().failure();
}

// Inspect subcommand tests

#[test]
fn inspect_marks_flagged_cells() {
    let mut cmd = birka();
    cmd.args([
        "inspect",
        "tests/fixtures/mixed.records.json",
        "--format",
        "json",
    ]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("uint8*"))
        .stdout(predicate::str::contains("Data type:       uint16"))
        .stdout(predicate::str::contains("Export eligible: yes"));
}

#[test]
fn inspect_json_output() {
    let mut cmd = birka();
    cmd.args([
        "inspect",
        "tests/fixtures/duplicates.records.json",
        "--format",
        "json",
        "--output",
        "json",
    ]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("\"export_eligible\": false"))
        .stdout(predicate::str::contains("\"Path\""));
}

#[test]
fn inspect_reads_image_directories() {
    let dir = tempfile::tempdir().unwrap();
    let plate = dir.path().join("plate");
    common::write_gray_png(&plate.join("a.png"), 4, 4);
    common::write_gray_png(&plate.join("b.png"), 4, 4);
    common::write_gray16_png(&plate.join("c.png"), 4, 4);

    let mut cmd = birka();
    cmd.arg("inspect").arg(&plate);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("plate/a.png"))
        .stdout(predicate::str::contains("uint16*"))
        .stdout(predicate::str::contains("Data type:       uint8"));
}

// Archive subcommand tests

#[test]
fn archive_writes_tarball() {
    let dir = tempfile::tempdir().unwrap();
    let plate = dir.path().join("plate");
    common::write_bmp(&plate.join("a.bmp"), 3, 2);
    common::write_bmp(&plate.join("b.bmp"), 3, 2);
    let out = dir.path().join("plate.tar.gz");

    let mut cmd = birka();
    cmd.arg("archive").arg(&plate).arg("--out").arg(&out);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Archived 2 image(s)"));

    assert!(out.is_file());
}

#[test]
fn archive_refuses_duplicates() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("dup.tar.gz");

    let mut cmd = birka();
    cmd.args([
        "archive",
        "tests/fixtures/duplicates.records.json",
        "--format",
        "json",
        "--out",
    ])
    .arg(&out);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("not eligible"));

    assert!(!out.exists());
}

#[test]
fn archive_rejects_bad_compression_level() {
    let dir = tempfile::tempdir().unwrap();
    let plate = dir.path().join("plate");
    common::write_bmp(&plate.join("a.bmp"), 3, 2);

    let mut cmd = birka();
    cmd.arg("archive")
        .arg(&plate)
        .arg("--out")
        .arg(dir.path().join("out.tar.gz"))
        .args(["--compression-level", "11"]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Invalid compression level 11"));
}
