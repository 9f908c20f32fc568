use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;

fn fileconv_cmd(dir: &tempfile::TempDir) -> Command {
    let mut cmd = Command::cargo_bin("fileconv").expect("binary exists");
    // Keep the rotating log inside the test sandbox and make sure no ambient
    // credential leaks into the subprocess.
    cmd.current_dir(dir.path())
        .env("FILECONV_LOG_DIR", dir.path())
        .env_remove("OPENAI_API_KEY")
        .env("OPENAI_API_BASE", "http://127.0.0.1:1");
    cmd
}

#[test]
fn inspect_previews_a_csv_file() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("people.csv");
    fs::write(&input, "name,age\nalice,30\nbob,25\ncarol,41\n").unwrap();

    fileconv_cmd(&dir)
        .arg("inspect")
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("people.csv [csv]"))
        .stdout(predicate::str::contains("table: 3 rows x 2 columns"))
        .stdout(predicate::str::contains("alice | 30"));
}

#[test]
fn inspect_reports_decode_errors_without_failing_siblings() {
    let dir = tempfile::tempdir().unwrap();
    let broken = dir.path().join("broken.pdf");
    fs::write(&broken, "%PDF-1.4 not a pdf").unwrap();
    let fine = dir.path().join("fine.txt");
    fs::write(&fine, "hello").unwrap();

    fileconv_cmd(&dir)
        .arg("inspect")
        .arg(&broken)
        .arg(&fine)
        .assert()
        .success()
        .stdout(predicate::str::contains("error:"))
        .stdout(predicate::str::contains("hello"));
}

#[test]
fn convert_writes_derived_output_filename() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("people.csv");
    fs::write(&input, "name,age\nalice,30\nbob,25\n").unwrap();
    let out = tempfile::tempdir().unwrap();

    fileconv_cmd(&dir)
        .arg("convert")
        .arg(&input)
        .arg("--to")
        .arg("json")
        .arg("--out-dir")
        .arg(out.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("people_converted.json"));

    let written = fs::read(out.path().join("people_converted.json")).unwrap();
    let value: serde_json::Value = serde_json::from_slice(&written).unwrap();
    assert_eq!(value[0]["name"], serde_json::Value::from("alice"));
}

#[test]
fn convert_rejects_unsupported_target() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("notes.txt");
    fs::write(&input, "text").unwrap();

    fileconv_cmd(&dir)
        .arg("convert")
        .arg(&input)
        .arg("--to")
        .arg("gif")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unsupported target format"));
}

#[test]
fn convert_exits_nonzero_when_a_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let broken = dir.path().join("broken.pdf");
    fs::write(&broken, "%PDF-1.4 not a pdf").unwrap();
    let fine = dir.path().join("fine.txt");
    fs::write(&fine, "hello").unwrap();
    let out = tempfile::tempdir().unwrap();

    fileconv_cmd(&dir)
        .arg("convert")
        .arg(&broken)
        .arg(&fine)
        .arg("--to")
        .arg("txt")
        .arg("--out-dir")
        .arg(out.path())
        .assert()
        .failure()
        .stdout(predicate::str::contains("fine_converted.txt"));

    // The healthy sibling was still written.
    assert!(out.path().join("fine_converted.txt").exists());
}

#[test]
fn convert_exits_nonzero_for_nonexistent_input() {
    let dir = tempfile::tempdir().unwrap();

    fileconv_cmd(&dir)
        .arg("convert")
        .arg(dir.path().join("missing.csv"))
        .arg("--to")
        .arg("json")
        .assert()
        .failure()
        .stdout(predicate::str::contains("missing.csv"))
        .stderr(predicate::str::contains("1 of 1 conversions failed"));
}

#[test]
fn convert_counts_unreadable_inputs_alongside_converted_siblings() {
    let dir = tempfile::tempdir().unwrap();
    let fine = dir.path().join("fine.txt");
    fs::write(&fine, "hello").unwrap();
    let out = tempfile::tempdir().unwrap();

    fileconv_cmd(&dir)
        .arg("convert")
        .arg(dir.path().join("missing.csv"))
        .arg(&fine)
        .arg("--to")
        .arg("txt")
        .arg("--out-dir")
        .arg(out.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("1 of 2 conversions failed"));

    assert!(out.path().join("fine_converted.txt").exists());
}

#[test]
fn inspect_exits_nonzero_for_nonexistent_input() {
    let dir = tempfile::tempdir().unwrap();
    let fine = dir.path().join("fine.txt");
    fs::write(&fine, "hello").unwrap();

    fileconv_cmd(&dir)
        .arg("inspect")
        .arg(dir.path().join("missing.csv"))
        .arg(&fine)
        .assert()
        .failure()
        .stdout(predicate::str::contains("hello"))
        .stderr(predicate::str::contains("could not be read"));
}

#[test]
fn summarize_without_credential_reports_absence_not_error() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("essay.txt");
    fs::write(&input, "a body of text that could be summarised").unwrap();

    fileconv_cmd(&dir)
        .arg("summarize")
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("No summary available."));
}

#[test]
fn summarize_with_bad_credential_still_reports_absence() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("essay.txt");
    fs::write(&input, "a body of text that could be summarised").unwrap();

    // Unreachable endpoint plus a bogus key: the failure is swallowed.
    fileconv_cmd(&dir)
        .env("OPENAI_API_KEY", "sk-invalid")
        .arg("summarize")
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("No summary available."));
}
