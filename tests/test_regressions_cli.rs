use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

use tempfile::tempdir;

fn bin() -> &'static str {
    env!("CARGO_BIN_EXE_ecsview")
}

fn write_file(path: &Path, content: &str) {
    fs::write(path, content).expect("failed to write test file");
}

const LOG: &str = concat!(
    r#"{"@timestamp":"2021-01-19T22:51:12.142Z","log.level":"info","message":"listening","ecs.version":"1.5.0"}"#,
    "\n",
    r#"{"@timestamp":"2021-01-19T22:51:13.000Z","log.level":"error","message":"request failed","ecs.version":"1.5.0","http":{"response":{"status_code":503}}}"#,
    "\n",
    "not an ecs line\n",
);

#[test]
fn test_renders_a_log_file() {
    let dir = tempdir().expect("temp dir");
    let file = dir.path().join("app.log");
    write_file(&file, LOG);

    let output = Command::new(bin())
        .env("HOME", "/nonexistent")
        .arg(&file)
        .output()
        .expect("command should run");

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("[2021-01-19T22:51:12.142Z]  INFO: listening"));
    assert!(stdout.contains("[2021-01-19T22:51:13.000Z] ERROR: request failed"));
    assert!(stdout.contains("not an ecs line"));
}

#[test]
fn test_level_filter() {
    let dir = tempdir().expect("temp dir");
    let file = dir.path().join("app.log");
    write_file(&file, LOG);

    let output = Command::new(bin())
        .env("HOME", "/nonexistent")
        .args(["--level", "warn", "--strict"])
        .arg(&file)
        .output()
        .expect("command should run");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(!stdout.contains("listening"));
    assert!(stdout.contains("request failed"));
    assert!(!stdout.contains("not an ecs line"));
}

#[test]
fn test_kql_filter() {
    let dir = tempdir().expect("temp dir");
    let file = dir.path().join("app.log");
    write_file(&file, LOG);

    let output = Command::new(bin())
        .env("HOME", "/nonexistent")
        .args(["-k", "http.response.status_code >= 500", "--strict"])
        .arg(&file)
        .output()
        .expect("command should run");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(!stdout.contains("listening"));
    assert!(stdout.contains("request failed"));
}

#[test]
fn test_invalid_kql_fails_with_caret_context() {
    let output = Command::new(bin())
        .env("HOME", "/nonexistent")
        .args(["-k", "foo:bar <", "/dev/null"])
        .output()
        .expect("command should run");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("expect 'and', 'or', or ')'; got <"));
    assert!(stderr.contains("........^"));
}

#[test]
fn test_ecs_format_passes_records_through() {
    let dir = tempdir().expect("temp dir");
    let file = dir.path().join("app.log");
    write_file(&file, LOG);

    let output = Command::new(bin())
        .env("HOME", "/nonexistent")
        .args(["-f", "ecs"])
        .arg(&file)
        .output()
        .expect("command should run");

    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), LOG);
}

#[test]
fn test_reads_stdin_when_no_files_given() {
    let mut child = Command::new(bin())
        .args(["-f", "simple"])
        .env("HOME", "/nonexistent")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("command should spawn");

    child
        .stdin
        .take()
        .expect("stdin handle")
        .write_all(LOG.as_bytes())
        .expect("write to stdin");
    let output = child.wait_with_output().expect("command should finish");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(" INFO: listening"));
    assert!(stdout.contains("ERROR: request failed"));
    assert!(stdout.contains("not an ecs line"));
}

#[test]
fn test_missing_file_is_an_error() {
    let output = Command::new(bin())
        .env("HOME", "/nonexistent")
        .arg("/definitely/not/here.log")
        .output()
        .expect("command should run");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("cannot open"));
}

#[test]
fn test_exclude_fields() {
    let dir = tempdir().expect("temp dir");
    let file = dir.path().join("app.log");
    write_file(&file, LOG);

    let output = Command::new(bin())
        .env("HOME", "/nonexistent")
        .args(["-x", "http", "--strict"])
        .arg(&file)
        .output()
        .expect("command should run");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("request failed"));
    assert!(!stdout.contains("status_code"));
}

#[test]
fn test_config_file_sets_the_format() {
    let dir = tempdir().expect("temp dir");
    let file = dir.path().join("app.log");
    write_file(&file, LOG);
    write_file(&dir.path().join(".ecsview.toml"), "format = \"ecs\"\n");

    let output = Command::new(bin())
        .env("HOME", dir.path())
        .args(["--strict"])
        .arg(&file)
        .output()
        .expect("command should run");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with(r#"{"@timestamp""#));

    // --no-config wins over the file.
    let output = Command::new(bin())
        .env("HOME", dir.path())
        .args(["--strict", "--no-config"])
        .arg(&file)
        .output()
        .expect("command should run");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(" INFO: listening"));
}

#[test]
fn test_unknown_level_warns_on_stderr() {
    let output = Command::new(bin())
        .env("HOME", "/nonexistent")
        .args(["--level", "loud", "/dev/null"])
        .output()
        .expect("command should run");

    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unknown log level 'loud'"));
}
