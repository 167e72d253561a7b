//! Integration tests for the ust CLI
//!
//! Run against the local backend in a temporary directory, so no external
//! service is needed.

use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

fn run_ust(base: &Path, args: &[&str]) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_ust"));
    cmd.arg("--mode")
        .arg("local")
        .arg("--base-path")
        .arg(base)
        .args(args);
    cmd.output().expect("failed to execute ust")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn test_upload_ls_download_rm_round_trip() {
    let base = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();

    let local = work.path().join("hello.txt");
    std::fs::write(&local, "Hello, World!").unwrap();

    let output = run_ust(base.path(), &["upload", local.to_str().unwrap(), "a/b.txt"]);
    assert!(output.status.success(), "upload failed: {output:?}");

    let output = run_ust(base.path(), &["ls", "a"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("a/b.txt"));

    let fetched = work.path().join("fetched.txt");
    let output = run_ust(
        base.path(),
        &["download", "a/b.txt", fetched.to_str().unwrap()],
    );
    assert!(output.status.success(), "download failed: {output:?}");
    assert_eq!(std::fs::read_to_string(&fetched).unwrap(), "Hello, World!");

    let output = run_ust(base.path(), &["rm", "a/b.txt"]);
    assert!(output.status.success());

    let output = run_ust(base.path(), &["stat", "a/b.txt"]);
    assert_eq!(output.status.code(), Some(5));
}

#[test]
fn test_cat_streams_contents() {
    let base = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();

    let local = work.path().join("data.txt");
    std::fs::write(&local, "streamed").unwrap();
    assert!(
        run_ust(base.path(), &["upload", local.to_str().unwrap(), "data.txt"])
            .status
            .success()
    );

    let output = run_ust(base.path(), &["cat", "data.txt"]);
    assert!(output.status.success());
    assert_eq!(stdout(&output), "streamed");
}

#[test]
fn test_mv_and_cp() {
    let base = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();

    let local = work.path().join("f.txt");
    std::fs::write(&local, "payload").unwrap();
    assert!(
        run_ust(base.path(), &["upload", local.to_str().unwrap(), "f.txt"])
            .status
            .success()
    );

    assert!(run_ust(base.path(), &["cp", "f.txt", "copy.txt"]).status.success());
    assert!(run_ust(base.path(), &["mv", "f.txt", "moved.txt"]).status.success());

    assert_eq!(
        run_ust(base.path(), &["stat", "f.txt"]).status.code(),
        Some(5)
    );
    assert!(run_ust(base.path(), &["stat", "copy.txt"]).status.success());
    assert!(run_ust(base.path(), &["stat", "moved.txt"]).status.success());
}

#[test]
fn test_mkdir_rmdir() {
    let base = TempDir::new().unwrap();

    assert!(run_ust(base.path(), &["mkdir", "x/y"]).status.success());
    assert!(base.path().join("x/y").is_dir());

    assert!(run_ust(base.path(), &["rmdir", "x"]).status.success());
    assert!(!base.path().join("x").exists());
}

#[test]
fn test_stat_json_output() {
    let base = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();

    let local = work.path().join("j.txt");
    std::fs::write(&local, "12345").unwrap();
    assert!(
        run_ust(base.path(), &["upload", local.to_str().unwrap(), "j.txt"])
            .status
            .success()
    );

    let output = run_ust(base.path(), &["stat", "j.txt", "--json"]);
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(value["name"], "j.txt");
    assert_eq!(value["size"], 5);
    assert_eq!(value["is_dir"], false);
}

#[test]
fn test_batch_upload_and_batch_rm() {
    let base = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();

    let one = work.path().join("one.txt");
    let two = work.path().join("two.txt");
    std::fs::write(&one, "1").unwrap();
    std::fs::write(&two, "2").unwrap();

    let output = run_ust(
        base.path(),
        &[
            "upload",
            one.to_str().unwrap(),
            two.to_str().unwrap(),
            "batch",
        ],
    );
    assert!(output.status.success(), "batch upload failed: {output:?}");

    let output = run_ust(base.path(), &["ls", "batch"]);
    let listing = stdout(&output);
    assert!(listing.contains("batch/one.txt"));
    assert!(listing.contains("batch/two.txt"));

    // Fail-fast: the missing middle entry stops the batch before two.txt
    let output = run_ust(
        base.path(),
        &["rm", "batch/one.txt", "batch/missing.txt", "batch/two.txt"],
    );
    assert_eq!(output.status.code(), Some(5));
    assert_eq!(
        run_ust(base.path(), &["stat", "batch/one.txt"]).status.code(),
        Some(5)
    );
    assert!(
        run_ust(base.path(), &["stat", "batch/two.txt"])
            .status
            .success()
    );
}

#[test]
fn test_touch_sets_modification_time() {
    let base = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();

    let local = work.path().join("t.txt");
    std::fs::write(&local, "t").unwrap();
    assert!(
        run_ust(base.path(), &["upload", local.to_str().unwrap(), "t.txt"])
            .status
            .success()
    );

    let output = run_ust(
        base.path(),
        &["touch", "t.txt", "--time", "2020-09-13T12:26:40Z"],
    );
    assert!(output.status.success(), "touch failed: {output:?}");

    let output = run_ust(base.path(), &["stat", "t.txt", "--json"]);
    let value: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert!(
        value["mod_time"]
            .as_str()
            .unwrap()
            .starts_with("2020-09-13T12:26:40")
    );
}

#[test]
fn test_unknown_mode_is_usage_error() {
    let base = TempDir::new().unwrap();
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_ust"));
    cmd.arg("--mode").arg("s3").arg("ls").arg("");
    let _ = base;
    let output = cmd.output().expect("failed to execute ust");
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_config_file_selects_backend() {
    let base = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();

    let config = work.path().join("config.toml");
    std::fs::write(
        &config,
        format!(
            "mode = \"local\"\n\n[local]\nbase_path = \"{}\"\n",
            base.path().display()
        ),
    )
    .unwrap();

    let local = work.path().join("c.txt");
    std::fs::write(&local, "via config").unwrap();

    let mut cmd = Command::new(env!("CARGO_BIN_EXE_ust"));
    cmd.arg("--config")
        .arg(&config)
        .arg("upload")
        .arg(&local)
        .arg("c.txt");
    let output = cmd.output().expect("failed to execute ust");
    assert!(output.status.success(), "upload failed: {output:?}");
    assert!(base.path().join("c.txt").is_file());
}
