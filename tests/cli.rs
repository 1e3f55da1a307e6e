//! CLI exit codes
//!
//! 0 success, 1 fatal error or bad arguments, 2 failed batch variants.

use assert_cmd::assert::OutputAssertExt;
use predicates::prelude::*;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

fn magazine_cli(dir: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_magazine-cli"));
    cmd.current_dir(dir)
        .env_remove("MAGAZINE_PLAN_PATH")
        .env("RUST_LOG", "off");
    cmd
}

#[test]
fn build_without_a_plan_is_a_failure() {
    let tmp = TempDir::new().unwrap();

    magazine_cli(tmp.path())
        .arg("build")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("\"success\":false"));
}

#[test]
fn unknown_flag_is_a_failure() {
    let tmp = TempDir::new().unwrap();

    magazine_cli(tmp.path())
        .args(["templates", "--no-such-flag"])
        .assert()
        .code(1);
}

#[test]
fn help_still_succeeds() {
    let tmp = TempDir::new().unwrap();

    magazine_cli(tmp.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("build-all"));
}

#[test]
fn build_all_with_no_variants_is_a_failure() {
    let tmp = TempDir::new().unwrap();
    std::fs::create_dir(tmp.path().join("output")).unwrap();

    magazine_cli(tmp.path())
        .args(["build-all", "--output", "output"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("No variant_<n>/plan.json found"));
}

#[test]
fn build_all_with_a_missing_directory_is_a_failure() {
    let tmp = TempDir::new().unwrap();

    magazine_cli(tmp.path())
        .args(["build-all", "--output", "absent"])
        .assert()
        .code(1);
}
