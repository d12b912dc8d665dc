// Regression tests for the go-driver binary.
// Requires: assert_cmd, predicates crates in [dev-dependencies]

mod common;

use std::fs;

use assert_cmd::Command;
use common::fixtures_dir;
use predicates::{prelude::PredicateBooleanExt, str::contains};

fn go_driver() -> Command {
    let mut cmd = Command::cargo_bin("go-driver").expect("binary is built");
    cmd.env_remove("GO_DRIVER_LOG");
    cmd
}

#[test]
fn cli_parse_prints_json_tree() {
    go_driver()
        .arg("parse")
        .arg(fixtures_dir().join("hello.go"))
        .assert()
        .success()
        .stdout(contains("\"@type\":\"File\"").and(contains("uast:FunctionGroup")));
}

#[test]
fn cli_parse_native_mode() {
    go_driver()
        .args(["--mode", "native", "parse", "--pretty"])
        .arg(fixtures_dir().join("hello.go"))
        .assert()
        .success()
        .stdout(contains("\"FuncDecl\"").and(contains("uast:FunctionGroup").not()));
}

#[test]
fn cli_reports_miette_diagnostics_on_parse_failure() {
    let bad_file = std::env::temp_dir().join("go_driver_cli_bad.go");
    fs::write(&bad_file, "func main() {}\n").expect("temp file");

    go_driver()
        .arg("parse")
        .arg(&bad_file)
        .assert()
        .failure()
        .stderr(contains("go_driver::parse").or(contains("Parse failure")));

    let _ = fs::remove_file(bad_file);
}

#[test]
fn cli_roundtrip_is_lossless() {
    go_driver()
        .arg("roundtrip")
        .arg(fixtures_dir().join("methods.go"))
        .assert()
        .success()
        .stdout(contains("lossless"));
}

#[test]
fn cli_check_walks_fixture_directory() {
    go_driver()
        .arg("check")
        .arg(fixtures_dir())
        .assert()
        .success()
        .stdout(contains("control.go").and(contains("passed: 6")));
}

#[test]
fn cli_serve_answers_requests() {
    go_driver()
        .arg("serve")
        .write_stdin("{\"content\": \"package main\"}\n")
        .assert()
        .success()
        .stdout(contains("\"status\":\"ok\"").and(contains("go-driver:")));
}

#[test]
fn cli_roles_lists_vocabulary() {
    go_driver()
        .arg("roles")
        .assert()
        .success()
        .stdout(contains("Identifier").and(contains("Receiver")));
}
