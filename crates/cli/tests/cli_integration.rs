//! CLI integration tests for every subcommand.
//!
//! Uses `assert_cmd` to spawn the `hashgram` binary and verify
//! exit codes, stdout content, and stderr content.
//!
//! All tests set `current_dir` to the workspace root so that relative
//! paths to conformance fixtures resolve correctly.

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Locate the workspace root by walking up from CARGO_MANIFEST_DIR.
fn workspace_root() -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    // crates/cli -> workspace root is two levels up
    manifest_dir
        .parent()
        .and_then(|p| p.parent())
        .expect("workspace root")
        .to_path_buf()
}

/// Helper: create a Command for the `hashgram` binary, rooted at workspace.
fn hashgram() -> Command {
    let mut cmd = cargo_bin_cmd!("hashgram");
    cmd.current_dir(workspace_root());
    cmd.env_remove("RUST_LOG");
    cmd
}

const RECORD: &str = "conformance/positive/record.schema";

// ──────────────────────────────────────────────
// 1. Help and version
// ──────────────────────────────────────────────

#[test]
fn help_lists_subcommands() {
    hashgram()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("compile"))
        .stdout(predicate::str::contains("check"))
        .stdout(predicate::str::contains("build"));
}

#[test]
fn version_exits_0() {
    hashgram()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("hashgram"));
}

// ──────────────────────────────────────────────
// 2. compile
// ──────────────────────────────────────────────

#[test]
fn compile_prints_expected_grammar() {
    let expected =
        fs::read_to_string(workspace_root().join("conformance/positive/record.expected.grammar"))
            .unwrap();
    hashgram()
        .args(["compile", RECORD])
        .assert()
        .success()
        .stdout(expected);
}

#[test]
fn compile_name_and_root_flags() {
    hashgram()
        .args(["compile", RECORD, "--name", "Postal", "--root", "@labels"])
        .assert()
        .success()
        .stdout(predicate::str::contains("%grammar Postal\n%start array.labels\n"));
}

#[test]
fn compile_unknown_root_exits_1() {
    hashgram()
        .args(["compile", RECORD, "--root", "%nothing"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("root entity '%nothing' is not declared"));
}

#[test]
fn compile_writes_out_file() {
    let tmp = TempDir::new().unwrap();
    let out = tmp.path().join("record.grammar");
    hashgram()
        .args(["compile", RECORD, "--out"])
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("wrote"));
    let written = fs::read_to_string(&out).unwrap();
    assert!(written.starts_with("/* Generated by hashgram. Do not edit. */\n"));
    assert!(written.contains("%start mapping.record"));
}

#[test]
fn compile_json_output_wraps_grammar() {
    let output = hashgram()
        .args(["--output", "json", "compile", RECORD])
        .output()
        .unwrap();
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert!(json["grammar"]
        .as_str()
        .unwrap()
        .contains("mapping.record.entry"));
}

#[test]
fn compile_syntax_error_reports_line() {
    hashgram()
        .args(["compile", "conformance/negative/missing_colon.schema"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("missing_colon.schema:2:"));
}

#[test]
fn compile_error_as_json() {
    let output = hashgram()
        .args([
            "--output",
            "json",
            "compile",
            "conformance/negative/duplicate.schema",
        ])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    let json: serde_json::Value = serde_json::from_slice(&output.stderr).unwrap();
    assert_eq!(json["error"], "DuplicateEntityError");
    assert_eq!(json["line"], 3);
}

#[test]
fn compile_missing_file_exits_1() {
    hashgram()
        .args(["compile", "conformance/no-such.schema"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("cannot read"));
}

#[test]
fn quiet_suppresses_error_text() {
    hashgram()
        .args(["--quiet", "compile", "conformance/no-such.schema"])
        .assert()
        .failure()
        .stderr(predicate::str::is_empty());
}

#[test]
fn config_file_supplies_defaults() {
    let tmp = TempDir::new().unwrap();
    let config = tmp.path().join("hashgram.toml");
    fs::write(&config, "[compile]\nname = \"Postal\"\nroot = \"$label\"\n").unwrap();

    hashgram()
        .args(["compile", RECORD, "--config"])
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("%grammar Postal\n%start scalar.label\n"));

    // flags override the config
    hashgram()
        .args(["compile", RECORD, "--name", "Other", "--config"])
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("%grammar Other\n"));
}

#[test]
fn bad_config_exits_1() {
    let tmp = TempDir::new().unwrap();
    let config = tmp.path().join("hashgram.toml");
    fs::write(&config, "[compile]\nstart = 1\n").unwrap();
    hashgram()
        .args(["compile", RECORD, "--config"])
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("could not parse"));
}

// ──────────────────────────────────────────────
// 3. check
// ──────────────────────────────────────────────

#[test]
fn check_valid_documents() {
    hashgram()
        .args([
            "check",
            "conformance/documents/record.schema",
            "conformance/documents/record/full.json",
            "conformance/documents/record/partial.yaml",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("full.json: valid"))
        .stdout(predicate::str::contains("partial.yaml: valid"));
}

#[test]
fn check_reports_every_violation() {
    hashgram()
        .args([
            "check",
            "conformance/documents/record.schema",
            "conformance/documents/record/bad.json",
        ])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("bad.json: 2 violations"))
        .stderr(predicate::str::contains("/extra: unexpected key \"extra\""))
        .stderr(predicate::str::contains("/tags/1: unexpected scalar \"office\""));
}

#[test]
fn check_json_output() {
    let output = hashgram()
        .args([
            "--output",
            "json",
            "check",
            "conformance/documents/tree.schema",
            "conformance/documents/tree/deep.json",
            "conformance/documents/tree/broken.json",
        ])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["valid"], false);
    let docs = json["documents"].as_array().unwrap();
    assert_eq!(docs.len(), 2);
    assert_eq!(docs[0]["valid"], true);
    assert_eq!(docs[1]["valid"], false);
    assert_eq!(docs[1]["errors"][0]["path"], "/children/1");
    assert_eq!(docs[1]["errors"][0]["rule"], "array.children");
}

#[test]
fn check_unparseable_document_exits_1() {
    let tmp = TempDir::new().unwrap();
    let doc = tmp.path().join("broken.json");
    fs::write(&doc, "{ not json").unwrap();
    hashgram()
        .args(["check", "conformance/documents/record.schema"])
        .arg(&doc)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("cannot parse"));
}

#[test]
fn check_requires_a_document() {
    hashgram()
        .args(["check", "conformance/documents/record.schema"])
        .assert()
        .failure();
}

// ──────────────────────────────────────────────
// 4. build
// ──────────────────────────────────────────────

#[test]
fn build_without_program_exits_1() {
    hashgram()
        .args(["build", RECORD])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("no grammar compiler given"));
}

#[cfg(unix)]
#[test]
fn build_runs_external_compiler() {
    hashgram()
        .args([
            "build",
            RECORD,
            "--name",
            "Postal",
            "--program",
            "sh",
            "--arg",
            "-c",
            "--arg",
            "grep -c '^mapping.record' \"$1\"; echo \"compiled $0\"",
            "--arg",
            "{name}",
            "--arg",
            "{grammar}",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("2\n"))
        .stdout(predicate::str::contains("compiled Postal"));
}

#[cfg(unix)]
#[test]
fn build_propagates_compiler_exit_code() {
    hashgram()
        .args([
            "build",
            RECORD,
            "--program",
            "sh",
            "--arg",
            "-c",
            "--arg",
            "echo conflicts found >&2; exit 4",
        ])
        .assert()
        .failure()
        .code(4)
        .stderr(predicate::str::contains("conflicts found"));
}

#[cfg(unix)]
#[test]
fn build_program_from_config() {
    let tmp = TempDir::new().unwrap();
    let config = tmp.path().join("hashgram.toml");
    fs::write(
        &config,
        "[backend]\nprogram = \"sh\"\nargs = [\"-c\", \"head -n 1 \\\"$0\\\"\", \"{grammar}\"]\n",
    )
    .unwrap();
    hashgram()
        .args(["build", RECORD, "--config"])
        .arg(&config)
        .assert()
        .success()
        .stdout("/* Generated by hashgram. Do not edit. */\n");
}

// ──────────────────────────────────────────────
// 5. test (conformance suite)
// ──────────────────────────────────────────────

#[test]
fn conformance_suite_passes() {
    hashgram()
        .arg("test")
        .assert()
        .success()
        .stdout(predicate::str::contains("TAP version 14"))
        .stdout(predicate::str::contains("ok 1 - positive/choice"))
        .stdout(predicate::str::contains("# fail  0"));
}

#[test]
fn conformance_failure_exits_1() {
    let tmp = TempDir::new().unwrap();
    let positive = tmp.path().join("positive");
    fs::create_dir(&positive).unwrap();
    fs::write(positive.join("colors.schema"), "$color: 'red 'blue\n").unwrap();
    fs::write(positive.join("colors.expected.grammar"), "not a grammar\n").unwrap();

    hashgram()
        .arg("test")
        .arg(tmp.path())
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::contains("not ok 1 - positive/colors"))
        .stdout(predicate::str::contains("output mismatch at line 1"));
}

#[test]
fn missing_suite_dir_exits_1() {
    hashgram()
        .args(["test", "no-such-suite"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}
