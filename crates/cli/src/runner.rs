use crate::tap::Report;
use hashgram_backend::{Backend, InProcessBackend};
use hashgram_core::{compile, CompileOptions};
use serde_json::Value;
use std::path::{Path, PathBuf};
/// Conformance suite runner.
///
/// Convention:
///   positive/   -- *.schema + *.expected.grammar (compiles to exactly that text)
///   negative/   -- *.schema + *.expected-error.json (compile error expected)
///   documents/  -- <stem>.schema + <stem>/*.{json,yaml,yml}, each document with
///                  a <doc>.expected.json array of rejected paths ([] = valid)

pub struct RunResult {
    pub failed: usize,
}

pub fn run_suite(suite_dir: &Path) -> RunResult {
    let mut report = Report::new();

    run_positive_tests(suite_dir, &mut report);
    run_negative_tests(suite_dir, &mut report);
    run_document_tests(suite_dir, &mut report);

    let failed = report.failure_count();
    report.finish();

    RunResult { failed }
}

fn run_positive_tests(suite_dir: &Path, report: &mut Report) {
    let dir = suite_dir.join("positive");
    for schema_path in files_with_extension(&dir, &["schema"]) {
        let stem = stem(&schema_path);
        let test_name = format!("positive/{}", stem);
        let expected_path = dir.join(format!("{}.expected.grammar", stem));

        let expected = match std::fs::read_to_string(&expected_path) {
            Ok(s) => s,
            Err(e) => {
                report.not_ok(
                    &test_name,
                    format!("cannot read {}: {}", expected_path.display(), e),
                );
                continue;
            }
        };

        match compile_fixture(&schema_path) {
            Ok(got) if got == expected => report.ok(&test_name),
            Ok(got) => report.not_ok(&test_name, text_diff(&expected, &got)),
            Err(e) => report.not_ok(&test_name, format!("unexpected compile error: {}", e)),
        }
    }
}

fn run_negative_tests(suite_dir: &Path, report: &mut Report) {
    let dir = suite_dir.join("negative");
    for schema_path in files_with_extension(&dir, &["schema"]) {
        let stem = stem(&schema_path);
        let test_name = format!("negative/{}", stem);
        let expected_path = dir.join(format!("{}.expected-error.json", stem));

        let expected = match read_json(&expected_path) {
            Ok(v) => v,
            Err(e) => {
                report.not_ok(&test_name, e);
                continue;
            }
        };

        match compile_fixture(&schema_path) {
            Err(CompileFailure::Compile(got)) => {
                let got = got.to_json_value();
                if got == expected {
                    report.ok(&test_name);
                } else {
                    report.not_ok(
                        &test_name,
                        format!("error mismatch:\n  expected: {}\n  got:      {}", expected, got),
                    );
                }
            }
            Err(CompileFailure::Read(e)) => report.not_ok(&test_name, e),
            Ok(_) => report.not_ok(&test_name, "expected a compile error but compilation succeeded"),
        }
    }
}

fn run_document_tests(suite_dir: &Path, report: &mut Report) {
    let dir = suite_dir.join("documents");
    for schema_path in files_with_extension(&dir, &["schema"]) {
        let suite_name = stem(&schema_path);

        let mut validator = match compile_fixture(&schema_path)
            .map_err(|e| e.to_string())
            .and_then(|text| InProcessBackend.compile(&text).map_err(|e| e.to_string()))
        {
            Ok(v) => v,
            Err(e) => {
                report.not_ok(format!("documents/{}", suite_name), e);
                continue;
            }
        };

        let doc_dir = dir.join(&suite_name);
        for doc_path in files_with_extension(&doc_dir, &["json", "yaml", "yml"]) {
            let file_name = file_name(&doc_path);
            if file_name.ends_with(".expected.json") {
                continue;
            }
            let test_name = format!("documents/{}/{}", suite_name, file_name);
            let expected_path = doc_dir.join(format!("{}.expected.json", stem(&doc_path)));

            let expected = match read_json(&expected_path).and_then(|v| paths_of(&v)) {
                Ok(p) => p,
                Err(e) => {
                    report.not_ok(&test_name, e);
                    continue;
                }
            };
            let node = match crate::read_document(&doc_path) {
                Ok(n) => n,
                Err(e) => {
                    report.not_ok(&test_name, e);
                    continue;
                }
            };

            let got: Vec<String> = validator
                .validate(&node)
                .iter()
                .map(|v| v.path.clone())
                .collect();
            if got == expected {
                report.ok(&test_name);
            } else {
                let detail: Vec<String> = validator.errors().iter().map(|v| v.to_string()).collect();
                report.not_ok(
                    &test_name,
                    format!(
                        "violation paths differ\n  expected: {:?}\n  got:      {:?}\n{}",
                        expected,
                        got,
                        detail.join("\n")
                    ),
                );
            }
        }
    }
}

// -- Helpers --

enum CompileFailure {
    Read(String),
    Compile(hashgram_core::CompileError),
}

impl std::fmt::Display for CompileFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompileFailure::Read(e) => f.write_str(e),
            CompileFailure::Compile(e) => write!(f, "{}", e),
        }
    }
}

/// Compile a fixture under its bare file name, so expected errors do not
/// depend on where the suite lives.
fn compile_fixture(path: &Path) -> Result<String, CompileFailure> {
    let src = std::fs::read_to_string(path)
        .map_err(|e| CompileFailure::Read(format!("cannot read {}: {}", path.display(), e)))?;
    compile(&src, &file_name(path), &CompileOptions::default()).map_err(CompileFailure::Compile)
}

fn files_with_extension(dir: &Path, extensions: &[&str]) -> Vec<PathBuf> {
    let mut results = Vec::new();
    if let Ok(entries) = std::fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            let matches = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| extensions.contains(&e));
            if matches && path.is_file() {
                results.push(path);
            }
        }
    }
    results.sort();
    results
}

fn stem(path: &Path) -> String {
    path.file_stem()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string()
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string()
}

fn read_json(path: &Path) -> Result<Value, String> {
    let src = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read {}: {}", path.display(), e))?;
    serde_json::from_str(&src).map_err(|e| format!("invalid JSON in {}: {}", path.display(), e))
}

fn paths_of(value: &Value) -> Result<Vec<String>, String> {
    value
        .as_array()
        .and_then(|items| {
            items
                .iter()
                .map(|v| v.as_str().map(str::to_owned))
                .collect::<Option<Vec<_>>>()
        })
        .ok_or_else(|| format!("expected an array of paths, got {}", value))
}

/// Line-by-line comparison; reports the first differing line.
fn text_diff(expected: &str, got: &str) -> String {
    let mut exp = expected.lines();
    let mut act = got.lines();
    let mut line = 1usize;
    loop {
        match (exp.next(), act.next()) {
            (None, None) => return "output differs only in trailing newlines".to_owned(),
            (e, a) if e == a => line += 1,
            (e, a) => {
                return format!(
                    "output mismatch at line {}:\n  expected: {}\n  got:      {}",
                    line,
                    e.unwrap_or("<end of file>"),
                    a.unwrap_or("<end of file>")
                )
            }
        }
    }
}
