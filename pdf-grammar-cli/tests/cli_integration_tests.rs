//! Integration tests for the pdfgrammar CLI
//!
//! Runs the built binary against grammar folders and object dumps written to
//! temporary directories.

use anyhow::Result;
use pretty_assertions::assert_eq;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::{tempdir, TempDir};

const HEADER: &str = "Key\tTYPE\tSinceVersion\tDeprecatedIn\tREQUIRED\tINDIRECTREFERENCE\tRequiredValue\tDefaultValue\tPossibleValues\tSpecialCase\tLink";

/// Test helper to get the CLI binary path
fn get_cli_path() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // Remove test binary name
    if path.ends_with("deps") {
        path.pop(); // Remove "deps" directory
    }
    path.push("pdfgrammar");
    #[cfg(windows)]
    path.set_extension("exe");
    path
}

fn run_cli_command(args: &[&str]) -> Result<Output> {
    let output = Command::new(get_cli_path()).args(args).output()?;
    Ok(output)
}

/// Write `<link>.tsv` with rows given as tab-free `|` separated columns.
fn write_table(dir: &Path, link: &str, rows: &[&str]) {
    let mut text = format!("{HEADER}\n");
    for row in rows {
        let mut fields: Vec<&str> = row.split('|').collect();
        fields.resize(11, "");
        text.push_str(&fields.join("\t"));
        text.push('\n');
    }
    fs::write(dir.join(format!("{link}.tsv")), text).expect("Failed to write grammar");
}

fn grammar_folder() -> TempDir {
    let dir = tempdir().expect("Failed to create temp directory");
    write_table(
        dir.path(),
        "FileTrailer",
        &[
            "Root|DICTIONARY|1.0||TRUE|TRUE|||||[Catalog]",
            "Size|INTEGER|1.0||TRUE|FALSE",
        ],
    );
    write_table(
        dir.path(),
        "Catalog",
        &[
            "Type|NAME|1.0||TRUE||Catalog",
            "Pages|DICTIONARY|1.0||TRUE|TRUE",
            "Lang|STRING|1.4||FALSE",
        ],
    );
    dir
}

/// Object dump with a catalog at object 1 and the given catalog entries.
fn write_dump(dir: &Path, catalog_entries: &str) -> PathBuf {
    let dump = format!(
        r#"{{
  "version": "1.7",
  "trailer": {{ "Root": {{ "ref": {{ "number": 1, "generation": 0 }} }}, "Size": {{ "integer": 3 }} }},
  "objects": [
    {{ "id": {{ "number": 1, "generation": 0 }}, "object": {{ "dictionary": {{ {catalog_entries} }} }} }},
    {{ "id": {{ "number": 2, "generation": 0 }}, "object": {{ "dictionary": {{}} }} }}
  ]
}}"#
    );
    let path = dir.join("document.json");
    fs::write(&path, dump).expect("Failed to write dump");
    path
}

const GOOD_CATALOG: &str = r#""Type": { "name": "Catalog" }, "Pages": { "ref": { "number": 2, "generation": 0 } }"#;
const CATALOG_WITHOUT_PAGES: &str = r#""Type": { "name": "Catalog" }"#;

#[test]
fn test_cli_help() {
    let output = run_cli_command(&["--help"]).expect("CLI should run");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("check-grammar"));
    assert!(stdout.contains("validate"));
}

#[test]
fn test_check_grammar_clean_folder() {
    let grammar = grammar_folder();
    let output = run_cli_command(&["check-grammar", grammar.path().to_str().unwrap()])
        .expect("CLI should run");

    assert!(output.status.success(), "{output:?}");
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Checked 2 grammar files: 0 failed, 0 findings"));
}

#[test]
fn test_check_grammar_reports_defects() {
    let grammar = grammar_folder();
    write_table(grammar.path(), "Broken", &["Flags|bitmask|1.0||FALSE"]);
    fs::write(grammar.path().join("Short.tsv"), "Key\tTYPE\n").unwrap();

    let output = run_cli_command(&["check-grammar", "--terse", grammar.path().to_str().unwrap()])
        .expect("CLI should run");

    assert!(!output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 2, "{stdout}");
    assert!(lines[0].starts_with("StructuralError: Broken::Flags:"));
    assert!(lines[1].starts_with("MalformedHeader: Short:"));
}

#[test]
fn test_validate_clean_document() {
    let grammar = grammar_folder();
    let work = tempdir().unwrap();
    let dump = write_dump(work.path(), GOOD_CATALOG);

    let output = run_cli_command(&[
        "validate",
        dump.to_str().unwrap(),
        "--grammar",
        grammar.path().to_str().unwrap(),
    ])
    .expect("CLI should run");

    assert!(output.status.success(), "{output:?}");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Checked 2 objects against PDF 1.7: 0 findings"));
}

#[test]
fn test_validate_reports_findings_terse_and_verbose() {
    let grammar = grammar_folder();
    let work = tempdir().unwrap();
    let dump = write_dump(work.path(), CATALOG_WITHOUT_PAGES);
    let grammar_arg = grammar.path().to_str().unwrap();

    let verbose = run_cli_command(&["validate", dump.to_str().unwrap(), "-g", grammar_arg])
        .expect("CLI should run");
    assert!(!verbose.status.success());
    assert_eq!(
        String::from_utf8_lossy(&verbose.stdout).trim(),
        "MissingRequiredKey: Catalog::Pages: required DICTIONARY is missing [Trailer/Root]"
    );

    let terse = run_cli_command(&["validate", dump.to_str().unwrap(), "-g", grammar_arg, "--terse"])
        .expect("CLI should run");
    assert_eq!(
        String::from_utf8_lossy(&terse.stdout).trim(),
        "MissingRequiredKey: Catalog::Pages: required DICTIONARY is missing"
    );
}

#[test]
fn test_validate_version_override() {
    let grammar = grammar_folder();
    let work = tempdir().unwrap();
    let dump = write_dump(
        work.path(),
        &format!(r#"{GOOD_CATALOG}, "Lang": {{ "string": "en" }}"#),
    );

    let output = run_cli_command(&[
        "validate",
        dump.to_str().unwrap(),
        "-g",
        grammar.path().to_str().unwrap(),
        "--pdf-version",
        "1.3",
        "--terse",
    ])
    .expect("CLI should run");

    assert!(!output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("VersionMismatch: Catalog::Lang:"), "{stdout}");
}

#[test]
fn test_validate_json_report_file() {
    let grammar = grammar_folder();
    let work = tempdir().unwrap();
    let dump = write_dump(work.path(), CATALOG_WITHOUT_PAGES);
    let report = work.path().join("report.jsonl");

    let output = run_cli_command(&[
        "validate",
        dump.to_str().unwrap(),
        "-g",
        grammar.path().to_str().unwrap(),
        "--json",
        "-o",
        report.to_str().unwrap(),
    ])
    .expect("CLI should run");

    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    let content = fs::read_to_string(&report).expect("report written");
    assert_eq!(content.lines().count(), 1);
    assert!(content.contains(r#""kind":"MissingRequiredKey""#), "{content}");
    assert!(content.contains(r#""context":"Trailer/Root""#), "{content}");
}

#[test]
fn test_validate_missing_trailer_grammar_fails() {
    let grammar = tempdir().unwrap();
    let work = tempdir().unwrap();
    let dump = write_dump(work.path(), GOOD_CATALOG);

    let output = run_cli_command(&[
        "validate",
        dump.to_str().unwrap(),
        "-g",
        grammar.path().to_str().unwrap(),
    ])
    .expect("CLI should run");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Cannot start validation at link FileTrailer"), "{stderr}");
}

#[test]
fn test_validate_rejects_bad_dump() {
    let grammar = grammar_folder();
    let work = tempdir().unwrap();
    let dump = work.path().join("bad.json");
    fs::write(&dump, "{ not json").unwrap();

    let output = run_cli_command(&[
        "validate",
        dump.to_str().unwrap(),
        "-g",
        grammar.path().to_str().unwrap(),
    ])
    .expect("CLI should run");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Failed to parse object dump"), "{stderr}");
}
