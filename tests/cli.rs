use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn workspace() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("dict.json"),
        r#"["my", "friend", "went", "home"]"#,
    )
    .unwrap();
    dir
}

const ENV_FLAGS: &[&str] = &[
    "LANGUAGE",
    "DICTIONARY_PATH",
    "CHUNK_SIZE",
    "CHUNK_OVERLAP",
    "PROCESS_WORKERS",
    "THREAD_WORKERS",
    "DISABLE_GRAMMAR",
    "LANGUAGE_TOOL_URL",
    "RUST_LOG",
];

/// The binary run inside `dir` with every env-backed flag cleared.
fn clean_env(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("docchk").unwrap();
    cmd.current_dir(dir);
    for var in ENV_FLAGS {
        cmd.env_remove(var);
    }
    cmd.args(["--no-color", "--dictionary", "dict.json"]);
    cmd
}

fn docchk(dir: &Path) -> Command {
    let mut cmd = clean_env(dir);
    cmd.arg("--no-grammar");
    cmd
}

#[test]
fn misspelling_fails_with_suggestion() {
    let dir = workspace();
    fs::write(dir.path().join("note.txt"), "My freind went home.\n").unwrap();

    docchk(dir.path())
        .arg("note.txt")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("1:4 [spelling] freind"))
        .stdout(predicate::str::contains("friend"));
}

#[test]
fn clean_file_passes() {
    let dir = workspace();
    fs::write(dir.path().join("note.txt"), "My friend went home.\n").unwrap();

    docchk(dir.path())
        .arg("note.txt")
        .assert()
        .success()
        .stdout(predicate::str::contains("No issues found"));
}

#[test]
fn no_fail_keeps_exit_code_zero() {
    let dir = workspace();
    fs::write(dir.path().join("note.txt"), "My freind went home.\n").unwrap();

    docchk(dir.path())
        .args(["--no-fail", "note.txt"])
        .assert()
        .success();
}

#[test]
fn json_report_splits_issues() {
    let dir = workspace();
    fs::create_dir(dir.path().join("docs")).unwrap();
    fs::write(dir.path().join("docs/a.txt"), "My freind went home.").unwrap();
    fs::write(dir.path().join("docs/b.txt"), "My friend went home.").unwrap();

    let output = docchk(dir.path())
        .args(["--no-fail", "--format", "json", "docs"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["documents_checked"], 2);
    assert_eq!(report["total_issues"], 1);
    assert_eq!(report["documents"][0]["spelling"][0]["original"], "freind");
    assert_eq!(report["documents"][0]["stats"]["grammar_enabled"], false);
    assert!(report["documents"][1]["spelling"].as_array().unwrap().is_empty());
}

#[test]
fn malformed_dictionary_is_reported() {
    let dir = workspace();
    fs::write(dir.path().join("dict.json"), "{not json").unwrap();
    fs::write(dir.path().join("note.txt"), "hello").unwrap();

    docchk(dir.path())
        .arg("note.txt")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse dictionary"));
}

#[test]
fn invalid_chunk_size_rejected() {
    let dir = workspace();
    fs::write(dir.path().join("note.txt"), "hello").unwrap();

    docchk(dir.path())
        .args(["--chunk-size", "100", "note.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("chunk_size must be greater than 256"));
}

#[test]
fn missing_paths_is_an_error() {
    let dir = workspace();
    docchk(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("No files specified"));
}

#[test]
fn completion_script_generated() {
    Command::cargo_bin("docchk")
        .unwrap()
        .args(["--completion", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("docchk"));
}

#[test]
fn chunk_size_read_from_environment() {
    let dir = workspace();
    fs::write(dir.path().join("note.txt"), "hello").unwrap();

    docchk(dir.path())
        .env("CHUNK_SIZE", "100")
        .arg("note.txt")
        .assert()
        .failure()
        .stderr(predicate::str::contains("chunk_size must be greater than 256, got 100"));
}

#[test]
fn disable_grammar_read_from_environment() {
    let dir = workspace();
    fs::write(dir.path().join("note.txt"), "My friend went home.").unwrap();

    clean_env(dir.path())
        .env("LANGUAGE_TOOL_URL", "http://127.0.0.1:9")
        .env("DISABLE_GRAMMAR", "1")
        .arg("note.txt")
        .assert()
        .success()
        .stderr(predicate::str::contains("Grammar engine unavailable").not());
}

#[test]
fn locale_priority_list_in_language_is_ignored() {
    let dir = workspace();
    fs::write(dir.path().join("note.txt"), "My friend went home.").unwrap();

    docchk(dir.path())
        .env("LANGUAGE", "en_US:en")
        .arg("note.txt")
        .assert()
        .success()
        .stderr(predicate::str::contains("Ignoring invalid language tag"));
}
