//! CLI contract tests
//!
//! Drives the built binary: exit codes on invalid input, export files,
//! JSON output and the history database.

use std::path::Path;
use std::process::{Command, Output};

fn repobench_bin() -> String {
    env!("CARGO_BIN_EXE_repobench").to_string()
}

/// Skip list covering every built-in assessor
const ALL_ASSESSORS: &str = "Readability,Maintainability,Performance,Testability,Robustness,\
Security,Scalability,Documentation,Consistency,GitHealth";

fn run(args: &[&str], history_db: &Path) -> Output {
    Command::new(repobench_bin())
        .args(args)
        .env("REPOBENCH_HISTORY_DB", history_db)
        .env_remove("BENCH_PROFILE_SCRIPT")
        .env_remove("BENCH_WEB_APP_URL")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to run repobench")
}

fn two_codebases() -> (tempfile::TempDir, String, String) {
    let root = tempfile::tempdir().unwrap();
    let first = root.path().join("first");
    let second = root.path().join("second");
    std::fs::create_dir(&first).unwrap();
    std::fs::create_dir(&second).unwrap();
    std::fs::write(
        first.join("util.py"),
        "def add(a, b):\n    \"\"\"Add two numbers.\"\"\"\n    return a + b\n",
    )
    .unwrap();
    std::fs::write(second.join("util.py"), "def Add(A, B):\n    return A + B\n").unwrap();
    (
        root,
        first.display().to_string(),
        second.display().to_string(),
    )
}

#[test]
fn missing_path_exits_with_one() {
    let (root, first, _) = two_codebases();
    let missing = root.path().join("missing").display().to_string();
    let db = root.path().join("history.redb");

    let output = run(&["compare", &first, &missing, "--no-history"], &db);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("not a directory"), "stderr: {stderr}");
}

#[test]
fn invalid_weights_exit_with_one() {
    let (root, first, second) = two_codebases();
    let db = root.path().join("history.redb");

    for weights in ["{not json", r#"{"Readability": -2}"#, r#"["Readability"]"#] {
        let output = run(
            &["compare", &first, &second, "--weights", weights, "--no-history"],
            &db,
        );
        assert_eq!(output.status.code(), Some(1), "weights {weights} accepted");
    }
    assert!(!db.exists(), "nothing should run on invalid input");
}

#[test]
fn export_with_everything_skipped() {
    let (root, first, second) = two_codebases();
    let db = root.path().join("history.redb");
    let export = root.path().join("reports/nested/result.json");

    let output = run(
        &[
            "compare",
            &first,
            &second,
            "--skip",
            ALL_ASSESSORS,
            "--export",
            &export.display().to_string(),
            "--no-history",
        ],
        &db,
    );
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let doc: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&export).unwrap()).unwrap();
    assert_eq!(doc["codebase1"], first);
    assert_eq!(doc["codebase2"], second);
    assert_eq!(doc["total_score1"], 0.0);
    assert_eq!(doc["total_score2"], 0.0);
    assert!(doc["details1"].as_object().unwrap().is_empty());
    assert!(!db.exists(), "--no-history must not create the store");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("TOTAL SCORE"));
    assert!(stdout.contains("Exported results to"));
}

#[test]
fn json_format_prints_export_document() {
    let (root, first, second) = two_codebases();
    let db = root.path().join("history.redb");

    let output = run(
        &[
            "compare",
            &first,
            &second,
            "--skip",
            "Readability,Maintainability,Performance,Testability,Security,GitHealth",
            "--format",
            "json",
            "--no-history",
        ],
        &db,
    );
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let doc: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let scores: Vec<_> = doc["raw_scores1"].as_object().unwrap().keys().cloned().collect();
    assert_eq!(
        scores,
        vec!["Robustness", "Scalability", "Documentation", "Consistency"]
    );
    assert_eq!(doc["raw_scores1"]["Consistency"], 10.0);
    assert_eq!(doc["raw_scores2"]["Consistency"], 0.0);
}

#[test]
fn runs_are_recorded_and_listed() {
    let (root, first, second) = two_codebases();
    let db = root.path().join("data/history.redb");
    let args = ["compare", &first, &second, "--skip", ALL_ASSESSORS];

    assert!(run(&args, &db).status.success());
    assert!(run(&args, &db).status.success());
    assert!(db.exists());

    let output = run(&["history", "--json", "--limit", "1"], &db);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let runs: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let runs = runs.as_array().unwrap();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0]["id"], 2);
    assert_eq!(runs[0]["codebase1"], first);

    let output = run(&["history"], &db);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("first"));
    assert!(stdout.contains("tie"));
}

#[test]
fn assessors_lists_registry() {
    let root = tempfile::tempdir().unwrap();
    let output = run(&["assessors"], &root.path().join("history.redb"));
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for name in ["Readability", "GitHealth", "LlmScore"] {
        assert!(stdout.contains(name), "missing {name}");
    }
}
