//! End-to-end tests for the `symdex` binary.
//!
//! Each test lays out a small project in a temp dir, runs the binary as a
//! subprocess and inspects stdout, stderr and the exit status.

use std::path::Path;
use std::process::{Command, Output};

use serde_json::Value;

fn symdex(root: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_symdex"))
        .args(args)
        .current_dir(root)
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to spawn symdex")
}

fn project() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    std::fs::create_dir_all(root.join("cmd")).unwrap();
    std::fs::write(
        root.join("cmd/main.go"),
        "package main\n\nimport \"os\"\n\nfunc main() {\n\tos.Exit(run())\n}\n",
    )
    .unwrap();
    std::fs::write(root.join("util.py"), "def helper(value):\n    return value\n").unwrap();
    std::fs::write(root.join("notes.txt"), "not source\n").unwrap();
    dir
}

fn json_lines(out: &Output) -> Vec<Value> {
    String::from_utf8_lossy(&out.stdout)
        .lines()
        .map(|l| serde_json::from_str(l).expect("valid JSON line"))
        .collect()
}

#[test]
fn extract_json_covers_every_supported_file() {
    let dir = project();
    let out = symdex(dir.path(), &["extract", "--json"]);
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));

    let entries = json_lines(&out);
    let filenames: Vec<&str> = entries
        .iter()
        .filter(|e| e["context"] == "FILENAME")
        .map(|e| e["symbol"].as_str().unwrap())
        .collect();
    assert_eq!(filenames.len(), 2);
    assert!(filenames.contains(&"main"));
    assert!(filenames.contains(&"util"));

    let exit = entries
        .iter()
        .find(|e| e["context"] == "CALL" && e["symbol"] == "Exit")
        .expect("os.Exit call");
    assert_eq!(exit["parent"], "os");
    assert_eq!(exit["directory"], "cmd");
    assert_eq!(exit["filename"], "main.go");
    assert_eq!(exit["line"], 6);
    assert!(exit.get("scope").is_none());
}

#[test]
fn kind_filter_limits_output() {
    let dir = project();
    let out = symdex(dir.path(), &["extract", "util.py", "--json", "--kind", "function,argument"]);
    assert!(out.status.success());

    let entries = json_lines(&out);
    let pairs: Vec<(&str, &str)> = entries
        .iter()
        .map(|e| (e["context"].as_str().unwrap(), e["symbol"].as_str().unwrap()))
        .collect();
    assert_eq!(pairs, vec![("FUNCTION", "helper"), ("ARGUMENT", "value")]);
}

#[test]
fn grep_output_is_one_line_per_entry() {
    let dir = project();
    let out = symdex(dir.path(), &["extract", "cmd", "--kind", "import"]);
    assert!(out.status.success());

    let stdout = String::from_utf8_lossy(&out.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines, vec!["cmd/main.go:3:IMPORT os namespace=main"]);
    assert!(!stdout.contains('\x1b'));
}

#[test]
fn unknown_kind_exits_with_usage_code() {
    let dir = project();
    let out = symdex(dir.path(), &["extract", "--kind", "widget"]);
    assert_eq!(out.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&out.stderr).starts_with("error:"));
    assert!(out.stdout.is_empty());
}

#[test]
fn missing_path_is_an_error_with_hint() {
    let dir = project();
    let out = symdex(dir.path(), &["extract", "nope.go"]);
    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("no such file or directory"));
    assert!(stderr.contains("hint: verify the file or directory exists"));
}

#[test]
fn project_config_is_honored() {
    let dir = project();
    std::fs::create_dir_all(dir.path().join(".symdex")).unwrap();
    std::fs::write(
        dir.path().join(".symdex/config.toml"),
        "[output]\ndefault_format = \"json\"\n\n[ignore]\npatterns = [\"cmd/\"]\n",
    )
    .unwrap();

    let out = symdex(dir.path(), &["extract"]);
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    let entries = json_lines(&out);
    assert!(!entries.is_empty());
    assert!(entries.iter().all(|e| e["filename"] == "util.py"));
}

#[test]
fn languages_lists_extensions() {
    let dir = tempfile::tempdir().unwrap();
    let out = symdex(dir.path(), &["languages"]);
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.lines().any(|l| l == "Go\tgo"));
    assert!(stdout.lines().any(|l| l.starts_with("Python\t") && l.contains("pyi")));
    assert!(stdout.lines().any(|l| l.starts_with("TSX\t") && l.contains("jsx")));
}
