//! Integration tests for the command line interface

use std::path::PathBuf;
use std::process::Command;

use tempfile::TempDir;

fn specweave() -> Command {
    Command::new(env!("CARGO_BIN_EXE_specweave"))
}

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

#[test]
fn test_patches_command_lists_builtins_and_sets() {
    let output = specweave().arg("patches").output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("flatten-components"));
    assert!(stdout.contains("code-generation"));
}

#[test]
fn test_generators_command() {
    let output = specweave().arg("generators").output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for id in ["default", "go", "java", "kotlin", "python", "csharp", "typescript"] {
        assert!(stdout.contains(id), "missing generator {id}");
    }
    assert!(stdout.contains("template go/default"));
}

#[test]
fn test_merge_to_stdout() {
    let output = specweave()
        .args(["merge", "-i"])
        .arg(fixture("books.yaml"))
        .arg("-i")
        .arg(fixture("authors.yaml"))
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Books API, Authors API"));
}

#[test]
fn test_patch_then_generate() {
    let dir = TempDir::new().unwrap();
    let patched = dir.path().join("patched.json");

    let status = specweave()
        .args(["patch", "-i"])
        .arg(fixture("books.yaml"))
        .args(["--patch-set", "code-generation", "-o"])
        .arg(&patched)
        .status()
        .unwrap();
    assert!(status.success());
    let json: serde_json::Value =
        serde_json::from_slice(&std::fs::read(&patched).unwrap()).unwrap();
    assert_eq!(json["info"]["title"], "Books API");

    let out = dir.path().join("docs");
    let status = specweave()
        .args(["generate", "-l", "default", "-i"])
        .arg(&patched)
        .arg("-o")
        .arg(&out)
        .status()
        .unwrap();
    assert!(status.success());
    assert!(out.join("README.md").exists());
    assert!(out.join(".specweave/FILES").exists());
}

#[test]
fn test_unknown_builtin_fails() {
    let output = specweave()
        .args(["patch", "-i"])
        .arg(fixture("books.yaml"))
        .args(["--patch", "no-such-patch"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("no-such-patch"));
}
