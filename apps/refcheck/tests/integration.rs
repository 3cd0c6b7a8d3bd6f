//! Integration tests for refcheck CLI

use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let reference = dir.path().join("reference");
        std::fs::create_dir_all(reference.join("docs")).unwrap();
        std::fs::write(reference.join("docs/report.pdf"), b"%PDF-1.7 report").unwrap();
        std::fs::write(reference.join("readme.txt"), b"read me").unwrap();

        let config = format!(
            r#"
[paths]
reference_dir = "{}"
staging_dir = "{}"
accepted_dir = "{}"
"#,
            toml_path(&reference),
            toml_path(&dir.path().join("uploads/.staging")),
            toml_path(&dir.path().join("uploads")),
        );
        std::fs::write(dir.path().join("config.toml"), config).unwrap();
        Self { dir }
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn run(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_refcheck"))
            .arg("--config")
            .arg(self.path().join("config.toml"))
            .args(args)
            .env_remove("RUST_LOG")
            .output()
            .expect("Failed to execute refcheck")
    }
}

fn toml_path(path: &Path) -> String {
    path.display().to_string().replace('\\', "\\\\")
}

fn json(output: &Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).expect("stdout is JSON")
}

#[test]
fn test_cli_help() {
    let output = Command::new(env!("CARGO_BIN_EXE_refcheck"))
        .arg("--help")
        .output()
        .expect("Failed to execute refcheck");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("index"));
    assert!(stdout.contains("list"));
    assert!(stdout.contains("verify"));
}

#[test]
fn test_cli_invalid_command() {
    let output = Command::new(env!("CARGO_BIN_EXE_refcheck"))
        .arg("invalid-command")
        .output()
        .expect("Failed to execute refcheck");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unrecognized subcommand"));
}

#[test]
fn test_index_export() {
    let ws = Workspace::new();
    let export = ws.path().join("hashes.json");

    let output = ws.run(&["--json", "index", "--export", export.to_str().unwrap()]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(json(&output)["entries"], 2);

    let exported: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&export).unwrap()).unwrap();
    assert_eq!(exported["readme.txt"]["name"], "readme.txt");
    assert_eq!(exported["report.pdf"]["hash"].as_str().unwrap().len(), 64);
}

#[test]
fn test_list_json() {
    let ws = Workspace::new();

    let output = ws.run(&["--json", "list"]);
    assert!(output.status.success());

    let value = json(&output);
    let names: Vec<_> = value["files"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, ["readme.txt", "report.pdf"]);
}

#[test]
fn test_verify_accepts_exact_copy() {
    let ws = Workspace::new();
    let copy = ws.path().join("report.pdf");
    std::fs::write(&copy, b"%PDF-1.7 report").unwrap();

    let output = ws.run(&["--json", "verify", copy.to_str().unwrap()]);
    assert!(output.status.success());
    assert_eq!(json(&output)["results"][0]["status"], "accepted");
    assert!(ws.path().join("uploads/report.pdf").exists());
}

#[test]
fn test_verify_rejects_altered_copy() {
    let ws = Workspace::new();
    let copy = ws.path().join("altered.pdf");
    std::fs::write(&copy, b"%PDF-1.7 report\n").unwrap();

    let output = ws.run(&["--json", "verify", "--name", "report.pdf", copy.to_str().unwrap()]);
    assert!(!output.status.success());

    let value = json(&output);
    assert_eq!(value["results"][0]["status"], "rejected");
    assert_eq!(value["results"][0]["code"], "upload.hash_mismatch");
    assert!(!ws.path().join("uploads/report.pdf").exists());
}

#[test]
fn test_missing_reference_dir_is_fatal() {
    let ws = Workspace::new();
    let missing = ws.path().join("nowhere");

    let output = ws.run(&["--reference-dir", missing.to_str().unwrap(), "list"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("index.root_unreadable"), "{stderr}");
}
