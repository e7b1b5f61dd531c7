//! Tests for the `wsexec` binary.

use std::process::{Command, Output};

use super::fixtures::TestWorkspace;

fn wsexec(ws: &TestWorkspace, args: &[&str]) -> Output {
    let graph = ws.path.join("graph.json");
    let log = ws.path.join("wsexec.log");
    Command::new(env!("CARGO_BIN_EXE_wsexec"))
        .arg("--graph")
        .arg(&graph)
        .arg("--log-file")
        .arg(&log)
        .args(args)
        .env_remove("WSEXEC_LOG")
        .env_remove("WSEXEC_DEBUG")
        .output()
        .expect("Failed to run wsexec")
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn test_cli_requires_recursive() {
    let mut ws = TestWorkspace::new();
    ws.add_appending("project-1", &[]);
    ws.write_graph_json();

    let output = wsexec(&ws, &["sh", "build.sh"]);

    assert!(!output.status.success());
    assert!(stderr(&output).contains("ERR_WSEXEC_NOT_RECURSIVE"));
    assert!(ws.output().is_empty());
}

#[test]
fn test_cli_runs_command_and_writes_summary() {
    let mut ws = TestWorkspace::new();
    ws.add_appending("lib", &[]).add_appending("app", &["lib"]);
    ws.write_graph_json();

    let output = wsexec(&ws, &["-r", "--report-summary", "sh", "build.sh"]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(ws.output(), vec!["lib", "app"]);

    let summary: serde_json::Value =
        serde_json::from_str(&ws.read("wsexec-summary.json")).unwrap();
    let projects = summary["projects"].as_array().unwrap();
    assert_eq!(projects.len(), 2);
    assert!(projects.iter().all(|p| p["state"] == "succeeded"));
}

#[test]
fn test_cli_failure_exit_status_and_summary() {
    let mut ws = TestWorkspace::new();
    ws.add_appending("project-1", &[])
        .add_project("project-2", &[], "exit 2")
        .add_appending("project-3", &[]);
    ws.write_graph_json();

    let output = wsexec(
        &ws,
        &[
            "-r",
            "--no-bail",
            "--workspace-concurrency",
            "1",
            "--report-summary",
            "sh",
            "build.sh",
        ],
    );

    assert!(!output.status.success());
    let err = stderr(&output);
    assert!(err.contains("ERR_WSEXEC_RECURSIVE_FAIL"), "stderr: {}", err);
    assert!(err.contains("project-2"));
    assert_eq!(ws.output(), vec!["project-1", "project-3"]);

    let summary: serde_json::Value =
        serde_json::from_str(&ws.read("wsexec-summary.json")).unwrap();
    let failed = &summary["projects"][1];
    assert_eq!(failed["id"], "project-2");
    assert_eq!(failed["state"], "failed");
}

#[test]
fn test_cli_reads_options_file() {
    let mut ws = TestWorkspace::new();
    ws.add_appending("a-dependent", &["b-dependency"])
        .add_appending("b-dependency", &[]);
    ws.write_graph_json();
    std::fs::write(
        ws.path.join("wsexec.toml"),
        "recursive = true\nsort = false\nconcurrency = 1\ncommand = [\"sh\", \"build.sh\"]\n",
    )
    .unwrap();

    let output = wsexec(&ws, &[]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(ws.output(), vec!["a-dependent", "b-dependency"]);
}
