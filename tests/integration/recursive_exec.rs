//! End-to-end runs of `recursive_exec` against real `sh` processes.

use super::fixtures::{build_config, index_of, TestWorkspace};
use wsexec::core::outcome::{FailureKind, TaskOutcome};
use wsexec::core::project::{ProjectId, WorkspaceGraph};
use wsexec::{recursive_exec, Error, ExecConfig};

/// Given: a chain c -> b -> a and a diamond-free sibling d
/// When: running with sort enabled
/// Then: every dependency finishes before its dependents start
#[tokio::test]
async fn test_runs_in_dependency_order() {
    let mut ws = TestWorkspace::new();
    ws.add_appending("c", &["b"])
        .add_appending("b", &["a"])
        .add_appending("a", &[])
        .add_appending("d", &[]);

    let summary = recursive_exec(build_config(), &ws.graph()).await.unwrap();

    assert_eq!(summary.succeeded_count(), 4);
    let output = ws.output();
    assert_eq!(output.len(), 4);
    assert!(index_of(&output, "a") < index_of(&output, "b"));
    assert!(index_of(&output, "b") < index_of(&output, "c"));
}

/// Given: projects whose declared names differ from their identifiers
/// When: running a command that prints the package name variable
/// Then: each child process sees its own project's name
#[tokio::test]
async fn test_package_name_is_exported() {
    let mut ws = TestWorkspace::new();
    ws.add_project("app", &[], r#"printf '%s' "$WSEXEC_PACKAGE_NAME" > name.txt"#);
    let mut graph = ws.graph();
    graph.projects[0].name = "@scope/app".to_string();

    recursive_exec(build_config(), &graph).await.unwrap();

    assert_eq!(ws.read("packages/app/name.txt"), "@scope/app");
}

/// Given: three independent projects where the second one fails
/// When: running with bail disabled and one project at a time
/// Then: the others still run and the error names the failed project
#[tokio::test]
async fn test_no_bail_runs_remaining_projects() {
    let mut ws = TestWorkspace::new();
    ws.add_appending("project-1", &[])
        .add_project("project-2", &[], "exit 1")
        .add_appending("project-3", &[]);
    let config = ExecConfig {
        bail: false,
        concurrency: Some(1),
        ..build_config()
    };

    let err = recursive_exec(config, &ws.graph()).await.unwrap_err();

    assert_eq!(err.code(), "ERR_WSEXEC_RECURSIVE_FAIL");
    assert_eq!(ws.output(), vec!["project-1", "project-3"]);
    match err {
        Error::RecursiveRunFailed { failures, summary } => {
            assert_eq!(failures.len(), 1);
            assert_eq!(failures[0].project, ProjectId::new("project-2"));
            assert_eq!(failures[0].kind, FailureKind::ExitCode(1));
            assert_eq!(summary.succeeded_count(), 2);
            assert_eq!(summary.failed_count(), 1);
        }
        other => panic!("unexpected error: {other}"),
    }
}

/// Given: the same workspace with bail enabled
/// When: the second project fails
/// Then: the third project is never started
#[tokio::test]
async fn test_bail_stops_after_first_failure() {
    let mut ws = TestWorkspace::new();
    ws.add_appending("project-1", &[])
        .add_project("project-2", &[], "exit 7")
        .add_appending("project-3", &[]);
    let config = ExecConfig {
        concurrency: Some(1),
        ..build_config()
    };

    let err = recursive_exec(config, &ws.graph()).await.unwrap_err();

    assert_eq!(ws.output(), vec!["project-1"]);
    match err {
        Error::RecursiveRunFailed { failures, summary } => {
            assert_eq!(failures[0].project, ProjectId::new("project-2"));
            assert_eq!(failures[0].kind, FailureKind::ExitCode(7));
            let skipped = summary.get(&ProjectId::new("project-3")).unwrap();
            assert!(skipped.skipped());
        }
        other => panic!("unexpected error: {other}"),
    }
}

/// Given: a dependent declared before its dependency
/// When: running unsorted with one project at a time
/// Then: projects run in declaration order
#[tokio::test]
async fn test_no_sort_keeps_declaration_order() {
    let mut ws = TestWorkspace::new();
    ws.add_appending("a-dependent", &["b-dependency"])
        .add_appending("b-dependency", &[]);
    let config = ExecConfig {
        sort: false,
        concurrency: Some(1),
        ..build_config()
    };

    recursive_exec(config, &ws.graph()).await.unwrap();

    assert_eq!(ws.output(), vec!["a-dependent", "b-dependency"]);
}

#[tokio::test]
async fn test_not_recursive_runs_nothing() {
    let mut ws = TestWorkspace::new();
    ws.add_appending("project-1", &[]);
    let config = ExecConfig {
        recursive: false,
        ..build_config()
    };

    let err = recursive_exec(config, &ws.graph()).await.unwrap_err();

    assert_eq!(err.code(), "ERR_WSEXEC_NOT_RECURSIVE");
    assert!(ws.output().is_empty());
}

#[tokio::test]
async fn test_cycle_runs_nothing() {
    let mut ws = TestWorkspace::new();
    ws.add_appending("x", &["y"])
        .add_appending("y", &["x"])
        .add_appending("z", &[]);

    let err = recursive_exec(build_config(), &ws.graph()).await.unwrap_err();

    assert_eq!(err.code(), "ERR_WSEXEC_CYCLIC_DEPENDENCY");
    match err {
        Error::CyclicDependency { projects } => {
            assert_eq!(projects, vec![ProjectId::new("x"), ProjectId::new("y")]);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(ws.output().is_empty());
}

/// Given: a command that does not exist
/// When: running it across the workspace
/// Then: every project is reported as a launch failure
#[tokio::test]
async fn test_missing_program_is_launch_failure() {
    let mut ws = TestWorkspace::new();
    ws.add_appending("project-1", &[]);
    let config = ExecConfig {
        command: vec!["wsexec-no-such-program".to_string()],
        ..build_config()
    };

    let err = recursive_exec(config, &ws.graph()).await.unwrap_err();

    match err {
        Error::RecursiveRunFailed { failures, .. } => {
            assert!(matches!(failures[0].kind, FailureKind::LaunchFailed(_)));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_shell_mode_runs_command_line() {
    let mut ws = TestWorkspace::new();
    ws.add_appending("one", &[]).add_appending("two", &["one"]);
    let config = ExecConfig {
        shell_mode: true,
        command: vec![r#"printf '%s\n' "$WSEXEC_PACKAGE_NAME" >> ../../output.txt"#.to_string()],
        ..build_config()
    };

    recursive_exec(config, &ws.graph()).await.unwrap();

    assert_eq!(ws.output(), vec!["one", "two"]);
}

/// Given: a graph file with relative project roots
/// When: loading it and running
/// Then: commands run inside the resolved project directories
#[tokio::test]
async fn test_graph_loaded_from_json() {
    let mut ws = TestWorkspace::new();
    ws.add_appending("lib", &[]).add_appending("app", &["lib"]);
    let path = ws.write_graph_json();

    let graph = WorkspaceGraph::load(&path).unwrap();
    assert_eq!(graph.len(), 2);
    assert!(graph.projects.iter().all(|p| p.root.is_absolute()));

    let summary = recursive_exec(build_config(), &graph).await.unwrap();

    assert_eq!(ws.output(), vec!["lib", "app"]);
    assert_eq!(
        summary.get(&ProjectId::new("app")).map(|r| &r.outcome),
        Some(&TaskOutcome::Succeeded)
    );
}
