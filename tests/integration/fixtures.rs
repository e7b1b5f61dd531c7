//! Test fixtures for integration tests.
//!
//! Provides helpers for:
//! - Creating temporary workspaces with one directory per project
//! - Per-project build scripts that append to a shared output file
//! - Configs for the common run modes

use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

use wsexec::core::project::{Project, WorkspaceGraph};
use wsexec::ExecConfig;

/// A temporary workspace whose projects live in `packages/<name>`.
pub struct TestWorkspace {
    /// The temporary directory containing the workspace.
    pub temp_dir: TempDir,
    /// Path to the workspace root.
    pub path: PathBuf,
    projects: Vec<Project>,
}

impl TestWorkspace {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().to_path_buf();
        fs::create_dir_all(path.join("packages")).expect("Failed to create packages dir");
        Self {
            temp_dir,
            path,
            projects: Vec::new(),
        }
    }

    /// Add a project whose `build.sh` runs `script`.
    pub fn add_project(&mut self, name: &str, deps: &[&str], script: &str) -> &mut Self {
        let root = self.path.join("packages").join(name);
        fs::create_dir_all(&root).expect("Failed to create project dir");
        fs::write(root.join("build.sh"), format!("{}\n", script)).expect("Failed to write build.sh");

        let project = deps
            .iter()
            .fold(Project::new(name, root.clone(), name), |p, dep| p.depends_on(*dep));
        self.projects.push(project);
        self
    }

    /// Add a project whose build appends its package name to the output file.
    pub fn add_appending(&mut self, name: &str, deps: &[&str]) -> &mut Self {
        self.add_project(name, deps, APPEND_NAME)
    }

    pub fn graph(&self) -> WorkspaceGraph {
        WorkspaceGraph::new(self.projects.clone())
    }

    /// Write the graph as JSON with roots relative to the workspace.
    pub fn write_graph_json(&self) -> PathBuf {
        let entries: Vec<serde_json::Value> = self
            .projects
            .iter()
            .map(|p| {
                serde_json::json!({
                    "id": p.id,
                    "root": format!("packages/{}", p.id),
                    "name": p.name,
                    "dependencies": p.dependencies,
                })
            })
            .collect();
        let path = self.path.join("graph.json");
        fs::write(
            &path,
            serde_json::to_string_pretty(&serde_json::json!({ "projects": entries })).unwrap(),
        )
        .expect("Failed to write graph.json");
        path
    }

    /// Lines appended to `output.txt` by project builds, in append order.
    pub fn output(&self) -> Vec<String> {
        fs::read_to_string(self.path.join("output.txt"))
            .map(|s| s.lines().map(str::to_string).collect())
            .unwrap_or_default()
    }

    pub fn read(&self, relative: &str) -> String {
        fs::read_to_string(self.path.join(relative)).expect("Failed to read file")
    }
}

impl Default for TestWorkspace {
    fn default() -> Self {
        Self::new()
    }
}

/// Appends the package name to `<workspace>/output.txt`.
pub const APPEND_NAME: &str = r#"printf '%s\n' "$WSEXEC_PACKAGE_NAME" >> ../../output.txt"#;

/// A recursive config running each project's `build.sh`.
pub fn build_config() -> ExecConfig {
    ExecConfig {
        recursive: true,
        command: vec!["sh".to_string(), "build.sh".to_string()],
        ..ExecConfig::default()
    }
}

/// Position of `name` in the output, panicking if it is missing.
pub fn index_of(output: &[String], name: &str) -> usize {
    output
        .iter()
        .position(|line| line == name)
        .unwrap_or_else(|| panic!("{} missing from output {:?}", name, output))
}
