//! Workspace project model.
//!
//! Projects are produced by an external selection step and handed to the
//! runner as a [`WorkspaceGraph`]. They are never mutated during a run.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Identifier of a selected project, unique within a run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(pub String);

impl ProjectId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ProjectId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for ProjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single selected workspace project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    /// Unique identifier for this project.
    pub id: ProjectId,
    /// Root directory; commands run with this as their working directory.
    pub root: PathBuf,
    /// Declared package name, exported to child processes.
    pub name: String,
    /// Dependencies on other projects. Entries that are not part of the
    /// graph are out-of-workspace and ignored for ordering.
    #[serde(default)]
    pub dependencies: Vec<ProjectId>,
}

impl Project {
    pub fn new(id: impl Into<String>, root: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            id: ProjectId::new(id),
            root: root.into(),
            name: name.into(),
            dependencies: Vec::new(),
        }
    }

    /// Builder-style helper to add a dependency.
    pub fn depends_on(mut self, id: impl Into<String>) -> Self {
        self.dependencies.push(ProjectId::new(id));
        self
    }
}

/// The selected projects of a workspace, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceGraph {
    #[serde(default)]
    pub projects: Vec<Project>,
}

impl WorkspaceGraph {
    pub fn new(projects: Vec<Project>) -> Self {
        Self { projects }
    }

    /// Load a graph from a JSON file.
    ///
    /// Relative project roots are resolved against the directory containing
    /// the file.
    pub fn load(path: &Path) -> Result<Self> {
        let mut graph: Self = serde_json::from_str(&fs::read_to_string(path)?)?;
        let base = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let base = if base.as_os_str().is_empty() {
            std::env::current_dir()?
        } else if base.is_relative() {
            std::env::current_dir()?.join(base)
        } else {
            base
        };
        graph.resolve_roots(&base);
        Ok(graph)
    }

    /// Make every project root absolute by joining relative ones onto `base`.
    pub fn resolve_roots(&mut self, base: &Path) {
        for project in &mut self.projects {
            if project.root.is_relative() {
                project.root = base.join(&project.root);
            }
        }
    }

    /// Reject graphs where a project identifier appears more than once.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::with_capacity(self.projects.len());
        for project in &self.projects {
            if !seen.insert(&project.id) {
                return Err(Error::Validation(format!(
                    "Project {} appears more than once in the workspace graph",
                    project.id
                )));
            }
        }
        Ok(())
    }

    pub fn get(&self, id: &ProjectId) -> Option<&Project> {
        self.projects.iter().find(|p| &p.id == id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &ProjectId> {
        self.projects.iter().map(|p| &p.id)
    }

    pub fn len(&self) -> usize {
        self.projects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }
}
