use thiserror::Error;

use crate::core::project::ProjectId;
use crate::orchestration::{ProjectFailure, RunSummary};

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Task join error: {0}")]
    TaskJoin(String),

    #[error("The exec command may only be used with the recursive option")]
    NotRecursive,

    #[error("Cyclic dependency detected between projects: {}", join_ids(.projects))]
    CyclicDependency { projects: Vec<ProjectId> },

    #[error("{}", describe_failures(.failures))]
    RecursiveRunFailed {
        failures: Vec<ProjectFailure>,
        summary: RunSummary,
    },
}

impl Error {
    /// Stable identifier for the error kind, independent of the message.
    pub fn code(&self) -> &'static str {
        match self {
            Error::NotRecursive => "ERR_WSEXEC_NOT_RECURSIVE",
            Error::CyclicDependency { .. } => "ERR_WSEXEC_CYCLIC_DEPENDENCY",
            Error::RecursiveRunFailed { .. } => "ERR_WSEXEC_RECURSIVE_FAIL",
            Error::Validation(_) | Error::Json(_) | Error::TomlParse(_) => {
                "ERR_WSEXEC_INVALID_INPUT"
            }
            Error::Io(_) | Error::TaskJoin(_) => "ERR_WSEXEC_IO",
        }
    }
}

fn join_ids(ids: &[ProjectId]) -> String {
    ids.iter()
        .map(|id| id.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn describe_failures(failures: &[ProjectFailure]) -> String {
    let Some(first) = failures.first() else {
        return "Recursive run failed".to_string();
    };
    let mut msg = format!("{}: {}", first.project, first.kind);
    if failures.len() > 1 {
        let others: Vec<&str> = failures[1..].iter().map(|f| f.project.as_str()).collect();
        msg.push_str(&format!(
            " ({} more failed: {})",
            others.len(),
            others.join(", ")
        ));
    }
    msg
}

pub type Result<T> = std::result::Result<T, Error>;
