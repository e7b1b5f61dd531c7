//! Per-project task outcomes.
//!
//! Outcomes move forward only: pending, then running, then succeeded or
//! failed. A finished outcome is never revisited.

use serde::{Deserialize, Serialize};

/// Why a project's command did not succeed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "detail")]
pub enum FailureKind {
    /// The process exited with a non-zero status code.
    ExitCode(i32),
    /// The process was terminated by a signal and has no exit code.
    Signal,
    /// The process could not be started at all.
    LaunchFailed(String),
    /// The executor itself panicked while running the project.
    Panicked(String),
}

impl FailureKind {
    /// Exit code to report for this failure, if the process produced one.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            FailureKind::ExitCode(code) => Some(*code),
            _ => None,
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureKind::ExitCode(code) => write!(f, "exited with code {}", code),
            FailureKind::Signal => write!(f, "terminated by signal"),
            FailureKind::LaunchFailed(reason) => write!(f, "failed to launch: {}", reason),
            FailureKind::Panicked(reason) => write!(f, "executor panicked: {}", reason),
        }
    }
}

/// Result reported by an executor for a single project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitOutcome {
    Succeeded,
    Failed(FailureKind),
}

/// Lifecycle state of one project's task within a run.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state")]
pub enum TaskOutcome {
    /// Not dispatched (yet, or ever if the run was aborted).
    #[default]
    Pending,
    /// The command is currently running.
    Running,
    /// The command exited with status zero.
    Succeeded,
    /// The command failed.
    Failed { kind: FailureKind },
}

impl TaskOutcome {
    pub fn is_finished(&self) -> bool {
        matches!(self, TaskOutcome::Succeeded | TaskOutcome::Failed { .. })
    }

    /// Whether moving from `self` to `next` keeps the lifecycle monotonic.
    pub fn can_transition_to(&self, next: &TaskOutcome) -> bool {
        matches!(
            (self, next),
            (TaskOutcome::Pending, TaskOutcome::Running)
                | (TaskOutcome::Running, TaskOutcome::Succeeded)
                | (TaskOutcome::Running, TaskOutcome::Failed { .. })
        )
    }
}

impl From<ExitOutcome> for TaskOutcome {
    fn from(outcome: ExitOutcome) -> Self {
        match outcome {
            ExitOutcome::Succeeded => TaskOutcome::Succeeded,
            ExitOutcome::Failed(kind) => TaskOutcome::Failed { kind },
        }
    }
}

impl std::fmt::Display for TaskOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskOutcome::Pending => write!(f, "pending"),
            TaskOutcome::Running => write!(f, "running"),
            TaskOutcome::Succeeded => write!(f, "succeeded"),
            TaskOutcome::Failed { kind } => write!(f, "failed: {}", kind),
        }
    }
}
