//! Failure aggregation and bail policy.
//!
//! The `FailureAggregator` owns the run state: one [`TaskOutcome`] per
//! project, the recorded failures, and whether dispatch has been halted.
//! It is owned by a single scheduler loop, so outcome recording is
//! linearized without further locking.

use crate::core::outcome::{ExitOutcome, FailureKind, TaskOutcome};
use crate::core::project::{ProjectId, WorkspaceGraph};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// A project whose command failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectFailure {
    /// The project that failed.
    pub project: ProjectId,
    /// The project's declared package name.
    pub package_name: String,
    /// How the command failed.
    pub kind: FailureKind,
}

/// Final state of one project in a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectReport {
    pub id: ProjectId,
    pub name: String,
    #[serde(flatten)]
    pub outcome: TaskOutcome,
    /// Wall-clock time of the command, absent if it never ran.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

impl ProjectReport {
    /// Whether the project was never dispatched.
    pub fn skipped(&self) -> bool {
        self.outcome == TaskOutcome::Pending
    }
}

/// Per-project results of a run, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub projects: Vec<ProjectReport>,
}

impl RunSummary {
    pub fn get(&self, id: &ProjectId) -> Option<&ProjectReport> {
        self.projects.iter().find(|r| &r.id == id)
    }

    pub fn succeeded_count(&self) -> usize {
        self.count(|o| *o == TaskOutcome::Succeeded)
    }

    pub fn failed_count(&self) -> usize {
        self.count(|o| matches!(o, TaskOutcome::Failed { .. }))
    }

    pub fn skipped_count(&self) -> usize {
        self.count(|o| *o == TaskOutcome::Pending)
    }

    fn count(&self, pred: impl Fn(&TaskOutcome) -> bool) -> usize {
        self.projects.iter().filter(|r| pred(&r.outcome)).count()
    }
}

#[derive(Debug)]
struct Entry {
    name: String,
    outcome: TaskOutcome,
    duration: Option<Duration>,
}

/// Tracks per-project outcomes and applies the bail policy.
///
/// With `bail` set, dispatch stops at the first recorded failure; projects
/// already running still finish and are recorded. Without it, every
/// project is attempted and all failures are reported together.
///
/// # Panics
///
/// Recording an outcome out of lifecycle order (e.g. finishing a project
/// that was never started, or starting one twice) panics.
#[derive(Debug)]
pub struct FailureAggregator {
    bail: bool,
    order: Vec<ProjectId>,
    entries: HashMap<ProjectId, Entry>,
    failures: Vec<ProjectFailure>,
    failed_fast: bool,
}

impl FailureAggregator {
    /// Create an aggregator with every project of the graph pending.
    pub fn new(bail: bool, workspace: &WorkspaceGraph) -> Self {
        let order: Vec<ProjectId> = workspace.ids().cloned().collect();
        let entries = workspace
            .projects
            .iter()
            .map(|p| {
                (
                    p.id.clone(),
                    Entry {
                        name: p.name.clone(),
                        outcome: TaskOutcome::Pending,
                        duration: None,
                    },
                )
            })
            .collect();
        Self {
            bail,
            order,
            entries,
            failures: Vec::new(),
            failed_fast: false,
        }
    }

    pub fn bail(&self) -> bool {
        self.bail
    }

    /// Whether the scheduler may start another project.
    pub fn should_continue_dispatch(&self) -> bool {
        !(self.bail && self.failed_fast)
    }

    /// Current outcome of a project.
    pub fn outcome(&self, id: &ProjectId) -> Option<&TaskOutcome> {
        self.entries.get(id).map(|e| &e.outcome)
    }

    pub fn failures(&self) -> &[ProjectFailure] {
        &self.failures
    }

    /// Number of projects currently running.
    pub fn running_count(&self) -> usize {
        self.entries
            .values()
            .filter(|e| e.outcome == TaskOutcome::Running)
            .count()
    }

    /// Mark a pending project as running.
    pub fn mark_running(&mut self, id: &ProjectId) {
        self.transition(id, TaskOutcome::Running);
    }

    /// Record how a running project finished.
    pub fn record_outcome(&mut self, id: &ProjectId, outcome: ExitOutcome, duration: Duration) {
        if let ExitOutcome::Failed(kind) = &outcome {
            let package_name = self.entries.get(id).map(|e| e.name.clone()).unwrap_or_default();
            self.failures.push(ProjectFailure {
                project: id.clone(),
                package_name,
                kind: kind.clone(),
            });
            self.failed_fast = true;
        }
        self.transition(id, outcome.into());
        if let Some(entry) = self.entries.get_mut(id) {
            entry.duration = Some(duration);
        }
    }

    fn transition(&mut self, id: &ProjectId, next: TaskOutcome) {
        let entry = self
            .entries
            .get_mut(id)
            .unwrap_or_else(|| panic!("project {} is not part of this run", id));
        assert!(
            entry.outcome.can_transition_to(&next),
            "invalid outcome transition for {}: {} -> {}",
            id,
            entry.outcome,
            next
        );
        entry.outcome = next;
    }

    /// Close the run.
    ///
    /// Consumes the aggregator, so it runs exactly once and nothing can be
    /// recorded afterwards. Returns the summary on success, or
    /// [`Error::RecursiveRunFailed`] listing every recorded failure with the
    /// first failing project first.
    pub fn finalize(mut self) -> Result<RunSummary> {
        let projects = self
            .order
            .iter()
            .map(|id| {
                let entry = self
                    .entries
                    .remove(id)
                    .unwrap_or_else(|| panic!("project {} missing from run state", id));
                ProjectReport {
                    id: id.clone(),
                    name: entry.name,
                    outcome: entry.outcome,
                    duration_ms: entry.duration.map(|d| d.as_millis() as u64),
                }
            })
            .collect();
        let summary = RunSummary { projects };

        if self.failures.is_empty() {
            Ok(summary)
        } else {
            Err(Error::RecursiveRunFailed {
                failures: self.failures,
                summary,
            })
        }
    }
}
