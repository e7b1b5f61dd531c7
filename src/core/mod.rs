//! Core domain models for recursive workspace execution.
//!
//! This module contains the workspace project model, per-project task
//! outcomes, and the dependency DAG that produces execution plans.

pub mod dag;
pub mod outcome;
pub mod project;

pub use dag::{ExecutionPlan, PlanKind, ProjectDAG};
pub use outcome::{ExitOutcome, FailureKind, TaskOutcome};
pub use project::{Project, ProjectId, WorkspaceGraph};
