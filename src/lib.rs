//! Recursive multi-project command runner for workspaces.
//!
//! Given a set of selected workspace projects and their in-workspace
//! dependencies, `wsexec` runs one command in every project: in dependency
//! order, with bounded concurrency, and with either bail-on-first-failure
//! or run-everything failure handling.

pub mod config;
pub mod core;
pub mod error;
pub mod log;
pub mod orchestration;
pub mod util;

pub use config::ExecConfig;
pub use crate::core::{Project, ProjectId, WorkspaceGraph};
pub use error::{Error, Result};
pub use orchestration::{recursive_exec, RecursiveRunner, RunSummary};
