//! Orchestration layer for recursive workspace execution.
//!
//! This module provides the process executor, the failure aggregator with
//! its bail policy, the bounded-concurrency scheduler, and the runner that
//! wires them together behind the invocation guard.

mod aggregator;
mod executor;
mod runner;
mod scheduler;

pub use aggregator::{FailureAggregator, ProjectFailure, ProjectReport, RunSummary};
pub use executor::{CommandExecutor, ProjectExecutor, PACKAGE_NAME_ENV};
pub use runner::{recursive_exec, RecursiveRunner};
pub use scheduler::{Scheduler, SchedulerEvent};
