//! Recursive exec entry point.
//!
//! `RecursiveRunner` ties the pieces together: it checks the invocation
//! guard, builds the execution plan, runs the scheduler and finalizes the
//! failure aggregator into a single result.

use crate::config::ExecConfig;
use crate::core::dag::ProjectDAG;
use crate::core::project::WorkspaceGraph;
use crate::error::{Error, Result};
use crate::orchestration::aggregator::{FailureAggregator, RunSummary};
use crate::orchestration::executor::{CommandExecutor, ProjectExecutor};
use crate::orchestration::scheduler::{Scheduler, SchedulerEvent};
use crate::{wlog, wlog_debug};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Runs one command across all selected workspace projects.
pub struct RecursiveRunner {
    config: ExecConfig,
    executor: Arc<dyn ProjectExecutor>,
    event_tx: Option<mpsc::Sender<SchedulerEvent>>,
}

impl RecursiveRunner {
    /// Create a runner that spawns real processes per the config.
    pub fn new(config: ExecConfig) -> Self {
        let executor = CommandExecutor::new().with_shell_mode(config.shell_mode);
        Self {
            config,
            executor: Arc::new(executor),
            event_tx: None,
        }
    }

    /// Replace the executor, e.g. with a test double.
    pub fn with_executor(mut self, executor: Arc<dyn ProjectExecutor>) -> Self {
        self.executor = executor;
        self
    }

    /// Forward scheduler events to the given channel.
    ///
    /// Events that do not fit in the channel are dropped; the run never
    /// waits for the receiver.
    pub fn with_events(mut self, event_tx: mpsc::Sender<SchedulerEvent>) -> Self {
        self.event_tx = Some(event_tx);
        self
    }

    pub fn config(&self) -> &ExecConfig {
        &self.config
    }

    /// Execute the command once per project.
    ///
    /// # Errors
    ///
    /// - [`Error::NotRecursive`] if the config is not marked recursive
    /// - [`Error::Validation`] for an empty command or duplicate projects
    /// - [`Error::CyclicDependency`] if sorting finds a cycle
    /// - [`Error::RecursiveRunFailed`] if any project failed
    pub async fn run(&self, workspace: &WorkspaceGraph) -> Result<RunSummary> {
        if !self.config.recursive {
            return Err(Error::NotRecursive);
        }
        if self.config.command.is_empty() {
            return Err(Error::Validation("No command given".to_string()));
        }

        let plan = ProjectDAG::from_graph(workspace)?.build_plan(self.config.sort)?;
        let mut aggregator = FailureAggregator::new(self.config.bail, workspace);
        if plan.is_empty() {
            wlog_debug!("Empty workspace graph, nothing to run");
            return aggregator.finalize();
        }

        let concurrency = self.config.effective_concurrency();
        wlog!(
            "Running {:?} in {} projects ({} groups, concurrency={}, sort={}, bail={})",
            self.config.command,
            plan.project_count(),
            plan.groups().len(),
            concurrency,
            self.config.sort,
            self.config.bail
        );

        let mut scheduler = Scheduler::new(Arc::clone(&self.executor), concurrency);
        if let Some(tx) = &self.event_tx {
            scheduler = scheduler.with_events(tx.clone());
        }
        scheduler
            .run(&plan, workspace, &self.config.command, &mut aggregator)
            .await?;

        let result = aggregator.finalize();
        match &result {
            Ok(summary) => wlog!("All {} projects succeeded", summary.succeeded_count()),
            Err(e) => wlog!("Recursive run failed: {}", e),
        }
        result
    }
}

/// Run the configured command across `workspace` with real processes.
pub async fn recursive_exec(config: ExecConfig, workspace: &WorkspaceGraph) -> Result<RunSummary> {
    RecursiveRunner::new(config).run(workspace).await
}
