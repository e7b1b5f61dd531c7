//! Scheduler for bounded, graph-ordered project execution.
//!
//! The Scheduler walks the execution plan group by group, dispatching
//! projects to the executor while respecting the concurrency limit and the
//! aggregator's bail policy. A group starts only after every project of the
//! previous group has finished.

use crate::core::dag::ExecutionPlan;
use crate::core::outcome::{ExitOutcome, FailureKind};
use crate::core::project::{Project, ProjectId, WorkspaceGraph};
use crate::error::{Error, Result};
use crate::orchestration::aggregator::FailureAggregator;
use crate::orchestration::executor::ProjectExecutor;
use futures::FutureExt;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::task::JoinSet;

/// Events emitted by the scheduler for project lifecycle changes.
///
/// These events allow callers (like the CLI) to report progress without
/// the scheduler printing anything itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedulerEvent {
    /// A project's command has been dispatched.
    ProjectStarted {
        /// The project that was started.
        project: ProjectId,
    },
    /// A project's command exited successfully.
    ProjectSucceeded {
        /// The project that succeeded.
        project: ProjectId,
        /// How long the command ran.
        duration: Duration,
    },
    /// A project's command failed.
    ProjectFailed {
        /// The project that failed.
        project: ProjectId,
        /// How the command failed.
        kind: FailureKind,
    },
    /// The bail policy stopped further dispatch.
    DispatchHalted {
        /// Projects that will not be started.
        remaining: usize,
    },
    /// Every dispatched project has finished.
    RunFinished,
}

/// Result of one spawned project task.
type Finished = (ProjectId, ExitOutcome, Duration);

/// Bounded-concurrency dispatcher for an execution plan.
///
/// # Example
///
/// ```ignore
/// use std::sync::Arc;
/// use tokio::sync::mpsc;
/// use wsexec::orchestration::{CommandExecutor, FailureAggregator, Scheduler};
///
/// let (event_tx, mut event_rx) = mpsc::channel(100);
/// let mut scheduler = Scheduler::new(Arc::new(CommandExecutor::new()), 4)
///     .with_events(event_tx);
/// let mut aggregator = FailureAggregator::new(true, &graph);
/// scheduler.run(&plan, &graph, &command, &mut aggregator).await?;
/// let summary = aggregator.finalize()?;
/// ```
pub struct Scheduler {
    /// Executor used to run each project's command.
    executor: Arc<dyn ProjectExecutor>,
    /// Maximum number of projects running at once; 0 means unbounded.
    max_concurrent: usize,
    /// Channel for emitting scheduler events.
    event_tx: Option<mpsc::Sender<SchedulerEvent>>,
    /// Number of projects dispatched so far.
    dispatched: usize,
}

impl Scheduler {
    /// Create a new scheduler.
    ///
    /// # Arguments
    ///
    /// * `executor` - Runs the command for one project
    /// * `max_concurrent` - Concurrency limit, `0` for unbounded
    pub fn new(executor: Arc<dyn ProjectExecutor>, max_concurrent: usize) -> Self {
        Self {
            executor,
            max_concurrent,
            event_tx: None,
            dispatched: 0,
        }
    }

    /// Attach a channel that receives [`SchedulerEvent`]s.
    pub fn with_events(mut self, event_tx: mpsc::Sender<SchedulerEvent>) -> Self {
        self.event_tx = Some(event_tx);
        self
    }

    /// Number of projects dispatched so far.
    pub fn dispatched(&self) -> usize {
        self.dispatched
    }

    fn has_capacity(&self, in_flight: usize) -> bool {
        self.max_concurrent == 0 || in_flight < self.max_concurrent
    }

    /// Events are dropped when the channel is full or closed, so a slow or
    /// absent reader never holds up dispatch.
    fn emit(&self, event: SchedulerEvent) {
        if let Some(tx) = &self.event_tx {
            let _ = tx.try_send(event);
        }
    }

    /// Run the plan to completion.
    ///
    /// Every outcome is recorded in `aggregator`; the caller finalizes it.
    /// Returns once every dispatched project has finished and either the
    /// plan is exhausted or the aggregator halted dispatch.
    ///
    /// # Errors
    ///
    /// Returns an error if a plan entry is missing from `workspace`, or if a
    /// spawned task could not be joined.
    pub async fn run(
        &mut self,
        plan: &ExecutionPlan,
        workspace: &WorkspaceGraph,
        command: &[String],
        aggregator: &mut FailureAggregator,
    ) -> Result<()> {
        let command: Arc<[String]> = command.into();
        let total = plan.project_count();
        let projects: HashMap<&ProjectId, &Project> =
            workspace.projects.iter().map(|p| (&p.id, p)).collect();

        for group in plan.groups() {
            if !aggregator.should_continue_dispatch() {
                break;
            }
            self.run_group(group, &projects, &command, aggregator).await?;
        }

        if !aggregator.should_continue_dispatch() && self.dispatched < total {
            self.emit(SchedulerEvent::DispatchHalted {
                remaining: total - self.dispatched,
            });
        }
        self.emit(SchedulerEvent::RunFinished);
        Ok(())
    }

    /// Dispatch one ready group and wait for all of its in-flight projects.
    async fn run_group(
        &mut self,
        group: &[ProjectId],
        projects: &HashMap<&ProjectId, &Project>,
        command: &Arc<[String]>,
        aggregator: &mut FailureAggregator,
    ) -> Result<()> {
        let mut queue = group.iter();
        let mut in_flight: JoinSet<Finished> = JoinSet::new();
        let mut join_error = None;

        loop {
            while join_error.is_none()
                && self.has_capacity(in_flight.len())
                && aggregator.should_continue_dispatch()
            {
                let Some(id) = queue.next() else {
                    break;
                };
                let Some(project) = projects.get(id) else {
                    join_error = Some(Error::Validation(format!(
                        "Project {} is in the plan but not in the workspace graph",
                        id
                    )));
                    break;
                };
                self.dispatch(&mut in_flight, (*project).clone(), Arc::clone(command), aggregator);
            }

            let Some(joined) = in_flight.join_next().await else {
                break;
            };
            match joined {
                Ok((id, outcome, duration)) => {
                    self.complete(&id, outcome, duration, aggregator);
                }
                // The task body cannot panic, so this only happens if the
                // runtime is shutting down. Keep draining the other tasks.
                Err(e) => {
                    join_error.get_or_insert(Error::TaskJoin(e.to_string()));
                }
            }
        }

        match join_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn dispatch(
        &mut self,
        in_flight: &mut JoinSet<Finished>,
        project: Project,
        command: Arc<[String]>,
        aggregator: &mut FailureAggregator,
    ) {
        aggregator.mark_running(&project.id);
        self.dispatched += 1;
        self.emit(SchedulerEvent::ProjectStarted {
            project: project.id.clone(),
        });

        let executor = Arc::clone(&self.executor);
        in_flight.spawn(async move {
            let started = Instant::now();
            let outcome = AssertUnwindSafe(executor.execute(&project, &command))
                .catch_unwind()
                .await
                .unwrap_or_else(|payload| {
                    ExitOutcome::Failed(FailureKind::Panicked(panic_message(&*payload)))
                });
            (project.id, outcome, started.elapsed())
        });
    }

    fn complete(
        &self,
        id: &ProjectId,
        outcome: ExitOutcome,
        duration: Duration,
        aggregator: &mut FailureAggregator,
    ) {
        let event = match &outcome {
            ExitOutcome::Succeeded => SchedulerEvent::ProjectSucceeded {
                project: id.clone(),
                duration,
            },
            ExitOutcome::Failed(kind) => SchedulerEvent::ProjectFailed {
                project: id.clone(),
                kind: kind.clone(),
            },
        };
        aggregator.record_outcome(id, outcome, duration);
        self.emit(event);
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
