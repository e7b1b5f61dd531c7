//! Process executor for a single project.
//!
//! The `CommandExecutor` spawns the configured command inside a project's
//! root directory with the ambient environment plus project-scoped
//! variables, and reports how the process ended.

use crate::core::outcome::{ExitOutcome, FailureKind};
use crate::core::project::Project;
use crate::util::path_with_bin_dir;
use crate::{wlog_debug, wlog_warn};
use futures::future::BoxFuture;
use futures::FutureExt;
use std::ffi::OsString;
use tokio::process::Command;

/// Environment variable carrying the current project's package name.
pub const PACKAGE_NAME_ENV: &str = "WSEXEC_PACKAGE_NAME";

/// Runs a command for one project.
///
/// Implementations must never panic or return early on process failures:
/// every failure is reported as an [`ExitOutcome::Failed`].
pub trait ProjectExecutor: Send + Sync {
    fn execute<'a>(&'a self, project: &'a Project, command: &'a [String])
        -> BoxFuture<'a, ExitOutcome>;
}

/// Executor backed by `tokio::process::Command`.
///
/// # Example
///
/// ```ignore
/// use wsexec::orchestration::{CommandExecutor, ProjectExecutor};
///
/// let executor = CommandExecutor::new().with_shell_mode(true);
/// let outcome = executor.execute(&project, &["echo hi".to_string()]).await;
/// ```
#[derive(Debug, Clone, Default)]
pub struct CommandExecutor {
    /// Run the joined command through the platform shell.
    shell_mode: bool,
    /// Additional variables exported to every process.
    extra_env: Vec<(String, String)>,
}

impl CommandExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_shell_mode(mut self, shell_mode: bool) -> Self {
        self.shell_mode = shell_mode;
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_env.push((key.into(), value.into()));
        self
    }

    pub fn shell_mode(&self) -> bool {
        self.shell_mode
    }

    /// Build the process for a project, resolving the program against the
    /// project-local PATH.
    ///
    /// Returns the launch failure reason if the program cannot be resolved.
    fn build_command(
        &self,
        project: &Project,
        command: &[String],
    ) -> std::result::Result<Command, String> {
        let path = path_with_bin_dir(&project.root);

        let mut cmd = if self.shell_mode {
            let (shell, flag) = platform_shell();
            let mut cmd = Command::new(shell);
            cmd.arg(flag).arg(command.join(" "));
            cmd
        } else {
            let (program, args) = command
                .split_first()
                .ok_or_else(|| "empty command".to_string())?;
            let resolved = which::which_in(program, Some(&path), &project.root)
                .map_err(|e| format!("{}: {}", program, e))?;
            let mut cmd = Command::new(resolved);
            cmd.args(args);
            cmd
        };

        cmd.current_dir(&project.root)
            .env("PATH", &path)
            .env(PACKAGE_NAME_ENV, &project.name);
        for (key, value) in &self.extra_env {
            cmd.env(key, value);
        }
        Ok(cmd)
    }

    async fn run(&self, project: &Project, command: &[String]) -> ExitOutcome {
        let mut cmd = match self.build_command(project, command) {
            Ok(cmd) => cmd,
            Err(reason) => {
                wlog_warn!("{}: cannot launch command: {}", project.id, reason);
                return ExitOutcome::Failed(FailureKind::LaunchFailed(reason));
            }
        };

        wlog_debug!(
            "{}: running {:?} in {}",
            project.id,
            command,
            project.root.display()
        );

        match cmd.status().await {
            Ok(status) => match status.code() {
                Some(0) => ExitOutcome::Succeeded,
                Some(code) => ExitOutcome::Failed(FailureKind::ExitCode(code)),
                None => ExitOutcome::Failed(FailureKind::Signal),
            },
            Err(e) => {
                wlog_warn!("{}: spawn failed: {}", project.id, e);
                ExitOutcome::Failed(FailureKind::LaunchFailed(e.to_string()))
            }
        }
    }
}

impl ProjectExecutor for CommandExecutor {
    fn execute<'a>(
        &'a self,
        project: &'a Project,
        command: &'a [String],
    ) -> BoxFuture<'a, ExitOutcome> {
        self.run(project, command).boxed()
    }
}

fn platform_shell() -> (OsString, &'static str) {
    if cfg!(windows) {
        let shell = std::env::var_os("ComSpec").unwrap_or_else(|| OsString::from("cmd.exe"));
        (shell, "/C")
    } else {
        (OsString::from("sh"), "-c")
    }
}
