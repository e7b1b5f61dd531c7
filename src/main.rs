use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use tokio::sync::mpsc;

use wsexec::config::ExecConfig;
use wsexec::log::LogOptions;
use wsexec::orchestration::{RecursiveRunner, RunSummary, SchedulerEvent};
use wsexec::{wlog, wlog_error, wlog_trace, Error, Result, WorkspaceGraph};

/// File written next to the graph when `--report-summary` is set.
const SUMMARY_FILE: &str = "wsexec-summary.json";

/// wsexec - run a command in every selected workspace project
#[derive(Parser, Debug)]
#[command(name = "wsexec")]
#[command(version, about, long_about = None)]
#[command(
    after_help = "ENVIRONMENT:\n    WSEXEC_DEBUG=1        Enable debug logging (alternative to --debug)\n    WSEXEC_LOG=<level>    Log level: error, warn, info, debug, trace"
)]
pub struct Cli {
    /// Run the command in every selected project
    #[arg(short = 'r', long)]
    pub recursive: bool,

    /// Workspace graph (JSON) produced by project selection
    #[arg(long, default_value = "wsexec-graph.json")]
    pub graph: PathBuf,

    /// Ignore dependency order between projects
    #[arg(long)]
    pub no_sort: bool,

    /// Keep starting projects after a failure
    #[arg(long)]
    pub no_bail: bool,

    /// Maximum number of projects running at once (0 = unbounded)
    #[arg(long)]
    pub workspace_concurrency: Option<usize>,

    /// Run the command through the platform shell
    #[arg(short = 'c', long)]
    pub shell_mode: bool,

    /// Write a JSON summary of every project's outcome
    #[arg(long)]
    pub report_summary: bool,

    /// Enable debug logging (writes to ~/.wsexec/wsexec.log)
    #[arg(short = 'd', long)]
    pub debug: bool,

    /// Write the log somewhere other than ~/.wsexec/wsexec.log
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Command and arguments to run in each project
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub command: Vec<String>,
}

impl Cli {
    fn workspace_dir(&self) -> PathBuf {
        match self.graph.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    /// Apply command-line flags on top of the file config.
    fn apply(&self, mut config: ExecConfig) -> ExecConfig {
        config.recursive |= self.recursive;
        config.shell_mode |= self.shell_mode;
        config.report_summary |= self.report_summary;
        if self.no_sort {
            config.sort = false;
        }
        if self.no_bail {
            config.bail = false;
        }
        if self.workspace_concurrency.is_some() {
            config.concurrency = self.workspace_concurrency;
        }
        if !self.command.is_empty() {
            config.command = self.command.clone();
        }
        config
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    wsexec::log::init(LogOptions {
        debug: cli.debug,
        path: cli.log_file.clone(),
    });
    wlog!("wsexec starting: graph={}", cli.graph.display());

    match run(&cli).await {
        Ok(summary) => {
            eprintln!(
                "Done: {} project(s) succeeded",
                summary.succeeded_count()
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            wlog_error!("{}: {}", e.code(), e);
            eprintln!("{} {}", e.code(), e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli) -> Result<RunSummary> {
    let workspace_dir = cli.workspace_dir();
    let config = cli.apply(ExecConfig::load(&workspace_dir)?);
    if !config.recursive {
        return Err(Error::NotRecursive);
    }

    let graph = WorkspaceGraph::load(&cli.graph)?;
    let report_summary = config.report_summary;

    let (event_tx, event_rx) = mpsc::channel(256);
    let printer = tokio::spawn(print_events(event_rx));

    let runner = RecursiveRunner::new(config).with_events(event_tx);
    let result = runner.run(&graph).await;
    drop(runner);
    let _ = printer.await;

    if report_summary {
        let summary = match &result {
            Ok(summary) => Some(summary),
            Err(Error::RecursiveRunFailed { summary, .. }) => Some(summary),
            Err(_) => None,
        };
        if let Some(summary) = summary {
            write_summary(&workspace_dir, summary).await?;
        }
    }

    result
}

async fn print_events(mut event_rx: mpsc::Receiver<SchedulerEvent>) {
    while let Some(event) = event_rx.recv().await {
        wlog_trace!("{:?}", event);
        match event {
            SchedulerEvent::ProjectStarted { project } => {
                eprintln!("{}: started", project);
            }
            SchedulerEvent::ProjectSucceeded { project, duration } => {
                eprintln!("{}: done in {:.1}s", project, duration.as_secs_f64());
            }
            SchedulerEvent::ProjectFailed { project, kind } => {
                eprintln!("{}: {}", project, kind);
            }
            SchedulerEvent::DispatchHalted { remaining } => {
                eprintln!("Stopping after failure, {} project(s) not started", remaining);
            }
            SchedulerEvent::RunFinished => {}
        }
    }
}

async fn write_summary(dir: &Path, summary: &RunSummary) -> Result<()> {
    let path = dir.join(SUMMARY_FILE);
    tokio::fs::write(&path, serde_json::to_string_pretty(summary)?).await?;
    wlog!("Summary written to {}", path.display());
    Ok(())
}
