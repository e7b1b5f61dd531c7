use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::util::default_concurrency;
use crate::{wlog_debug, Result};

/// Name of the optional options file in the workspace root.
pub const CONFIG_FILE: &str = "wsexec.toml";

/// Options recognized by a recursive exec run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecConfig {
    /// Must be set for the run to proceed.
    pub recursive: bool,
    /// Run projects in dependency order.
    pub sort: bool,
    /// Stop starting new projects after the first failure.
    pub bail: bool,
    /// Maximum concurrent projects. Unset uses the available parallelism,
    /// `0` means unbounded.
    pub concurrency: Option<usize>,
    /// Command and arguments to run in each project.
    pub command: Vec<String>,
    /// Run the command through the platform shell.
    pub shell_mode: bool,
    /// Write a JSON summary of every project's outcome.
    pub report_summary: bool,
}

impl Default for ExecConfig {
    fn default() -> Self {
        Self {
            recursive: false,
            sort: true,
            bail: true,
            concurrency: None,
            command: Vec::new(),
            shell_mode: false,
            report_summary: false,
        }
    }
}

impl ExecConfig {
    pub fn config_path(dir: &Path) -> PathBuf {
        dir.join(CONFIG_FILE)
    }

    /// Concurrency limit handed to the scheduler.
    pub fn effective_concurrency(&self) -> usize {
        self.concurrency.unwrap_or_else(default_concurrency)
    }

    /// Load options from `<dir>/wsexec.toml`, falling back to defaults when
    /// the file does not exist.
    pub fn load(dir: &Path) -> Result<Self> {
        let path = Self::config_path(dir);
        wlog_debug!("ExecConfig::load path={}", path.display());
        if !path.exists() {
            wlog_debug!("Config file not found, using defaults");
            return Ok(Self::default());
        }
        let config: Self = toml::from_str(&fs::read_to_string(&path)?)?;
        wlog_debug!(
            "Config loaded: sort={}, bail={}, concurrency={:?}, shell_mode={}",
            config.sort,
            config.bail,
            config.concurrency,
            config.shell_mode
        );
        Ok(config)
    }
}
