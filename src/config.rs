// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::builder::reset::ResetBudget;
use crate::constants::reset::{CONNECTION_RETRY_BUDGET_SECS, DRAIN_TIMEOUT_SECS};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Test configuration loaded from a YAML file
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Bootstrap the environment when it is not running yet
    pub bootstrap: bool,
    /// apt repositories to add before installing packages
    pub sources: Vec<String>,
    pub packages: Vec<String>,
    /// Seconds to keep retrying the reset command
    pub reset_timeout: u64,
    /// Seconds to wait for services to be removed after a reset
    pub drain_timeout: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bootstrap: true,
            sources: Vec::new(),
            packages: Vec::new(),
            reset_timeout: CONNECTION_RETRY_BUDGET_SECS,
            drain_timeout: DRAIN_TIMEOUT_SECS,
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_yaml(&raw).with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn from_yaml(raw: &str) -> Result<Self> {
        if raw.trim().is_empty() {
            return Ok(Config::default());
        }
        serde_yaml::from_str(raw).context("Failed to parse YAML")
    }

    pub fn reset_budget(&self) -> ResetBudget {
        ResetBudget {
            connection_retry: Duration::from_secs(self.reset_timeout),
            drain_timeout: Duration::from_secs(self.drain_timeout),
        }
    }
}

/// Runtime options, from the command line or the environment
#[derive(Debug, Clone, Default, clap::Args)]
pub struct Options {
    /// Juju environment to operate on
    #[arg(short = 'e', long, env = "JUJU_ENV", global = true)]
    pub environment: Option<String>,

    /// Bundle file to deploy
    #[arg(short = 'b', long, global = true)]
    pub bundle: Option<PathBuf>,

    /// Deployment within the bundle
    #[arg(short = 'd', long, global = true)]
    pub deployment: Option<String>,

    /// Constraints passed to juju bootstrap
    #[arg(long, global = true)]
    pub constraints: Option<String>,

    /// Log what would be done without touching the environment
    #[arg(short = 'n', long, global = true)]
    pub dryrun: bool,

    /// Keep the environment on destroy
    #[arg(long, global = true)]
    pub no_destroy: bool,

    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,
}
