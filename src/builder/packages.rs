// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Host preparation: virtualenvs, apt repositories and packages.

use crate::builder::environment::Builder;
use crate::constants::commands::{APT_ADD_REPOSITORY, APT_GET, SUDO, VIRTUALENV};
use crate::error::Result;
use crate::juju::client::ClusterClient;
use crate::process::{CommandRunner, CommandSpec};
use std::path::Path;
use tracing::{debug, info, instrument};

impl<R: CommandRunner, C: ClusterClient> Builder<R, C> {
    #[instrument(skip(self))]
    pub async fn build_virtualenv(&self, path: &Path) -> Result<()> {
        let command = CommandSpec::new(VIRTUALENV)
            .arg(path.to_string_lossy().into_owned())
            .quiet();
        self.runner.check(&command).await?;
        Ok(())
    }

    pub async fn add_source(&self, source: &str) -> Result<()> {
        info!("Adding apt source {}", source);
        let command = CommandSpec::new(SUDO).args([APT_ADD_REPOSITORY, "--yes", source]);
        self.runner.check(&command).await?;
        Ok(())
    }

    /// Add every configured source, refreshing the package index afterwards when `update` is set
    pub async fn add_sources(&self, update: bool) -> Result<()> {
        for source in &self.config.sources {
            self.add_source(source).await?;
        }
        if !self.config.sources.is_empty() && update {
            self.apt_update().await?;
        }
        Ok(())
    }

    pub async fn apt_update(&self) -> Result<()> {
        debug!("Updating apt package index");
        let command = CommandSpec::new(SUDO).args([APT_GET, "update", "-qq"]);
        self.runner.check(&command).await?;
        Ok(())
    }

    pub async fn install_packages(&self) -> Result<()> {
        if self.config.packages.is_empty() {
            return Ok(());
        }
        info!("Installing packages: {}", self.config.packages.join(" "));
        let command = CommandSpec::new(SUDO)
            .args([APT_GET, "install", "-qq", "-y"])
            .args(self.config.packages.iter().map(String::as_str));
        self.runner.check(&command).await?;
        Ok(())
    }
}
