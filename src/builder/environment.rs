// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Environment lifecycle: bootstrap, deploy, reset and destroy.

use crate::builder::reset::EnvironmentResetter;
use crate::config::{Config, Options};
use crate::constants::commands::{JUJU, JUJU_DEPLOYER};
use crate::error::{BuilderError, Result};
use crate::juju::client::{ClusterClient, EnvironmentHandle};
use crate::process::{CommandRunner, CommandSpec};
use std::path::Path;
use tracing::{debug, info, instrument};

/// Outcome of a bundle deployment
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeployResult {
    /// Deployer exit code, -1 when it was killed by a signal
    pub returncode: i32,
    pub output: Option<String>,
    /// The command line that was run
    pub executable: Vec<String>,
}

pub(super) struct Environment<C> {
    pub(super) handle: EnvironmentHandle,
    pub(super) resetter: EnvironmentResetter<C>,
}

/// Builds out the system-level environment needed to run tests.
pub struct Builder<R, C> {
    pub(super) config: Config,
    pub(super) options: Options,
    pub(super) runner: R,
    pub(super) environment: Option<Environment<C>>,
}

impl<R: CommandRunner, C: ClusterClient> Builder<R, C> {
    /// Create a builder; `connect` is only called when an environment is configured.
    pub fn new<F>(config: Config, options: Options, runner: R, connect: F) -> Self
    where
        F: FnOnce(EnvironmentHandle) -> C,
    {
        let environment = options.environment.as_deref().map(|name| {
            let handle = EnvironmentHandle::new(name);
            Environment {
                resetter: EnvironmentResetter::new(connect(handle.clone())),
                handle,
            }
        });

        Self {
            config,
            options,
            runner,
            environment,
        }
    }

    pub fn environment(&self) -> Option<&EnvironmentHandle> {
        self.environment.as_ref().map(|env| &env.handle)
    }

    /// Make sure the environment is up and connected.
    /// Returns true when it had to be bootstrapped.
    #[instrument(skip(self))]
    pub async fn bootstrap(&mut self) -> Result<bool> {
        let Some(env) = self.environment.as_mut() else {
            return Ok(false);
        };
        debug!("Bootstrap environment: {}", env.handle);
        if self.options.dryrun {
            return Ok(false);
        }

        let probe = CommandSpec::new(JUJU)
            .args(["status", "-e", env.handle.name.as_str()])
            .quiet();
        if self.runner.run(&probe).await?.success() {
            env.resetter.client_mut().connect().await?;
            return Ok(false);
        }

        if !self.config.bootstrap {
            info!(
                "Environment {} is not running and bootstrapping is disabled",
                env.handle
            );
            return Ok(false);
        }

        info!("Bootstrapping Juju environment {}...", env.handle);
        let mut command =
            CommandSpec::new(JUJU).args(["bootstrap", "-e", env.handle.name.as_str()]);
        if let Some(constraints) = &self.options.constraints {
            debug!("Bootstrap constraints: {}", constraints);
            command = command.args(["--constraints", constraints.as_str()]);
        }
        self.runner.check(&command).await?;
        env.resetter.client_mut().connect().await?;

        Ok(true)
    }

    /// Deploy a bundle with juju-deployer, falling back to the configured bundle.
    /// A failing deployment is reported in the result rather than as an error.
    #[instrument(skip(self))]
    pub async fn deploy(&self, bundle: Option<&Path>) -> Result<DeployResult> {
        let Some(bundle) = bundle.or(self.options.bundle.as_deref()) else {
            return Ok(DeployResult::default());
        };
        if !tokio::fs::try_exists(bundle).await.unwrap_or(false) {
            return Err(BuilderError::MissingBundle(bundle.to_path_buf()));
        }
        if self.options.dryrun {
            return Ok(DeployResult::default());
        }

        let mut command = CommandSpec::new(JUJU_DEPLOYER);
        if self.options.verbose {
            command = command.arg("-Wvd");
        }
        command = command
            .arg("-c")
            .arg(bundle.to_string_lossy().into_owned());
        if let Some(deployment) = &self.options.deployment {
            command = command.arg(deployment.as_str());
        }

        debug!("deploy {}", command);
        let output = self.runner.run(&command).await?;

        Ok(DeployResult {
            returncode: output.code.unwrap_or(-1),
            output: Some(output.combined()),
            executable: command.argv(),
        })
    }

    /// Destroy the environment unless it should be kept.
    #[instrument(skip(self))]
    pub async fn destroy(&self) -> Result<()> {
        let Some(env) = self.environment.as_ref() else {
            return Ok(());
        };
        if self.options.no_destroy {
            info!("Keeping environment {}", env.handle);
            return Ok(());
        }

        let command = CommandSpec::new(JUJU).args([
            "destroy-environment",
            "-y",
            env.handle.name.as_str(),
            "--force",
        ]);
        self.runner.check(&command).await?;
        info!("Environment {} destroyed", env.handle);
        Ok(())
    }

    /// Remove all services from the environment and wait until they are gone.
    pub async fn reset(&mut self) -> Result<()> {
        let budget = self.config.reset_budget();
        match self.environment.as_mut() {
            Some(env) => env.resetter.reset(&env.handle, &budget).await,
            None => Ok(()),
        }
    }
}
