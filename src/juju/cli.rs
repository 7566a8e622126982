// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Cluster client backed by the `juju` command line

use crate::constants::commands::JUJU;
use crate::constants::juju::{
    COMMAND_TIMEOUT_SECS, STALE_CONNECTION_MARKERS, UNIT_POLL_INTERVAL_SECS,
    UNIT_REMOVAL_TIMEOUT_SECS,
};
use crate::error::{ClientError, ClientResult};
use crate::juju::client::{ClusterClient, EnvironmentHandle};
use crate::juju::status::StatusSnapshot;
use crate::process::{CommandOutput, CommandRunner, CommandSpec};
use async_trait::async_trait;
use std::time::Duration;
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, info, instrument, warn};

/// Drives an environment through `juju` subcommands.
///
/// Every subcommand opens its own API connection, so the session here is a
/// flag set by a successful `connect` and cleared when juju reports that the
/// connection was shut down.
pub struct JujuCli<R> {
    env: EnvironmentHandle,
    runner: R,
    connected: bool,
    command_timeout: Duration,
}

impl<R: CommandRunner> JujuCli<R> {
    pub fn new(env: EnvironmentHandle, runner: R) -> Self {
        Self {
            env,
            runner,
            connected: false,
            command_timeout: Duration::from_secs(COMMAND_TIMEOUT_SECS),
        }
    }

    pub fn with_command_timeout(mut self, command_timeout: Duration) -> Self {
        self.command_timeout = command_timeout;
        self
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    fn command(&self, subcommand: &str) -> CommandSpec {
        CommandSpec::new(JUJU)
            .arg(subcommand)
            .args(["-e", self.env.name.as_str()])
    }

    fn ensure_connected(&self) -> ClientResult<()> {
        if self.connected {
            Ok(())
        } else {
            Err(ClientError::ConnectionClosed(format!(
                "not connected to environment {}",
                self.env
            )))
        }
    }

    /// Run a juju command and return its stdout
    async fn execute(&mut self, command: CommandSpec) -> ClientResult<String> {
        let output = match timeout(self.command_timeout, self.runner.run(&command)).await {
            Err(_) => {
                return Err(ClientError::Timeout(format!(
                    "`{}` did not finish within {} seconds",
                    command,
                    self.command_timeout.as_secs()
                )))
            }
            Ok(Err(e)) => {
                return Err(ClientError::Other(format!(
                    "Failed to run `{}`: {}",
                    command, e
                )))
            }
            Ok(Ok(output)) => output,
        };

        if output.success() {
            if !output.stderr.is_empty() {
                debug!("{} wrote to stderr: {}", command, output.stderr.trim());
            }
            return Ok(output.stdout);
        }

        let err = classify_failure(&command, &output);
        if err.is_stale_connection() {
            warn!("Connection to environment {} was shut down", self.env);
            self.connected = false;
        }
        Err(err)
    }

    async fn query_status(&mut self) -> ClientResult<StatusSnapshot> {
        let command = self.command("status").args(["--format", "json"]);
        let raw = self.execute(command).await?;
        serde_json::from_str(&raw).map_err(|e| {
            ClientError::InvalidStatus(format!(
                "Failed to parse status of environment {}: {}",
                self.env, e
            ))
        })
    }

    /// Poll status until every unit is gone, so machines are not pulled out from
    /// under units that are still stopping. Gives up after the unit removal timeout
    /// and leaves the rest to the forced machine termination.
    async fn wait_for_units_removed(&mut self) -> ClientResult<()> {
        let started = Instant::now();
        let limit = Duration::from_secs(UNIT_REMOVAL_TIMEOUT_SECS);

        loop {
            let units = self.query_status().await?.unit_count();
            if units == 0 {
                return Ok(());
            }
            if started.elapsed() > limit {
                warn!(
                    "{} units still present after {} seconds, terminating machines anyway",
                    units,
                    limit.as_secs()
                );
                return Ok(());
            }
            debug!("Waiting for {} units to be removed...", units);
            sleep(Duration::from_secs(UNIT_POLL_INTERVAL_SECS)).await;
        }
    }
}

/// Map a failed juju invocation onto a client fault
pub fn classify_failure(command: &CommandSpec, output: &CommandOutput) -> ClientError {
    let combined = output.combined();
    let text = combined.trim();
    let lowered = text.to_lowercase();

    if STALE_CONNECTION_MARKERS
        .iter()
        .any(|marker| lowered.contains(marker))
    {
        return ClientError::ConnectionClosed(text.to_string());
    }

    ClientError::Other(format!(
        "`{}` exited with {}: {}",
        command,
        output
            .code
            .map(|c| c.to_string())
            .unwrap_or_else(|| "signal".to_string()),
        text
    ))
}

#[async_trait]
impl<R: CommandRunner> ClusterClient for JujuCli<R> {
    #[instrument(skip(self), fields(environment = %self.env))]
    async fn connect(&mut self) -> ClientResult<()> {
        self.query_status().await?;
        self.connected = true;
        debug!("Connected to environment {}", self.env);
        Ok(())
    }

    #[instrument(skip(self), fields(environment = %self.env))]
    async fn reset(&mut self, terminate_machines: bool) -> ClientResult<()> {
        self.ensure_connected()?;
        let status = self.query_status().await?;

        for service in status.service_names() {
            info!("Destroying service {}", service);
            let command = self.command("destroy-service").arg(service);
            self.execute(command).await?;
        }

        let machines = status.workload_machines();
        if terminate_machines && !machines.is_empty() {
            if status.unit_count() > 0 {
                self.wait_for_units_removed().await?;
            }
            for machine in machines {
                info!("Terminating machine {}", machine);
                let command = self
                    .command("destroy-machine")
                    .arg("--force")
                    .arg(machine);
                self.execute(command).await?;
            }
        }

        Ok(())
    }

    async fn status(&mut self) -> ClientResult<StatusSnapshot> {
        self.ensure_connected()?;
        self.query_status().await
    }
}
