// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Test utilities for mocking external commands and cluster clients.

use crate::error::{ClientError, ClientResult, Result};
use crate::juju::client::ClusterClient;
use crate::juju::status::{ServiceStatus, StatusSnapshot};
use crate::process::{CommandOutput, CommandRunner, CommandSpec};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Pop the next scripted value, repeating the last one once the script runs out.
fn next_or_last<T: Clone>(queue: &mut VecDeque<T>) -> Option<T> {
    if queue.len() > 1 {
        queue.pop_front()
    } else {
        queue.front().cloned()
    }
}

/// A command runner that records every command and returns predefined outputs.
/// Clones share state, so a test can keep a handle after moving one into a builder.
#[derive(Clone, Default)]
pub struct RecordingRunner {
    responses: Arc<Mutex<HashMap<String, VecDeque<CommandOutput>>>>,
    calls: Arc<Mutex<Vec<CommandSpec>>>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a stdout response for commands matching the exact command line or starting with it.
    /// Unmatched commands succeed with empty output.
    pub fn on(self, command: &str, code: i32, stdout: &str) -> Self {
        self.on_output(command, code, stdout, "")
    }

    pub fn on_output(self, command: &str, code: i32, stdout: &str, stderr: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .entry(command.to_string())
            .or_default()
            .push_back(CommandOutput {
                code: Some(code),
                stdout: stdout.to_string(),
                stderr: stderr.to_string(),
            });
        self
    }

    pub fn calls(&self) -> Vec<CommandSpec> {
        self.calls.lock().unwrap().clone()
    }

    pub fn commands(&self) -> Vec<String> {
        self.calls().iter().map(ToString::to_string).collect()
    }

    fn find_response(&self, command: &str) -> CommandOutput {
        let mut responses = self.responses.lock().unwrap();

        // Try exact match first
        if let Some(queue) = responses.get_mut(command) {
            if let Some(output) = next_or_last(queue) {
                return output;
            }
        }

        // Then the longest matching prefix
        let prefix = responses
            .keys()
            .filter(|p| command.starts_with(p.as_str()))
            .max_by_key(|p| p.len())
            .cloned();

        prefix
            .and_then(|p| responses.get_mut(&p).and_then(next_or_last))
            .unwrap_or(CommandOutput {
                code: Some(0),
                ..Default::default()
            })
    }
}

#[async_trait]
impl CommandRunner for RecordingRunner {
    async fn run(&self, command: &CommandSpec) -> Result<CommandOutput> {
        self.calls.lock().unwrap().push(command.clone());
        Ok(self.find_response(&command.to_string()))
    }
}

#[derive(Default)]
struct Script {
    connect_results: VecDeque<ClientResult<()>>,
    reset_results: VecDeque<ClientResult<()>>,
    statuses: VecDeque<ClientResult<StatusSnapshot>>,
    connects: usize,
    resets: usize,
    status_calls: usize,
}

/// A cluster client that plays back scripted results. Once a script runs out its
/// last entry repeats; an empty script succeeds (with a drained status).
#[derive(Clone, Default)]
pub struct ScriptedClient {
    script: Arc<Mutex<Script>>,
    connect_latency: Duration,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_connect(self, result: ClientResult<()>) -> Self {
        self.script.lock().unwrap().connect_results.push_back(result);
        self
    }

    pub fn on_reset(self, result: ClientResult<()>) -> Self {
        self.script.lock().unwrap().reset_results.push_back(result);
        self
    }

    pub fn on_status(self, result: ClientResult<StatusSnapshot>) -> Self {
        self.script.lock().unwrap().statuses.push_back(result);
        self
    }

    /// Time every reconnect takes on the (test) clock
    pub fn with_connect_latency(mut self, latency: Duration) -> Self {
        self.connect_latency = latency;
        self
    }

    pub fn connects(&self) -> usize {
        self.script.lock().unwrap().connects
    }

    pub fn resets(&self) -> usize {
        self.script.lock().unwrap().resets
    }

    pub fn status_calls(&self) -> usize {
        self.script.lock().unwrap().status_calls
    }
}

#[async_trait]
impl ClusterClient for ScriptedClient {
    async fn connect(&mut self) -> ClientResult<()> {
        if !self.connect_latency.is_zero() {
            tokio::time::sleep(self.connect_latency).await;
        }
        let mut script = self.script.lock().unwrap();
        script.connects += 1;
        next_or_last(&mut script.connect_results).unwrap_or(Ok(()))
    }

    async fn reset(&mut self, _terminate_machines: bool) -> ClientResult<()> {
        let mut script = self.script.lock().unwrap();
        script.resets += 1;
        next_or_last(&mut script.reset_results).unwrap_or(Ok(()))
    }

    async fn status(&mut self) -> ClientResult<StatusSnapshot> {
        let mut script = self.script.lock().unwrap();
        script.status_calls += 1;
        next_or_last(&mut script.statuses).unwrap_or_else(|| Ok(StatusSnapshot::default()))
    }
}

/// Build a status snapshot containing the given services
pub fn snapshot(services: &[&str]) -> StatusSnapshot {
    StatusSnapshot {
        services: services
            .iter()
            .map(|name| (name.to_string(), ServiceStatus::default()))
            .collect(),
        ..Default::default()
    }
}

pub fn stale() -> ClientError {
    ClientError::ConnectionClosed("websocket connection closed".to_string())
}
