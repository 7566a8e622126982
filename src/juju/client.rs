// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Cluster client abstraction used to reset environments

use crate::error::ClientResult;
use crate::juju::status::StatusSnapshot;
use async_trait::async_trait;
use std::fmt;

/// Names a remote environment
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EnvironmentHandle {
    pub name: String,
}

impl EnvironmentHandle {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl fmt::Display for EnvironmentHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// A session with a cluster-orchestration environment.
///
/// `reset` reports a closed session as [`crate::error::ClientError::ConnectionClosed`],
/// after which `connect` must be called again.
#[async_trait]
pub trait ClusterClient: Send {
    /// Establish or re-establish the session
    async fn connect(&mut self) -> ClientResult<()>;

    /// Remove all services, optionally terminating their machines
    async fn reset(&mut self, terminate_machines: bool) -> ClientResult<()>;

    async fn status(&mut self) -> ClientResult<StatusSnapshot>;
}
