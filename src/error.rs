// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Faults reported by a cluster client.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// The session was closed by the remote side. Recoverable by reconnecting.
    #[error("Connection closed: {0}")]
    ConnectionClosed(String),

    #[error("Client operation timed out: {0}")]
    Timeout(String),

    #[error("Invalid status output: {0}")]
    InvalidStatus(String),

    #[error("Client error: {0}")]
    Other(String),
}

impl ClientError {
    pub fn is_stale_connection(&self) -> bool {
        matches!(self, ClientError::ConnectionClosed(_))
    }
}

pub type ClientResult<T> = std::result::Result<T, ClientError>;

#[derive(Error, Debug)]
pub enum BuilderError {
    #[error(
        "Timeout exceeded. Failed to reset environment in {} seconds (last error: {})",
        .timeout.as_secs(),
        .last_error.as_ref().map(ToString::to_string).unwrap_or_else(|| "none".to_string())
    )]
    ConnectionTimeout {
        timeout: Duration,
        last_error: Option<ClientError>,
    },

    #[error(
        "Timeout exceeded. Failed to destroy all services in {} seconds, remaining: {}",
        .timeout.as_secs(),
        .remaining.join(", ")
    )]
    DrainTimeout {
        timeout: Duration,
        remaining: Vec<String>,
    },

    #[error("Missing required bundle file: {}", .0.display())]
    MissingBundle(PathBuf),

    #[error(
        "Command `{command}` failed with exit code {}{}",
        .code.map(|c| c.to_string()).unwrap_or_else(|| "none".to_string()),
        output_suffix(.output)
    )]
    CommandFailed {
        command: String,
        code: Option<i32>,
        /// Combined stdout and stderr of the failed command
        output: String,
    },

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, BuilderError>;

fn output_suffix(output: &str) -> String {
    if output.is_empty() {
        String::new()
    } else {
        format!(": {}", output)
    }
}
