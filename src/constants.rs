// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

/// External executables driven by the builder
pub mod commands {
    pub const JUJU: &str = "juju";
    pub const JUJU_DEPLOYER: &str = "juju-deployer";
    pub const VIRTUALENV: &str = "virtualenv";
    pub const SUDO: &str = "sudo";
    pub const APT_GET: &str = "apt-get";
    pub const APT_ADD_REPOSITORY: &str = "apt-add-repository";
}

/// Environment reset polling configuration
pub mod reset {
    /// Default budget in seconds for getting the reset command accepted
    pub const CONNECTION_RETRY_BUDGET_SECS: u64 = 60;
    /// Default budget in seconds for all services to be removed
    pub const DRAIN_TIMEOUT_SECS: u64 = 600;
    /// Pause in seconds between failed reset attempts
    pub const RETRY_INTERVAL_SECS: u64 = 1;
    /// Pause in seconds between status polls while draining
    pub const DRAIN_POLL_INTERVAL_SECS: u64 = 4;
}

/// Juju client configuration
pub mod juju {
    /// Maximum time in seconds a single juju command may take
    pub const COMMAND_TIMEOUT_SECS: u64 = 300;
    /// Machine id of the bootstrap node, never terminated on reset
    pub const BOOTSTRAP_MACHINE: &str = "0";
    /// Maximum time in seconds to wait for units to go away before forcing machine termination
    pub const UNIT_REMOVAL_TIMEOUT_SECS: u64 = 120;
    /// Pause in seconds between status polls while units are being removed
    pub const UNIT_POLL_INTERVAL_SECS: u64 = 4;
    /// Output fragments that indicate the API connection was closed remotely
    pub const STALE_CONNECTION_MARKERS: &[&str] = &[
        "connection is shut down",
        "connection closed",
        "websocket: close",
    ];
}
