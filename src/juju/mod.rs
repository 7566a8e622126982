// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Juju environment access: the cluster client seam, its CLI implementation and status model.

pub mod cli;
pub mod client;
pub mod status;

pub use cli::JujuCli;
pub use client::{ClusterClient, EnvironmentHandle};
pub use status::StatusSnapshot;
