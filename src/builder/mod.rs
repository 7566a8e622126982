// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Test environment builder: environment lifecycle, reset and host preparation.

pub mod environment;
pub mod packages;
pub mod reset;

pub use environment::{Builder, DeployResult};
pub use reset::{EnvironmentResetter, ResetBudget};
