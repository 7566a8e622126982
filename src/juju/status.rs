// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Environment status as reported by `juju status --format json`

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct StatusSnapshot {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
    #[serde(default)]
    pub machines: BTreeMap<String, MachineStatus>,
    #[serde(default, alias = "applications")]
    pub services: BTreeMap<String, ServiceStatus>,
}

impl StatusSnapshot {
    /// True once every service has been removed from the environment
    pub fn is_drained(&self) -> bool {
        self.services.is_empty()
    }

    pub fn service_names(&self) -> Vec<String> {
        self.services.keys().cloned().collect()
    }

    /// Number of units still present across all services
    pub fn unit_count(&self) -> usize {
        self.services.values().map(|s| s.units.len()).sum()
    }

    /// Machines that may be terminated on reset, excluding the bootstrap node
    pub fn workload_machines(&self) -> Vec<String> {
        self.machines
            .keys()
            .filter(|id| id.as_str() != crate::constants::juju::BOOTSTRAP_MACHINE)
            .cloned()
            .collect()
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct MachineStatus {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dns_name: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct ServiceStatus {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub charm: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exposed: Option<bool>,
    #[serde(default)]
    pub units: BTreeMap<String, serde_json::Value>,
}
