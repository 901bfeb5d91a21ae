//! Install plan and pool snapshot files.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use pvs_capacity::{MachineShape, ResourcePool, WorkerSet};
use pvs_networking::Cidr;
use serde::{Deserialize, Serialize};

use crate::error::CliError;

/// Machines an install intends to create, as read from a TOML plan file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstallPlan {
    /// Target workspace. `--service-instance` overrides it.
    #[serde(default)]
    pub service_instance: Option<String>,

    #[serde(default)]
    pub control_plane: Vec<MachineShape>,

    #[serde(default)]
    pub workers: Vec<WorkerSet>,

    /// Machine network CIDRs checked by `network check`.
    #[serde(default)]
    pub machine_networks: Vec<String>,
}

impl InstallPlan {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read plan file {:?}", path))?;
        Self::parse(&contents)
    }

    pub fn parse(contents: &str) -> Result<Self> {
        toml::from_str(contents).map_err(|e| CliError::InvalidPlan(e.to_string()).into())
    }

    /// Parsed machine networks.
    pub fn machine_networks(&self) -> Result<Vec<Cidr>> {
        self.machine_networks
            .iter()
            .map(|raw| {
                raw.parse::<Cidr>()
                    .with_context(|| format!("Invalid machine network {:?}", raw))
            })
            .collect()
    }

    /// The flag wins over the plan file.
    pub fn service_instance<'a>(&'a self, flag: Option<&'a str>) -> Result<&'a str> {
        flag.or(self.service_instance.as_deref())
            .filter(|id| !id.is_empty())
            .ok_or_else(|| CliError::NoServiceInstance.into())
    }
}

/// Read an offline pool snapshot: a JSON array of pools.
pub fn load_pool_snapshot(path: &Path) -> Result<Vec<ResourcePool>> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read pool snapshot {:?}", path))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse pool snapshot {:?}", path))
}
