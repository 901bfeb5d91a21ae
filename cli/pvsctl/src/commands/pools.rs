//! System pool listing.

use anyhow::Result;
use clap::Args;
use pvs_capacity::ResourcePool;
use pvs_provider::fetch_system_pools;
use serde::Serialize;
use tabled::Tabled;

use crate::output::print_output;

use super::CommandContext;

/// List system pools.
#[derive(Debug, Args)]
pub struct PoolsCommand {
    /// Workspace (service instance) ID.
    #[arg(long, env = "PVS_SERVICE_INSTANCE")]
    service_instance: String,
}

/// Table row for one pool.
#[derive(Debug, Serialize, Tabled)]
pub(super) struct PoolRow {
    #[tabled(rename = "Pool")]
    name: String,

    #[tabled(rename = "Type")]
    #[serde(rename = "type")]
    pool_type: String,

    #[tabled(rename = "Cores")]
    available_cores: f64,

    #[tabled(rename = "Memory (GiB)")]
    available_memory_gib: i64,
}

impl From<&ResourcePool> for PoolRow {
    fn from(pool: &ResourcePool) -> Self {
        Self {
            name: pool.name.clone(),
            pool_type: pool.pool_type.clone(),
            available_cores: pool.available_cores,
            available_memory_gib: pool.available_memory_gib,
        }
    }
}

impl PoolsCommand {
    pub async fn run(self, ctx: CommandContext) -> Result<()> {
        let client = ctx.client().await?;
        let pools = fetch_system_pools(&client, &self.service_instance).await?;

        let rows: Vec<PoolRow> = pools.iter().map(PoolRow::from).collect();
        print_output(&rows, ctx.format);
        Ok(())
    }
}
