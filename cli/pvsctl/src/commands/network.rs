//! Network topology checks.

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Args, Subcommand};
use pvs_networking::Cidr;
use pvs_provider::{validate_cloud_connection_in_region, validate_dhcp_service};
use tracing::info;

use crate::output::{print_single, print_success, OutputFormat};
use crate::plan::InstallPlan;

use super::CommandContext;

/// Network commands.
#[derive(Debug, Args)]
pub struct NetworkCommand {
    #[command(subcommand)]
    command: NetworkSubcommand,
}

#[derive(Debug, Subcommand)]
enum NetworkSubcommand {
    /// Check machine networks and cloud connection limits.
    Check(CheckArgs),
}

#[derive(Debug, Args)]
struct CheckArgs {
    /// Workspace (service instance) ID. Overrides the plan file.
    #[arg(long, env = "PVS_SERVICE_INSTANCE")]
    service_instance: Option<String>,

    /// Machine network CIDR (repeatable).
    #[arg(long = "machine-network")]
    machine_networks: Vec<Cidr>,

    /// TOML install plan; its machine networks are checked too.
    #[arg(long)]
    plan: Option<PathBuf>,
}

impl NetworkCommand {
    pub async fn run(self, ctx: CommandContext) -> Result<()> {
        match self.command {
            NetworkSubcommand::Check(args) => check(ctx, args).await,
        }
    }
}

async fn check(ctx: CommandContext, args: CheckArgs) -> Result<()> {
    let plan = match &args.plan {
        Some(path) => InstallPlan::load(path)?,
        None => InstallPlan::default(),
    };

    let mut machine_networks = args.machine_networks.clone();
    machine_networks.extend(plan.machine_networks()?);
    if machine_networks.is_empty() {
        bail!("No machine networks given. Use --machine-network or set machine_networks in the plan file.");
    }

    let service_instance = plan.service_instance(args.service_instance.as_deref())?;
    let client = ctx.client().await?;

    info!(count = machine_networks.len(), "Checking machine networks");
    validate_dhcp_service(&client, service_instance, &machine_networks).await?;
    validate_cloud_connection_in_region(&client, service_instance).await?;

    match ctx.format {
        OutputFormat::Json => print_single(&serde_json::json!({
            "service_instance": service_instance,
            "machine_networks": machine_networks.iter().map(|c| c.to_string()).collect::<Vec<_>>(),
            "status": "ok",
        })),
        OutputFormat::Table => print_success("No network conflicts and room for a cloud connection."),
    }
    Ok(())
}
