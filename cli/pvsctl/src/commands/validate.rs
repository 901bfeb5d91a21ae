//! Capacity validation of an install plan.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use pvs_capacity::{
    aggregate_control_plane, aggregate_worker_sets, ensure_homogeneous, CapacityPlan,
    RoleAggregate, RoleDemand,
};
use pvs_provider::{plan_capacity_live, StaticPools, SystemPoolProvider};
use serde::Serialize;
use tabled::Tabled;
use tracing::{info, warn};

use crate::output::{
    print_info, print_output, print_single, print_success, print_warning, OutputFormat,
};
use crate::plan::{load_pool_snapshot, InstallPlan};

use super::pools::PoolRow;
use super::CommandContext;

/// Validate a plan against system pool capacity.
#[derive(Debug, Args)]
pub struct ValidateCommand {
    /// TOML install plan.
    #[arg(long)]
    plan: PathBuf,

    /// Workspace (service instance) ID. Overrides the plan file.
    #[arg(long, env = "PVS_SERVICE_INSTANCE")]
    service_instance: Option<String>,

    /// Validate against a JSON pool snapshot instead of the live workspace.
    #[arg(long)]
    pools: Option<PathBuf>,

    /// Reject roles that mix system types or processor types.
    #[arg(long)]
    strict: bool,
}

#[derive(Debug, Serialize, Tabled)]
struct DemandRow {
    #[tabled(rename = "Role")]
    role: String,

    #[tabled(rename = "Replicas")]
    replicas: u64,

    #[tabled(rename = "System type")]
    system_type: String,

    #[tabled(rename = "Processor type")]
    processor_type: String,

    #[tabled(rename = "Cores")]
    cores: f64,

    #[tabled(rename = "Memory (GiB)")]
    memory_gib: i64,
}

impl DemandRow {
    fn new(aggregate: &RoleAggregate, demand: &RoleDemand) -> Self {
        Self {
            role: aggregate.role.to_string(),
            replicas: aggregate.replica_count,
            system_type: aggregate.system_type.clone().unwrap_or_else(|| "-".to_string()),
            processor_type: aggregate
                .processor_type
                .clone()
                .unwrap_or_else(|| "-".to_string()),
            cores: demand.processors,
            memory_gib: demand.memory_gib,
        }
    }
}

impl ValidateCommand {
    pub async fn run(self, ctx: CommandContext) -> Result<()> {
        let plan = InstallPlan::load(&self.plan)?;

        for warning in check_roles(&plan, self.strict)? {
            warn!("{}", warning);
            if ctx.format == OutputFormat::Table {
                print_warning(&warning);
            }
        }

        // Resolve the workspace before opening a session.
        let service_instance = match &self.pools {
            Some(_) => plan
                .service_instance(self.service_instance.as_deref())
                .unwrap_or("offline"),
            None => plan.service_instance(self.service_instance.as_deref())?,
        };

        let provider: Box<dyn SystemPoolProvider> = match &self.pools {
            Some(path) => {
                info!(path = %path.display(), "Using offline pool snapshot");
                if ctx.format == OutputFormat::Table {
                    print_info(&format!("Using pool snapshot from {}", path.display()));
                }
                Box::new(StaticPools::new(load_pool_snapshot(path)?))
            }
            None => Box::new(ctx.client().await?),
        };

        let result = run_plan(provider.as_ref(), service_instance, &plan).await?;
        print_plan(&result, ctx.format);
        Ok(())
    }
}

/// Aggregate both roles up front and report mixed shapes: an error in
/// strict mode, a warning otherwise.
fn check_roles(plan: &InstallPlan, strict: bool) -> Result<Vec<String>> {
    let aggregates = [
        aggregate_control_plane(&plan.control_plane)?,
        aggregate_worker_sets(&plan.workers)?,
    ];

    let mut warnings = Vec::new();
    for aggregate in &aggregates {
        if strict {
            ensure_homogeneous(aggregate)?;
        } else if aggregate.is_heterogeneous() {
            let groups: Vec<String> = aggregate.groups.iter().map(|g| g.label()).collect();
            warnings.push(format!(
                "{} mixes shapes ({}); only {} pools will be checked",
                aggregate.role,
                groups.join(", "),
                aggregate.system_type.as_deref().unwrap_or("-")
            ));
        }
    }
    Ok(warnings)
}

async fn run_plan(
    provider: &dyn SystemPoolProvider,
    service_instance: &str,
    plan: &InstallPlan,
) -> Result<CapacityPlan> {
    Ok(plan_capacity_live(provider, service_instance, &plan.control_plane, &plan.workers).await?)
}

fn print_plan(plan: &CapacityPlan, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_single(plan),
        OutputFormat::Table => {
            let demands = vec![
                DemandRow::new(&plan.control_plane, &plan.demands[0]),
                DemandRow::new(&plan.worker, &plan.demands[1]),
            ];
            print_output(&demands, format);

            println!();
            let pools: Vec<PoolRow> = plan.pools.iter().map(PoolRow::from).collect();
            print_output(&pools, format);

            println!();
            print_success("Capacity is sufficient for the install plan.");
        }
    }
}
