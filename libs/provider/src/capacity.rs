//! Capacity validation against a live pool snapshot.

use std::time::Duration;

use pvs_capacity::{
    plan_capacity, validate_capacity_with_pools, CapacityPlan, MachineShape, PoolLedger,
    ResourcePool, WorkerSet,
};
use tracing::{debug, instrument};

use crate::error::{PreflightError, ProviderError, ProviderResultExt};
use crate::provider::SystemPoolProvider;

/// Upper bound on a single system pool fetch.
pub const POOL_FETCH_TIMEOUT: Duration = Duration::from_secs(2 * 60);

/// Fetch a fresh snapshot, bounded by [`POOL_FETCH_TIMEOUT`].
#[instrument(skip(provider))]
pub async fn fetch_system_pools<P>(
    provider: &P,
    service_instance_id: &str,
) -> Result<Vec<ResourcePool>, PreflightError>
where
    P: SystemPoolProvider + ?Sized,
{
    let pools = tokio::time::timeout(
        POOL_FETCH_TIMEOUT,
        provider.fetch_system_pools(service_instance_id),
    )
    .await
    .unwrap_or_else(|_| {
        Err(ProviderError::Timeout {
            operation: "system pool fetch",
            after: POOL_FETCH_TIMEOUT,
        })
    })
    .context("failed to get system pools")?;

    debug!(pool_count = pools.len(), "Using system pool snapshot");
    Ok(pools)
}

/// Fetch a snapshot and check that both roles fit in it.
///
/// The snapshot is owned by this call and dropped afterwards; a second
/// validation always fetches its own.
pub async fn validate_capacity<P>(
    provider: &P,
    service_instance_id: &str,
    control_planes: &[MachineShape],
    worker_sets: &[WorkerSet],
) -> Result<(), PreflightError>
where
    P: SystemPoolProvider + ?Sized,
{
    let pools = fetch_system_pools(provider, service_instance_id).await?;
    let mut ledger = PoolLedger::new(pools);
    validate_capacity_with_pools(control_planes, worker_sets, &mut ledger)?;
    Ok(())
}

/// Fetch a snapshot and return the full plan: per-role demand and the
/// balances left in every pool.
pub async fn plan_capacity_live<P>(
    provider: &P,
    service_instance_id: &str,
    control_planes: &[MachineShape],
    worker_sets: &[WorkerSet],
) -> Result<CapacityPlan, PreflightError>
where
    P: SystemPoolProvider + ?Sized,
{
    let pools = fetch_system_pools(provider, service_instance_id).await?;
    Ok(plan_capacity(control_planes, worker_sets, &pools)?)
}
