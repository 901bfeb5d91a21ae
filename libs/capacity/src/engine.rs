//! Capacity validation engine.
//!
//! Aggregates both roles, classifies their processor demand, then walks the
//! pool snapshot once, debiting the control plane before the workers for
//! each pool whose type matches.

use serde::Serialize;
use tracing::debug;

use crate::aggregate::{aggregate_control_plane, aggregate_worker_sets, RoleAggregate};
use crate::error::{CapacityError, CapacityResult};
use crate::ledger::{PoolLedger, ResourcePool, RoleDemand};
use crate::policy::effective_processors;
use crate::shape::{MachineShape, WorkerSet};

/// Outcome of a successful [`plan_capacity`] run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CapacityPlan {
    pub control_plane: RoleAggregate,
    pub worker: RoleAggregate,

    /// Control-plane demand first, then worker demand.
    pub demands: Vec<RoleDemand>,

    /// Pool balances after every debit.
    pub pools: Vec<ResourcePool>,
}

struct Demands {
    control_plane: RoleAggregate,
    worker: RoleAggregate,
    demands: Vec<RoleDemand>,
}

/// Aggregate and classify both roles. Nothing here touches a pool.
fn compute_demands(
    control_planes: &[MachineShape],
    worker_sets: &[WorkerSet],
) -> CapacityResult<Demands> {
    let control_plane = aggregate_control_plane(control_planes)?;
    let worker = aggregate_worker_sets(worker_sets)?;

    debug!(
        replicas = control_plane.replica_count,
        system_type = ?control_plane.system_type,
        processor_type = ?control_plane.processor_type,
        processors = control_plane.total_processors,
        memory_gib = control_plane.total_memory_gib,
        "Control-plane aggregate"
    );
    debug!(
        replicas = worker.replica_count,
        system_type = ?worker.system_type,
        processor_type = ?worker.processor_type,
        processors = worker.total_processors,
        memory_gib = worker.total_memory_gib,
        "Worker aggregate"
    );

    let control_plane_processors = effective_processors(&control_plane)?;
    let worker_processors = effective_processors(&worker)?;

    let demands = vec![
        RoleDemand::from_aggregate(&control_plane, control_plane_processors),
        RoleDemand::from_aggregate(&worker, worker_processors),
    ];

    Ok(Demands {
        control_plane,
        worker,
        demands,
    })
}

/// Validate that both roles fit inside the given pools.
///
/// The ledger is debited in place and is not restored on failure: once this
/// returns an error the snapshot no longer reflects the provider and must be
/// discarded. Input errors (malformed processor counts, unknown policies)
/// are reported before any pool is touched.
pub fn validate_capacity_with_pools(
    control_planes: &[MachineShape],
    worker_sets: &[WorkerSet],
    ledger: &mut PoolLedger,
) -> CapacityResult<()> {
    let Demands { demands, .. } = compute_demands(control_planes, worker_sets)?;
    ledger.apply(&demands)
}

/// Run the same check as [`validate_capacity_with_pools`] on a scratch copy.
///
/// The caller's snapshot is never modified; the debited balances are only
/// returned when every check passed.
pub fn plan_capacity(
    control_planes: &[MachineShape],
    worker_sets: &[WorkerSet],
    snapshot: &[ResourcePool],
) -> CapacityResult<CapacityPlan> {
    let Demands {
        control_plane,
        worker,
        demands,
    } = compute_demands(control_planes, worker_sets)?;

    let mut scratch = PoolLedger::new(snapshot.to_vec());
    scratch.apply(&demands)?;

    Ok(CapacityPlan {
        control_plane,
        worker,
        demands,
        pools: scratch.into_pools(),
    })
}

/// Reject a role whose machines do not share one system type and
/// processor type.
pub fn ensure_homogeneous(aggregate: &RoleAggregate) -> CapacityResult<()> {
    if aggregate.is_heterogeneous() {
        return Err(CapacityError::HeterogeneousRole {
            role: aggregate.role,
            groups: aggregate.groups.iter().map(|g| g.label()).collect(),
        });
    }
    Ok(())
}
