//! # pvs-capacity
//!
//! Pre-flight capacity validation for Power Systems Virtual Server installs.
//!
//! Before any machine is created, the installer checks that the target
//! system pools have enough processor and memory headroom for the requested
//! control-plane and worker shapes. This crate is the synchronous core of
//! that check:
//!
//! - **Shapes**: per-machine system type, processor policy, processor count
//!   and memory, as they come out of the install configuration.
//! - **Aggregates**: one replica-weighted demand per role.
//! - **Policy**: dedicated cores count at face value, shared cores count as
//!   zero against a pool's advertised cores.
//! - **Ledger**: an owned, mutable copy of the pool snapshot that demands are
//!   checked against and debited from.
//!
//! The crate performs no I/O. Fetching the snapshot is the caller's job.
//!
//! ## Invariants
//!
//! - A role's full demand must fit in *every* pool whose type matches the
//!   role's system type; demand is never split across pools.
//! - For each pool, the control-plane demand is checked and debited before
//!   the worker demand.
//! - [`validate_capacity_with_pools`] does not roll back; use
//!   [`plan_capacity`] when the snapshot must survive a failed check.

mod aggregate;
mod engine;
mod error;
mod ledger;
mod policy;
mod shape;

pub use aggregate::{aggregate_control_plane, aggregate_worker_sets, RoleAggregate, ShapeGroup};
pub use engine::{ensure_homogeneous, plan_capacity, validate_capacity_with_pools, CapacityPlan};
pub use error::{CapacityError, CapacityResult};
pub use ledger::{PoolLedger, ResourcePool, RoleDemand};
pub use policy::{effective_processors, ProcessorPolicy};
pub use shape::{MachineShape, ProcessorCount, Role, WorkerSet};
