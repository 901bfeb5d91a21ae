//! Role aggregation.
//!
//! Reduces the machines of one role to a single replica-weighted demand.
//! The first machine's system type and processor type represent the whole
//! role; machines are not required to agree, but disagreement is recorded
//! in [`RoleAggregate::groups`] so callers can reject it.

use serde::Serialize;

use crate::error::{CapacityError, CapacityResult};
use crate::shape::{MachineShape, Role, WorkerSet};

/// Replica-weighted totals for one `(system_type, processor_type)` pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShapeGroup {
    pub system_type: String,
    pub processor_type: String,
    pub replica_count: u64,
    pub total_processors: f64,
    pub total_memory_gib: i64,
}

impl ShapeGroup {
    /// `system_type/processor_type`, used in error messages.
    pub fn label(&self) -> String {
        format!("{}/{}", self.system_type, self.processor_type)
    }
}

/// Aggregate demand of one role.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoleAggregate {
    pub role: Role,
    pub replica_count: u64,

    /// Representative system type; `None` for an empty role.
    pub system_type: Option<String>,

    /// Representative processor type tag; `None` for an empty role.
    pub processor_type: Option<String>,

    pub total_processors: f64,
    pub total_memory_gib: i64,

    /// Per-shape breakdown in first-seen order.
    pub groups: Vec<ShapeGroup>,
}

impl RoleAggregate {
    /// A zero aggregate. It matches no pool.
    pub fn empty(role: Role) -> Self {
        Self {
            role,
            replica_count: 0,
            system_type: None,
            processor_type: None,
            total_processors: 0.0,
            total_memory_gib: 0,
            groups: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.system_type.is_none()
    }

    /// True if the role mixes system types or processor types.
    pub fn is_heterogeneous(&self) -> bool {
        self.groups.len() > 1
    }

    /// Fold `replicas` copies of `shape` into the aggregate.
    ///
    /// `index` is the position of the machine (or worker set) in its input
    /// sequence and is only used for error context.
    fn add(&mut self, index: usize, replicas: u32, shape: &MachineShape) -> CapacityResult<()> {
        let processors =
            shape
                .processors
                .resolve()
                .ok_or_else(|| CapacityError::MalformedProcessorCount {
                    role: self.role,
                    index,
                    value: shape.processors.raw(),
                })?;

        let replicas_f = f64::from(replicas);
        let processors = replicas_f * processors;

        let role = self.role;
        let overflow = || CapacityError::MemoryOverflow { role, index };
        let memory = i64::from(replicas)
            .checked_mul(shape.memory_gib)
            .ok_or_else(overflow)?;
        let total_memory_gib = self
            .total_memory_gib
            .checked_add(memory)
            .ok_or_else(overflow)?;

        let group = self.groups.iter().position(|g| {
            g.system_type == shape.system_type && g.processor_type == shape.processor_type
        });
        let group_memory_gib = match group {
            Some(i) => self.groups[i]
                .total_memory_gib
                .checked_add(memory)
                .ok_or_else(overflow)?,
            None => memory,
        };

        if self.system_type.is_none() {
            self.system_type = Some(shape.system_type.clone());
            self.processor_type = Some(shape.processor_type.clone());
        }

        self.replica_count += u64::from(replicas);
        self.total_processors += processors;
        self.total_memory_gib = total_memory_gib;

        match group {
            Some(i) => {
                let group = &mut self.groups[i];
                group.replica_count += u64::from(replicas);
                group.total_processors += processors;
                group.total_memory_gib = group_memory_gib;
            }
            None => self.groups.push(ShapeGroup {
                system_type: shape.system_type.clone(),
                processor_type: shape.processor_type.clone(),
                replica_count: u64::from(replicas),
                total_processors: processors,
                total_memory_gib: memory,
            }),
        }

        Ok(())
    }
}

/// Aggregate control-plane machines, one replica per entry.
pub fn aggregate_control_plane(machines: &[MachineShape]) -> CapacityResult<RoleAggregate> {
    let mut aggregate = RoleAggregate::empty(Role::ControlPlane);
    for (index, shape) in machines.iter().enumerate() {
        aggregate.add(index, 1, shape)?;
    }
    Ok(aggregate)
}

/// Aggregate worker sets, weighting each template by its replica count.
///
/// Totals accumulate across sets; the first set's template provides the
/// representative system type and processor type.
pub fn aggregate_worker_sets(sets: &[WorkerSet]) -> CapacityResult<RoleAggregate> {
    let mut aggregate = RoleAggregate::empty(Role::Worker);
    for (index, set) in sets.iter().enumerate() {
        aggregate.add(index, set.replicas, &set.template)?;
    }
    Ok(aggregate)
}
