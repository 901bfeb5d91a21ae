//! Pool capacity ledger.
//!
//! The ledger owns one snapshot of the provider's system pools for the
//! duration of a single validation. Checks debit balances in place and are
//! never rolled back, so a snapshot that failed a check must be discarded.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::aggregate::RoleAggregate;
use crate::error::{CapacityError, CapacityResult};
use crate::shape::Role;

/// A named bucket of cores and memory serving one system type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourcePool {
    pub name: String,

    #[serde(rename = "type")]
    pub pool_type: String,

    pub available_cores: f64,

    pub available_memory_gib: i64,
}

impl ResourcePool {
    /// A pool named after its type.
    pub fn new(pool_type: impl Into<String>, available_cores: f64, available_memory_gib: i64) -> Self {
        let pool_type = pool_type.into();
        Self {
            name: pool_type.clone(),
            pool_type,
            available_cores,
            available_memory_gib,
        }
    }

    pub fn named(
        name: impl Into<String>,
        pool_type: impl Into<String>,
        available_cores: f64,
        available_memory_gib: i64,
    ) -> Self {
        Self {
            name: name.into(),
            pool_type: pool_type.into(),
            available_cores,
            available_memory_gib,
        }
    }

    /// Check and debit one role's demand.
    ///
    /// Cores are debited before memory is checked, so a memory failure
    /// leaves the core debit applied.
    pub fn debit(&mut self, demand: &RoleDemand) -> CapacityResult<()> {
        if demand.processors > self.available_cores {
            return Err(CapacityError::InsufficientCores {
                role: demand.role,
                pool: self.name.clone(),
                pool_type: self.pool_type.clone(),
                needed: demand.processors,
                available: self.available_cores,
            });
        }
        self.available_cores -= demand.processors;

        if demand.memory_gib > self.available_memory_gib {
            return Err(CapacityError::InsufficientMemory {
                role: demand.role,
                pool: self.name.clone(),
                pool_type: self.pool_type.clone(),
                needed: demand.memory_gib,
                available: self.available_memory_gib,
            });
        }
        self.available_memory_gib -= demand.memory_gib;

        trace!(
            pool = %self.name,
            role = %demand.role,
            cores_left = self.available_cores,
            memory_left_gib = self.available_memory_gib,
            "Debited pool"
        );
        Ok(())
    }
}

/// The demand one role places on each matching pool.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoleDemand {
    pub role: Role,

    /// Pools of this type must absorb the demand; `None` matches nothing.
    pub system_type: Option<String>,

    /// Effective processors after policy classification.
    pub processors: f64,

    pub memory_gib: i64,
}

impl RoleDemand {
    pub fn new(
        role: Role,
        system_type: impl Into<String>,
        processors: f64,
        memory_gib: i64,
    ) -> Self {
        Self {
            role,
            system_type: Some(system_type.into()),
            processors,
            memory_gib,
        }
    }

    /// Demand of an aggregate whose processors were already classified.
    pub fn from_aggregate(aggregate: &RoleAggregate, effective_processors: f64) -> Self {
        Self {
            role: aggregate.role,
            system_type: aggregate.system_type.clone(),
            processors: effective_processors,
            memory_gib: aggregate.total_memory_gib,
        }
    }

    pub fn matches(&self, pool: &ResourcePool) -> bool {
        self.system_type.as_deref() == Some(pool.pool_type.as_str())
    }
}

/// Mutable view of a pool snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PoolLedger {
    pools: Vec<ResourcePool>,
}

impl PoolLedger {
    pub fn new(pools: Vec<ResourcePool>) -> Self {
        Self { pools }
    }

    pub fn pools(&self) -> &[ResourcePool] {
        &self.pools
    }

    pub fn into_pools(self) -> Vec<ResourcePool> {
        self.pools
    }

    pub fn len(&self) -> usize {
        self.pools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }

    /// Check and debit one demand against every matching pool, in order.
    ///
    /// Each matching pool must absorb the whole demand on its own. The
    /// first failure stops processing.
    pub fn debit_role(&mut self, demand: &RoleDemand) -> CapacityResult<()> {
        for pool in self.pools.iter_mut().filter(|p| demand.matches(p)) {
            pool.debit(demand)?;
        }
        Ok(())
    }

    /// Walk the pools once, debiting every matching demand per pool in the
    /// order given before moving to the next pool.
    pub fn apply(&mut self, demands: &[RoleDemand]) -> CapacityResult<()> {
        for pool in &mut self.pools {
            for demand in demands {
                if demand.matches(pool) {
                    pool.debit(demand)?;
                }
            }
        }
        Ok(())
    }
}

impl From<Vec<ResourcePool>> for PoolLedger {
    fn from(pools: Vec<ResourcePool>) -> Self {
        Self::new(pools)
    }
}
