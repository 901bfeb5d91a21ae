//! Processor policy classification.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::aggregate::RoleAggregate;
use crate::error::{CapacityError, CapacityResult};

/// How processors are allocated to a machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProcessorPolicy {
    /// Cores are reserved for the machine.
    Dedicated,

    /// Cores come from an overcommitted shared pool.
    Shared,
}

impl ProcessorPolicy {
    /// Parse a provider tag. Tags are case-sensitive.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "Dedicated" => Some(ProcessorPolicy::Dedicated),
            "Shared" => Some(ProcessorPolicy::Shared),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessorPolicy::Dedicated => "Dedicated",
            ProcessorPolicy::Shared => "Shared",
        }
    }

    /// Processor demand that counts against a pool's advertised cores.
    pub fn effective(&self, total_processors: f64) -> f64 {
        match self {
            ProcessorPolicy::Dedicated => total_processors,
            // The provider does not document its shared-core overcommit
            // factor, so shared demand is not checked against pool cores.
            ProcessorPolicy::Shared => 0.0,
        }
    }
}

impl fmt::Display for ProcessorPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Effective processor demand of an aggregate.
///
/// An empty role has no policy and demands nothing.
pub fn effective_processors(aggregate: &RoleAggregate) -> CapacityResult<f64> {
    let Some(tag) = aggregate.processor_type.as_deref() else {
        return Ok(0.0);
    };

    let policy =
        ProcessorPolicy::from_tag(tag).ok_or_else(|| CapacityError::UnknownProcessorPolicy {
            role: aggregate.role,
            value: tag.to_string(),
        })?;

    Ok(policy.effective(aggregate.total_processors))
}
