//! Error types for capacity validation.

use thiserror::Error;

use crate::shape::Role;

/// Result type for capacity operations.
pub type CapacityResult<T> = Result<T, CapacityError>;

/// Errors that can occur while validating capacity.
///
/// Every variant is terminal for the validation call that produced it.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CapacityError {
    /// A string-encoded processor count did not parse as a finite number.
    #[error("failed to convert {role} processors {value:?} (machine {index}) to a number")]
    MalformedProcessorCount {
        role: Role,
        index: usize,
        value: String,
    },

    /// Replica-weighted memory does not fit in an `i64`.
    #[error("{role} memory overflows (machine {index})")]
    MemoryOverflow { role: Role, index: usize },

    /// The processor type is neither `Dedicated` nor `Shared`.
    #[error("unknown {role} processor type ({value})")]
    UnknownProcessorPolicy { role: Role, value: String },

    /// A matching pool cannot absorb the role's processor demand.
    #[error(
        "not enough cores available ({available}) in pool {pool} for the {role} nodes (need {needed})"
    )]
    InsufficientCores {
        role: Role,
        pool: String,
        pool_type: String,
        needed: f64,
        available: f64,
    },

    /// A matching pool cannot absorb the role's memory demand.
    #[error(
        "not enough memory available ({available} GiB) in pool {pool} for the {role} nodes (need {needed} GiB)"
    )]
    InsufficientMemory {
        role: Role,
        pool: String,
        pool_type: String,
        needed: i64,
        available: i64,
    },

    /// The role mixes system types or processor policies.
    #[error("{role} machines are not homogeneous: {}", .groups.join(", "))]
    HeterogeneousRole { role: Role, groups: Vec<String> },
}

impl CapacityError {
    /// Returns true if a pool lacked cores or memory.
    pub fn is_capacity_shortfall(&self) -> bool {
        matches!(
            self,
            CapacityError::InsufficientCores { .. } | CapacityError::InsufficientMemory { .. }
        )
    }

    /// Returns true if the machine definitions themselves are invalid.
    pub fn is_input_error(&self) -> bool {
        !self.is_capacity_shortfall()
    }

    /// The role the error refers to.
    pub fn role(&self) -> Role {
        match self {
            CapacityError::MalformedProcessorCount { role, .. }
            | CapacityError::MemoryOverflow { role, .. }
            | CapacityError::UnknownProcessorPolicy { role, .. }
            | CapacityError::InsufficientCores { role, .. }
            | CapacityError::InsufficientMemory { role, .. }
            | CapacityError::HeterogeneousRole { role, .. } => *role,
        }
    }
}
