//! Error types for provider calls and the validations built on them.

use std::time::Duration;

use pvs_capacity::CapacityError;
use pvs_networking::{Cidr, NetworkError};
use thiserror::Error;

/// Errors returned by a provider call.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("network error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("{operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    #[error("unexpected response: {0}")]
    Decode(String),
}

impl ProviderError {
    /// Returns true for 404 responses.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ProviderError::Api { status: 404, .. })
    }
}

/// Errors from a pre-flight validation.
#[derive(Debug, Error)]
pub enum PreflightError {
    /// A provider call failed; `context` names the call.
    #[error("{context}: {source}")]
    Provider {
        context: &'static str,
        #[source]
        source: ProviderError,
    },

    #[error(transparent)]
    Capacity(#[from] CapacityError),

    #[error("invalid network from provider: {0}")]
    Network(#[from] NetworkError),

    #[error("cidr {machine} conflicts with existing network {existing}")]
    CidrConflict { existing: Cidr, machine: Cidr },

    #[error(
        "cannot create new cloud connection: {count} already exist and only {max} are allowed per zone"
    )]
    TooManyCloudConnections { count: usize, max: usize },

    #[error(
        "cloud connection {connection} is attached to a DHCP network; only one cloud connection can be attached to any DHCP network per account per zone"
    )]
    DhcpCloudConnection { connection: String },
}

/// Attach call context to a provider result.
pub trait ProviderResultExt<T> {
    fn context(self, context: &'static str) -> Result<T, PreflightError>;
}

impl<T> ProviderResultExt<T> for Result<T, ProviderError> {
    fn context(self, context: &'static str) -> Result<T, PreflightError> {
        self.map_err(|source| PreflightError::Provider { context, source })
    }
}
