//! # pvs-provider
//!
//! The remote side of pre-flight validation.
//!
//! - [`SystemPoolProvider`] returns a fresh snapshot of the workspace's
//!   system pools; [`validate_capacity`] fetches one and runs the capacity
//!   engine against it.
//! - [`CloudConnectionProvider`] exposes cloud connections and their
//!   networks for the topology validators.
//! - [`PowerClient`] implements both over the provider's REST API.
//!
//! Every provider call is bounded by a timeout and never retried.

mod capacity;
mod client;
mod error;
mod provider;
mod topology;

pub use capacity::{fetch_system_pools, plan_capacity_live, validate_capacity, POOL_FETCH_TIMEOUT};
pub use client::{ClientConfig, PowerClient, DEFAULT_IAM_URL};
pub use error::{PreflightError, ProviderError, ProviderResultExt};
pub use provider::{
    CloudConnection, CloudConnectionProvider, Network, NetworkReference, StaticPools,
    SystemPoolProvider,
};
pub use topology::{
    validate_cloud_connection_in_region, validate_dhcp_service, CLOUD_CONNECTION_TIMEOUT,
    DHCP_VALIDATION_TIMEOUT, MAX_CLOUD_CONNECTIONS,
};
