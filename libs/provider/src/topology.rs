//! Network topology validators.
//!
//! Boundary checks run alongside the capacity check: machine networks must
//! not collide with networks already reachable through the workspace's
//! cloud connections, and the zone must have room for a new DHCP-backed
//! cloud connection.

use std::time::Duration;

use pvs_networking::{first_conflict, Cidr};
use tracing::{debug, instrument};

use crate::error::{PreflightError, ProviderError, ProviderResultExt};
use crate::provider::CloudConnectionProvider;

/// Upper bound on the whole DHCP service validation.
pub const DHCP_VALIDATION_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// Upper bound on the whole cloud connection validation.
pub const CLOUD_CONNECTION_TIMEOUT: Duration = Duration::from_secs(2 * 60);

/// Cloud connections allowed per zone.
pub const MAX_CLOUD_CONNECTIONS: usize = 2;

/// Check that no machine network overlaps a network attached to an existing
/// cloud connection.
#[instrument(skip(provider, machine_networks), fields(machine_networks = machine_networks.len()))]
pub async fn validate_dhcp_service<P>(
    provider: &P,
    service_instance_id: &str,
    machine_networks: &[Cidr],
) -> Result<(), PreflightError>
where
    P: CloudConnectionProvider + ?Sized,
{
    tokio::time::timeout(
        DHCP_VALIDATION_TIMEOUT,
        check_network_conflicts(provider, service_instance_id, machine_networks),
    )
    .await
    .unwrap_or_else(|_| {
        Err(ProviderError::Timeout {
            operation: "DHCP service validation",
            after: DHCP_VALIDATION_TIMEOUT,
        })
        .context("failed to validate DHCP service")
    })
}

async fn check_network_conflicts<P>(
    provider: &P,
    service_instance_id: &str,
    machine_networks: &[Cidr],
) -> Result<(), PreflightError>
where
    P: CloudConnectionProvider + ?Sized,
{
    let connections = provider
        .list_cloud_connections(service_instance_id)
        .await
        .context("failed to get all existing cloud connections")?;

    for summary in connections {
        // The list call does not fill in attached networks.
        let connection = provider
            .get_cloud_connection(service_instance_id, &summary.id)
            .await
            .context("failed to get existing cloud connection details")?;

        for reference in &connection.networks {
            // References carry no CIDR; fetch the network itself.
            let network = provider
                .get_network(service_instance_id, &reference.network_id)
                .await
                .context("failed to get cloud connection network")?;
            let existing: Cidr = network.cidr.parse()?;

            debug!(
                cloud_connection = %connection.id,
                network = %network.network_id,
                cidr = %existing,
                "Checking attached network"
            );

            if let Some((existing, machine)) =
                first_conflict(std::iter::once(&existing), machine_networks)
            {
                return Err(PreflightError::CidrConflict { existing, machine });
            }
        }
    }

    Ok(())
}

/// Check that the zone can take another cloud connection and that no
/// existing one is attached to a DHCP-managed network.
#[instrument(skip(provider))]
pub async fn validate_cloud_connection_in_region<P>(
    provider: &P,
    service_instance_id: &str,
) -> Result<(), PreflightError>
where
    P: CloudConnectionProvider + ?Sized,
{
    tokio::time::timeout(
        CLOUD_CONNECTION_TIMEOUT,
        check_cloud_connections(provider, service_instance_id),
    )
    .await
    .unwrap_or_else(|_| {
        Err(ProviderError::Timeout {
            operation: "cloud connection validation",
            after: CLOUD_CONNECTION_TIMEOUT,
        })
        .context("failed to validate cloud connections")
    })
}

async fn check_cloud_connections<P>(
    provider: &P,
    service_instance_id: &str,
) -> Result<(), PreflightError>
where
    P: CloudConnectionProvider + ?Sized,
{
    let connections = provider
        .list_cloud_connections(service_instance_id)
        .await
        .context("failed to get existing cloud connection details")?;

    if connections.len() >= MAX_CLOUD_CONNECTIONS {
        return Err(PreflightError::TooManyCloudConnections {
            count: connections.len(),
            max: MAX_CLOUD_CONNECTIONS,
        });
    }

    for summary in connections {
        let connection = provider
            .get_cloud_connection(service_instance_id, &summary.id)
            .await
            .context("failed to get cloud connection details")?;

        if connection.networks.iter().any(|n| n.dhcp_managed) {
            return Err(PreflightError::DhcpCloudConnection {
                connection: connection.id,
            });
        }
    }

    Ok(())
}
