//! Provider interfaces and the resources they return.

use async_trait::async_trait;
use pvs_capacity::ResourcePool;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;

/// Source of system pool snapshots.
///
/// Each call must return an independent snapshot: the capacity engine
/// debits it in place.
#[async_trait]
pub trait SystemPoolProvider: Send + Sync {
    async fn fetch_system_pools(
        &self,
        service_instance_id: &str,
    ) -> Result<Vec<ResourcePool>, ProviderError>;
}

/// Access to a workspace's cloud connections and networks.
#[async_trait]
pub trait CloudConnectionProvider: Send + Sync {
    /// List cloud connections. Attached networks may be omitted here;
    /// use [`CloudConnectionProvider::get_cloud_connection`] for them.
    async fn list_cloud_connections(
        &self,
        service_instance_id: &str,
    ) -> Result<Vec<CloudConnection>, ProviderError>;

    async fn get_cloud_connection(
        &self,
        service_instance_id: &str,
        cloud_connection_id: &str,
    ) -> Result<CloudConnection, ProviderError>;

    async fn get_network(
        &self,
        service_instance_id: &str,
        network_id: &str,
    ) -> Result<Network, ProviderError>;
}

/// A cloud connection and the networks attached to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudConnection {
    #[serde(rename = "cloudConnectionID")]
    pub id: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub networks: Vec<NetworkReference>,
}

/// A network as referenced from a cloud connection. Carries no CIDR.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkReference {
    #[serde(rename = "networkID")]
    pub network_id: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub dhcp_managed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Network {
    #[serde(rename = "networkID")]
    pub network_id: String,

    #[serde(default)]
    pub name: String,

    pub cidr: String,
}

/// A fixed snapshot, handed out as a fresh copy on every fetch.
#[derive(Debug, Clone, Default)]
pub struct StaticPools {
    pools: Vec<ResourcePool>,
}

impl StaticPools {
    pub fn new(pools: Vec<ResourcePool>) -> Self {
        Self { pools }
    }
}

#[async_trait]
impl SystemPoolProvider for StaticPools {
    async fn fetch_system_pools(
        &self,
        _service_instance_id: &str,
    ) -> Result<Vec<ResourcePool>, ProviderError> {
        Ok(self.pools.clone())
    }
}
