//! HTTP client for the Power Systems Virtual Server API.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use pvs_capacity::ResourcePool;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use serde::{de::DeserializeOwned, Deserialize};
use tracing::{debug, instrument};

use crate::error::ProviderError;
use crate::provider::{CloudConnection, CloudConnectionProvider, Network, SystemPoolProvider};

/// Default IAM endpoint for exchanging an API key for a bearer token.
pub const DEFAULT_IAM_URL: &str = "https://iam.cloud.ibm.com";

const APIKEY_GRANT_TYPE: &str = "urn:ibm:params:oauth:grant-type:apikey";

/// Connection settings for [`PowerClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Regional API endpoint, e.g. `https://us-south.power-iaas.cloud.ibm.com`.
    pub api_url: String,

    pub iam_url: String,

    /// Per-request timeout.
    pub request_timeout: Duration,

    /// Workspace CRN, sent as the `CRN` header when set.
    pub crn: Option<String>,
}

impl ClientConfig {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            iam_url: DEFAULT_IAM_URL.to_string(),
            request_timeout: Duration::from_secs(60),
            crn: None,
        }
    }

    /// Regional endpoint for a region name.
    pub fn for_region(region: &str) -> Self {
        Self::new(format!("https://{}.power-iaas.cloud.ibm.com", region))
    }
}

/// Client for the provider's REST API.
#[derive(Debug, Clone)]
pub struct PowerClient {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

impl PowerClient {
    /// Exchange an API key for a bearer token and build a client.
    #[instrument(skip(config, api_key), fields(iam_url = %config.iam_url))]
    pub async fn authenticate(config: &ClientConfig, api_key: &str) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        let url = format!("{}/identity/token", config.iam_url.trim_end_matches('/'));
        let response = http
            .post(url)
            .header(ACCEPT, "application/json")
            .form(&[("grant_type", APIKEY_GRANT_TYPE), ("apikey", api_key)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Auth(format!(
                "IAM returned {}: {}",
                status.as_u16(),
                error_message(&body)
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Auth(format!("invalid token response: {}", e)))?;

        debug!("Obtained IAM token");
        Self::with_token(config, &token.access_token)
    }

    /// Build a client around an existing bearer token.
    pub fn with_token(config: &ClientConfig, token: &str) -> Result<Self, ProviderError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| ProviderError::Auth("invalid token format".to_string()))?,
        );
        if let Some(crn) = config.crn.as_deref() {
            headers.insert(
                "crn",
                HeaderValue::from_str(crn)
                    .map_err(|_| ProviderError::Auth("invalid CRN format".to_string()))?,
            );
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            http,
            base_url: config.api_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, service_instance_id: &str, path: &str) -> String {
        format!(
            "{}/pcloud/v1/cloud-instances/{}{}",
            self.base_url, service_instance_id, path
        )
    }

    async fn get<T: DeserializeOwned>(&self, url: String) -> Result<T, ProviderError> {
        let response = self.http.get(url).send().await?;
        let status = response.status();

        if status.is_success() {
            response
                .json()
                .await
                .map_err(|e| ProviderError::Decode(e.to_string()))
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(ProviderError::Api {
                status: status.as_u16(),
                message: error_message(&body),
            })
        }
    }
}

/// Provider error body. Different endpoints fill different fields.
#[derive(Debug, Default, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default, rename = "errorMessage")]
    error_message: Option<String>,
}

fn error_message(body: &str) -> String {
    let parsed: ApiErrorBody = serde_json::from_str(body).unwrap_or_default();
    parsed
        .description
        .or(parsed.message)
        .or(parsed.error_message)
        .or(parsed.error)
        .unwrap_or_else(|| {
            if body.trim().is_empty() {
                "Unknown error".to_string()
            } else {
                body.trim().to_string()
            }
        })
}

#[derive(Debug, Deserialize)]
struct SystemPoolPayload {
    #[serde(rename = "type", default)]
    pool_type: Option<String>,

    #[serde(rename = "maxCoresAvailable", default)]
    max_cores_available: Option<SystemResourcesPayload>,
}

#[derive(Debug, Deserialize)]
struct SystemResourcesPayload {
    #[serde(default)]
    cores: Option<f64>,
    #[serde(default)]
    memory: Option<i64>,
}

/// Convert the provider's pool map into a snapshot ordered by pool name.
fn pools_from_payload(
    payload: BTreeMap<String, SystemPoolPayload>,
) -> Result<Vec<ResourcePool>, ProviderError> {
    payload
        .into_iter()
        .map(|(name, pool)| {
            let pool_type = pool.pool_type.unwrap_or_else(|| name.clone());
            let max = pool.max_cores_available.ok_or_else(|| {
                ProviderError::Decode(format!("system pool {} has no maxCoresAvailable", name))
            })?;
            let (Some(cores), Some(memory)) = (max.cores, max.memory) else {
                return Err(ProviderError::Decode(format!(
                    "system pool {} is missing cores or memory",
                    name
                )));
            };
            Ok(ResourcePool::named(name, pool_type, cores, memory))
        })
        .collect()
}

#[async_trait]
impl SystemPoolProvider for PowerClient {
    #[instrument(skip(self))]
    async fn fetch_system_pools(
        &self,
        service_instance_id: &str,
    ) -> Result<Vec<ResourcePool>, ProviderError> {
        let payload: BTreeMap<String, SystemPoolPayload> =
            self.get(self.url(service_instance_id, "/system-pools")).await?;
        let pools = pools_from_payload(payload)?;
        debug!(pool_count = pools.len(), "Fetched system pools");
        Ok(pools)
    }
}

#[derive(Debug, Deserialize)]
struct CloudConnectionsPayload {
    #[serde(rename = "cloudConnections", default)]
    cloud_connections: Vec<CloudConnection>,
}

#[async_trait]
impl CloudConnectionProvider for PowerClient {
    async fn list_cloud_connections(
        &self,
        service_instance_id: &str,
    ) -> Result<Vec<CloudConnection>, ProviderError> {
        let payload: CloudConnectionsPayload = self
            .get(self.url(service_instance_id, "/cloud-connections"))
            .await?;
        Ok(payload.cloud_connections)
    }

    async fn get_cloud_connection(
        &self,
        service_instance_id: &str,
        cloud_connection_id: &str,
    ) -> Result<CloudConnection, ProviderError> {
        self.get(self.url(
            service_instance_id,
            &format!("/cloud-connections/{}", cloud_connection_id),
        ))
        .await
    }

    async fn get_network(
        &self,
        service_instance_id: &str,
        network_id: &str,
    ) -> Result<Network, ProviderError> {
        self.get(self.url(service_instance_id, &format!("/networks/{}", network_id)))
            .await
    }
}
