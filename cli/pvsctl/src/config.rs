//! Runtime configuration.
//!
//! Everything here comes from the environment; the session (API key,
//! region, zone) is resolved separately in [`crate::session`].

use std::time::Duration;

use anyhow::{Context, Result};
use pvs_provider::{ClientConfig, DEFAULT_IAM_URL};

/// CLI configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// API endpoint override. Derived from the session region when unset.
    pub api_url: Option<String>,

    pub iam_url: String,

    pub log_level: String,

    pub request_timeout: Duration,

    /// Workspace CRN sent with every API request.
    pub crn: Option<String>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_url = non_empty("PVS_API_URL");

        let iam_url = non_empty("PVS_IAM_URL").unwrap_or_else(|| DEFAULT_IAM_URL.to_string());

        let log_level = non_empty("PVS_LOG_LEVEL").unwrap_or_else(|| "warn".to_string());

        let request_timeout = match non_empty("PVS_REQUEST_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(
                raw.trim()
                    .parse()
                    .with_context(|| format!("Invalid PVS_REQUEST_TIMEOUT_SECS: {}", raw))?,
            ),
            None => Duration::from_secs(60),
        };

        let crn = non_empty("PVS_CRN");

        Ok(Self {
            api_url,
            iam_url,
            log_level,
            request_timeout,
            crn,
        })
    }

    /// Client settings for a region.
    pub fn client_config(&self, region: &str) -> ClientConfig {
        let mut config = match self.api_url.as_deref() {
            Some(url) => ClientConfig::new(url),
            None => ClientConfig::for_region(region),
        };
        config.iam_url = self.iam_url.clone();
        config.request_timeout = self.request_timeout;
        config.crn = self.crn.clone();
        config
    }
}
