//! Session resolution.
//!
//! Session variables are gathered in order of precedence:
//! 1. the persisted auth file,
//! 2. environment variables (first non-empty name wins),
//! 3. interactive prompts,
//!
//! and the result is written back to the auth file.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use dialoguer::{Input, Password};
use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Overrides the auth file location.
pub const AUTH_FILE_ENV: &str = "POWERVS_AUTH_FILEPATH";

const ID_ENV_VARS: &[&str] = &["IBMID"];
const API_KEY_ENV_VARS: &[&str] = &["IC_API_KEY", "IBMCLOUD_API_KEY", "BM_API_KEY", "BLUEMIX_API_KEY"];
const REGION_ENV_VARS: &[&str] = &["IBMCLOUD_REGION", "IC_REGION"];
const ZONE_ENV_VARS: &[&str] = &["IBMCLOUD_ZONE"];

/// Default auth file: `~/.powervs/config.json`.
fn default_auth_file() -> Result<PathBuf> {
    BaseDirs::new()
        .map(|dirs| dirs.home_dir().join(".powervs").join("config.json"))
        .ok_or_else(|| anyhow::anyhow!("Could not determine home directory"))
}

/// Resolve the auth file path.
pub fn auth_file_path() -> Result<PathBuf> {
    match std::env::var(AUTH_FILE_ENV) {
        Ok(path) if !path.is_empty() => Ok(PathBuf::from(path)),
        _ => default_auth_file(),
    }
}

/// Variables needed to open a session with the provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionVars {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,

    #[serde(default, rename = "apikey", skip_serializing_if = "String::is_empty")]
    pub api_key: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub region: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub zone: String,
}

impl SessionVars {
    /// Load from the auth file. A missing file yields empty variables.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read auth file {:?}", path))?;

        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse auth file {:?}", path))
    }

    /// Fill empty fields from the environment.
    pub fn fill_from_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let first = |names: &[&str]| {
            names
                .iter()
                .find_map(|name| lookup(name).filter(|v| !v.is_empty()))
                .unwrap_or_default()
        };

        if self.id.is_empty() {
            self.id = first(ID_ENV_VARS);
        }
        if self.api_key.is_empty() {
            self.api_key = first(API_KEY_ENV_VARS);
        }
        if self.region.is_empty() {
            self.region = first(REGION_ENV_VARS);
        }
        if self.zone.is_empty() {
            self.zone = first(ZONE_ENV_VARS);
        }
    }

    /// Fields a session cannot be opened without.
    pub fn missing_required(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.api_key.is_empty() {
            missing.push("apikey");
        }
        if self.region.is_empty() {
            missing.push("region");
        }
        missing
    }

    /// Prompt for every empty field.
    pub fn prompt_missing(&mut self) -> Result<()> {
        if self.id.is_empty() {
            self.id = Input::<String>::new()
                .with_prompt("IBM Cloud User ID")
                .interact_text()
                .context("Error saving the IBM Cloud User ID")?;
        }

        if self.api_key.is_empty() {
            self.api_key = Password::new()
                .with_prompt("IBM Cloud API Key")
                .interact()
                .context("Error saving the API Key")?;
        }

        if self.region.is_empty() {
            self.region = Input::<String>::new()
                .with_prompt("Region")
                .default("us-south".to_string())
                .interact_text()
                .context("Error saving the region")?;
        }

        if self.zone.is_empty() {
            self.zone = Input::<String>::new()
                .with_prompt("Zone")
                .interact_text()
                .context("Error saving the zone")?;
        }

        Ok(())
    }

    /// Persist to the auth file, readable by the owner only.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create {:?}", dir))?;
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                fs::set_permissions(dir, fs::Permissions::from_mode(0o700))?;
            }
        }

        let contents = serde_json::to_string(self)?;

        #[cfg(unix)]
        {
            use std::io::Write;
            use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

            let mut file = fs::OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .mode(0o600)
                .open(path)
                .with_context(|| format!("Failed to write auth file {:?}", path))?;
            file.write_all(contents.as_bytes())?;

            // `mode` only applies when the file is created.
            fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
        }

        #[cfg(not(unix))]
        {
            fs::write(path, contents)
                .with_context(|| format!("Failed to write auth file {:?}", path))?;
        }

        Ok(())
    }

    /// Copy with the API key masked, for display.
    pub fn redacted(&self) -> Self {
        // Byte offset of the fourth char from the end.
        let tail = self.api_key.char_indices().rev().nth(3).map(|(i, _)| i);
        let api_key = match tail {
            _ if self.api_key.is_empty() => String::new(),
            Some(start) if start > 0 => format!("****{}", &self.api_key[start..]),
            _ => "****".to_string(),
        };
        Self {
            api_key,
            ..self.clone()
        }
    }
}

/// Resolve the session from file, environment and (optionally) prompts,
/// then persist it.
pub fn resolve(path: &Path, interactive: bool) -> Result<SessionVars> {
    debug!(path = %path.display(), "Gathering session variables from auth file");
    let mut vars = SessionVars::load(path)?;

    debug!("Gathering session variables from environment");
    vars.fill_from_env(|key| std::env::var(key).ok());

    if interactive {
        vars.prompt_missing()?;
    } else {
        let missing = vars.missing_required();
        if !missing.is_empty() {
            bail!(crate::error::CliError::MissingSession(missing.join(", ")));
        }
    }

    vars.save(path)?;
    Ok(vars)
}
