//! Error handling and display for the CLI.

use colored::Colorize;
use pvs_capacity::CapacityError;
use pvs_provider::{PreflightError, ProviderError};
use thiserror::Error;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Missing session variables: {0}")]
    MissingSession(String),

    #[error("No service instance given. Use --service-instance or set it in the plan file.")]
    NoServiceInstance,

    #[error("Invalid plan file: {0}")]
    InvalidPlan(String),
}

/// Print an error in a user-friendly format.
pub fn print_error(err: &anyhow::Error) {
    eprintln!("{} {}", "Error:".red().bold(), err);

    if let Some(hint) = hint_for(err) {
        eprintln!("\n{}", format!("Hint: {hint}").yellow());
    }
}

fn hint_for(err: &anyhow::Error) -> Option<&'static str> {
    if let Some(cli_err) = err.downcast_ref::<CliError>() {
        return match cli_err {
            CliError::MissingSession(_) => Some(
                "Set IBMCLOUD_API_KEY and IBMCLOUD_REGION, or run without --no-prompt.",
            ),
            _ => None,
        };
    }

    if let Some(capacity) = err.downcast_ref::<CapacityError>() {
        return capacity_hint(capacity);
    }

    match err.downcast_ref::<PreflightError>()? {
        PreflightError::Capacity(capacity) => capacity_hint(capacity),
        PreflightError::Provider { source, .. } => provider_hint(source),
        PreflightError::CidrConflict { .. } => {
            Some("Choose a machine network that does not overlap existing cloud connection networks.")
        }
        PreflightError::TooManyCloudConnections { .. } | PreflightError::DhcpCloudConnection { .. } => {
            Some("Remove an unused cloud connection in this zone or install into another zone.")
        }
        PreflightError::Network(_) => None,
    }
}

fn capacity_hint(err: &CapacityError) -> Option<&'static str> {
    if err.is_capacity_shortfall() {
        Some("Reduce replicas, processors or memory, or switch the processor type to Shared.")
    } else if matches!(err, CapacityError::HeterogeneousRole { .. }) {
        Some("Use a single system type and processor type per role, or drop --strict.")
    } else {
        Some("Check the processor count, processor type and memory in the plan file.")
    }
}

fn provider_hint(err: &ProviderError) -> Option<&'static str> {
    match err {
        ProviderError::Auth(_) => Some("Check the API key saved in the auth file or environment."),
        ProviderError::Api { status: 401, .. } | ProviderError::Api { status: 403, .. } => {
            Some("You may not have permission for this workspace.")
        }
        e if e.is_not_found() => Some("Check the service instance ID."),
        ProviderError::Http(_) | ProviderError::Timeout { .. } => {
            Some("Check your network connection and API endpoint.")
        }
        _ => None,
    }
}
