//! CLI commands.

mod network;
mod pools;
mod session;
mod validate;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use pvs_provider::PowerClient;
use tracing::debug;

use crate::config::Config;
use crate::output::OutputFormat;
use crate::session::{auth_file_path, SessionVars};

/// pvs-preflight - Pre-flight checks for Power Systems Virtual Server installs.
#[derive(Debug, Parser)]
#[command(name = "pvs-preflight")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Output format (table or json).
    #[arg(long, global = true, default_value = "table")]
    format: String,

    /// Never prompt; fail when session variables are missing.
    #[arg(long, global = true, env = "PVS_NO_PROMPT")]
    no_prompt: bool,

    /// Emit logs as JSON lines on stderr.
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Show or refresh the saved session.
    Session(session::SessionCommand),

    /// List the system pools of a workspace.
    Pools(pools::PoolsCommand),

    /// Check that an install plan fits in the workspace's system pools.
    Validate(validate::ValidateCommand),

    /// Check machine networks against the cloud connection topology.
    Network(network::NetworkCommand),

    /// Show CLI version.
    Version,
}

impl Cli {
    pub fn json_logs(&self) -> bool {
        self.json_logs
    }

    /// Run the CLI command.
    pub async fn run(self, config: Config) -> Result<()> {
        let ctx = CommandContext {
            config,
            format: OutputFormat::parse(&self.format),
            interactive: !self.no_prompt,
            auth_file: auth_file_path()?,
        };

        match self.command {
            Commands::Session(cmd) => cmd.run(ctx).await,
            Commands::Pools(cmd) => cmd.run(ctx).await,
            Commands::Validate(cmd) => cmd.run(ctx).await,
            Commands::Network(cmd) => cmd.run(ctx).await,
            Commands::Version => {
                println!("pvs-preflight {}", env!("CARGO_PKG_VERSION"));
                Ok(())
            }
        }
    }
}

/// Shared command context.
pub struct CommandContext {
    pub config: Config,
    pub format: OutputFormat,
    pub interactive: bool,
    pub auth_file: PathBuf,
}

impl CommandContext {
    /// Resolve session variables from file, environment and prompts.
    pub fn session(&self) -> Result<SessionVars> {
        crate::session::resolve(&self.auth_file, self.interactive)
    }

    /// Get an authenticated API client for the session's region.
    pub async fn client(&self) -> Result<PowerClient> {
        let session = self.session()?;
        let config = self.config.client_config(&session.region);
        debug!(api_url = %config.api_url, region = %session.region, "Authenticating");
        Ok(PowerClient::authenticate(&config, &session.api_key).await?)
    }
}
