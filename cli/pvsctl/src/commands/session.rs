//! Session commands.

use anyhow::Result;
use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use crate::output::{print_output, print_single, OutputFormat};

use super::CommandContext;

/// Session commands.
#[derive(Debug, Args)]
pub struct SessionCommand {
    #[command(subcommand)]
    command: SessionSubcommand,
}

#[derive(Debug, Subcommand)]
enum SessionSubcommand {
    /// Resolve, save and show the session (API key redacted).
    Show,
}

impl SessionCommand {
    pub async fn run(self, ctx: CommandContext) -> Result<()> {
        match self.command {
            SessionSubcommand::Show => show_session(ctx),
        }
    }
}

#[derive(Debug, Serialize, Tabled)]
struct SessionRow {
    #[tabled(rename = "Field")]
    field: &'static str,

    #[tabled(rename = "Value")]
    value: String,
}

fn show_session(ctx: CommandContext) -> Result<()> {
    let session = ctx.session()?.redacted();

    match ctx.format {
        OutputFormat::Json => print_single(&serde_json::json!({
            "auth_file": ctx.auth_file.display().to_string(),
            "session": session,
        })),
        OutputFormat::Table => {
            let rows = vec![
                SessionRow {
                    field: "Auth file",
                    value: ctx.auth_file.display().to_string(),
                },
                SessionRow {
                    field: "User ID",
                    value: session.id,
                },
                SessionRow {
                    field: "API key",
                    value: session.api_key,
                },
                SessionRow {
                    field: "Region",
                    value: session.region,
                },
                SessionRow {
                    field: "Zone",
                    value: session.zone,
                },
            ];
            print_output(&rows, ctx.format);
        }
    }
    Ok(())
}
