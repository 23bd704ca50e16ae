//! Command dispatch: bridges CLI args -> client calls -> output formatting.

pub mod config_cmd;
pub mod devices;
pub mod login;
pub mod token;
pub mod watch;

use std::sync::Arc;

use govee_core::{ClientConfig, GoveeClient};

use crate::cli::{Command, OutputFormat};
use crate::error::CliError;

/// Presentation settings resolved once per invocation.
#[derive(Debug, Clone, Copy)]
pub struct Context {
    pub format: OutputFormat,
    pub quiet: bool,
    pub color: bool,
}

/// Dispatch an API-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    client: Arc<GoveeClient>,
    client_config: &ClientConfig,
    ctx: &Context,
) -> Result<(), CliError> {
    match cmd {
        Command::Devices(args) => devices::handle(&client, args, ctx).await,
        Command::Watch(args) => watch::handle(client, args, client_config, ctx).await,
        Command::Login => login::handle(&client, ctx).await,
        // Config, Token, and Completions are handled before dispatch
        Command::Config(_) | Command::Token(_) | Command::Completions(_) => Ok(()),
    }
}
