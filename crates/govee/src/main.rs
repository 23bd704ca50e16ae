mod cli;
mod commands;
mod config;
mod error;
mod output;

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup tracing based on verbosity
    init_tracing(cli.global.verbose);

    // Dispatch and handle errors with proper exit codes
    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        // Config commands work without credentials
        Command::Config(args) => commands::config_cmd::handle(args, &cli.global),

        // Shell completions generation
        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "govee", &mut std::io::stdout());
            Ok(())
        }

        // Token inspection only needs the cache location
        Command::Token(args) => {
            let cfg = config::load(&cli.global)?;
            commands::token::handle(args, &cfg, &cli.global)
        }

        // Everything else talks to the Govee API
        cmd => {
            let cfg = config::load(&cli.global)?;
            let client_config = config::resolve_client_config(&cfg, &cli.global)?;
            let client = Arc::new(client_config.build_client()?);
            let ctx = commands::Context {
                format: config::output_format(&cli.global, Some(&cfg)),
                quiet: cli.global.quiet,
                color: output::should_color(cli.global.color),
            };

            tracing::debug!(command = ?cmd, "dispatching command");
            commands::dispatch(cmd, client, &client_config, &ctx).await
        }
    }
}
