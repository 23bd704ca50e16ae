//! Watch command: run the poller and print every cycle until interrupted.

use std::sync::Arc;
use std::time::Duration;

use owo_colors::OwoColorize;
use tokio_util::sync::CancellationToken;

use govee_core::{ClientConfig, GoveeClient, PollState, Poller};

use crate::cli::{OutputFormat, WatchArgs};
use crate::error::CliError;
use crate::output;

use super::{Context, devices};

pub async fn handle(
    client: Arc<GoveeClient>,
    args: WatchArgs,
    client_config: &ClientConfig,
    ctx: &Context,
) -> Result<(), CliError> {
    let interval = match args.interval {
        Some(0) => {
            return Err(CliError::Validation {
                field: "interval".into(),
                reason: "must be at least 1 second".into(),
            });
        }
        Some(secs) => Duration::from_secs(secs),
        None => client_config.poll_interval,
    };

    let cancel = CancellationToken::new();
    let poller = Poller::spawn(client, interval, cancel.child_token());
    let mut updates = poller.subscribe();
    let mut seen = 0_u64;

    let result = loop {
        tokio::select! {
            biased;
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("interrupted, stopping");
                break Ok(());
            }
            changed = updates.changed() => {
                if changed.is_err() {
                    break Ok(());
                }
                let state = updates.borrow_and_update().clone();
                if state.cycles == seen {
                    continue;
                }
                seen = state.cycles;

                if let Err(e) = print_cycle(&state, ctx) {
                    break Err(e);
                }
                if args.count.is_some_and(|n| seen >= n) {
                    break Ok(());
                }
            }
        }
    };

    cancel.cancel();
    poller.shutdown().await;
    result
}

fn print_cycle(state: &PollState, ctx: &Context) -> Result<(), CliError> {
    if !state.available {
        let reason = state.last_error.as_deref().unwrap_or("unknown error");
        let line = format!("poll failed: {reason}");
        if ctx.color {
            eprintln!("{}", line.yellow());
        } else {
            eprintln!("{line}");
        }
        // Nothing new to show until a cycle succeeds
        if state.thermometers.is_empty() {
            return Ok(());
        }
    }

    if ctx.format == OutputFormat::Table && !ctx.quiet {
        let stamp = state
            .last_success
            .map_or_else(|| "-".into(), |at| at.format("%H:%M:%S").to_string());
        let header = format!("── cycle {} · last success {stamp} ──", state.cycles);
        if ctx.color {
            eprintln!("{}", header.dimmed());
        } else {
            eprintln!("{header}");
        }
    }

    // Compact JSON keeps one line per cycle for piping into other tools
    let format = match ctx.format {
        OutputFormat::Json => OutputFormat::JsonCompact,
        other => other,
    };
    let out = devices::render_list(&state.thermometers, &Context { format, ..*ctx })?;
    output::print_output(&out, ctx.quiet);
    Ok(())
}
