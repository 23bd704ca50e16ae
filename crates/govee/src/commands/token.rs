//! Token command handlers: inspect or clear the token cache.

use chrono::{DateTime, Utc};
use serde::Serialize;

use govee_core::TokenStore;

use crate::cli::{GlobalOpts, TokenArgs, TokenCommand};
use crate::config::{self, Config};
use crate::error::CliError;
use crate::output;

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
enum CacheState {
    /// No cache file.
    Missing,
    /// File present but expired, malformed, or undecodable.
    Unusable,
    Valid,
}

#[derive(Debug, Serialize)]
struct TokenStatus {
    path: String,
    state: CacheState,
    expires_at: Option<DateTime<Utc>>,
}

impl TokenStatus {
    fn inspect(store: &TokenStore) -> Self {
        let path = store.path().display().to_string();
        if !store.path().exists() {
            return Self {
                path,
                state: CacheState::Missing,
                expires_at: None,
            };
        }
        match store.load() {
            Some(token) => Self {
                path,
                state: CacheState::Valid,
                expires_at: token.expires_at(),
            },
            None => Self {
                path,
                state: CacheState::Unusable,
                expires_at: None,
            },
        }
    }

    fn label(&self) -> &'static str {
        match self.state {
            CacheState::Missing => "missing",
            CacheState::Unusable => "unusable",
            CacheState::Valid => "valid",
        }
    }
}

fn detail(s: &TokenStatus) -> String {
    let mut lines = vec![
        format!("Path:    {}", s.path),
        format!("State:   {}", s.label()),
    ];
    if matches!(s.state, CacheState::Valid) {
        let expires = s
            .expires_at
            .map_or_else(|| "no expiry claim".into(), |at| at.to_rfc3339());
        lines.push(format!("Expires: {expires}"));
    }
    lines.join("\n")
}

fn clear_message(store: &TokenStore, removed: bool) -> String {
    let path = store.path().display();
    if removed {
        format!("Removed cached token at {path}")
    } else if store.path().exists() {
        format!("Could not remove cached token at {path}")
    } else {
        format!("No cached token at {path}")
    }
}

pub fn handle(args: TokenArgs, cfg: &Config, global: &GlobalOpts) -> Result<(), CliError> {
    let store = TokenStore::in_dir(config::cache_dir(cfg, global));
    let format = config::output_format(global, Some(cfg));

    match args.command {
        TokenCommand::Show => {
            let status = TokenStatus::inspect(&store);
            let out = output::render_single(format, &status, detail, |s| s.label().into())?;
            output::print_output(&out, global.quiet);
        }
        TokenCommand::Clear => {
            let message = clear_message(&store, store.clear());
            if !global.quiet {
                eprintln!("{message}");
            }
        }
    }
    Ok(())
}
