//! Login command: force a fresh login and refresh the token cache.

use chrono::{DateTime, Utc};
use serde::Serialize;

use govee_core::GoveeClient;

use crate::error::CliError;
use crate::output;

use super::Context;

#[derive(Debug, Serialize)]
struct LoginSummary {
    email: String,
    expires_at: Option<DateTime<Utc>>,
    cache_path: String,
}

fn detail(s: &LoginSummary) -> String {
    let expires = s
        .expires_at
        .map_or_else(|| "no expiry claim".into(), |at| at.to_rfc3339());
    [
        format!("Logged in as {}", s.email),
        format!("Token expires: {expires}"),
        format!("Cached at:     {}", s.cache_path),
    ]
    .join("\n")
}

pub async fn handle(client: &GoveeClient, ctx: &Context) -> Result<(), CliError> {
    let token = client.login().await.map_err(govee_core::CoreError::from)?;

    let summary = LoginSummary {
        email: client.credentials().email().to_owned(),
        expires_at: token.expires_at(),
        cache_path: client.token_store().path().display().to_string(),
    };
    let out = output::render_single(ctx.format, &summary, detail, |s| s.email.clone())?;
    output::print_output(&out, ctx.quiet);
    Ok(())
}
