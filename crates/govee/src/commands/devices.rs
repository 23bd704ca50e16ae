//! Device command handlers.

use tabled::Tabled;

use govee_core::{GoveeClient, Thermometer, poll_once};

use crate::cli::DevicesArgs;
use crate::error::CliError;
use crate::output;

use super::Context;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
pub(crate) struct ThermometerRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "MAC")]
    mac: String,
    #[tabled(rename = "Temp")]
    temperature: String,
    #[tabled(rename = "Humidity")]
    humidity: String,
    #[tabled(rename = "Battery")]
    battery: String,
    #[tabled(rename = "Online")]
    online: String,
    #[tabled(rename = "Updated")]
    updated: String,
}

impl From<&Thermometer> for ThermometerRow {
    fn from(t: &Thermometer) -> Self {
        let r = &t.telemetry;
        Self {
            name: t.name.clone(),
            mac: t.mac.clone(),
            temperature: output::reading(r.temperature, "°C"),
            humidity: output::reading(r.humidity, "%"),
            battery: output::reading(r.battery, "%"),
            online: if r.online { "yes" } else { "no" }.into(),
            updated: updated_label(t),
        }
    }
}

fn updated_label(t: &Thermometer) -> String {
    t.telemetry.last_update_at().map_or_else(
        || "-".into(),
        |at| at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    )
}

fn detail(t: &Thermometer) -> String {
    let r = &t.telemetry;
    [
        format!("Name:        {}", t.name),
        format!("MAC:         {}", t.mac),
        format!("SKU:         {}", t.sku),
        format!("Firmware:    {}", t.firmware_version.as_deref().unwrap_or("-")),
        format!("Hardware:    {}", t.hardware_version.as_deref().unwrap_or("-")),
        format!("Temperature: {}", output::reading(r.temperature, " °C")),
        format!("Humidity:    {}", output::reading(r.humidity, " %")),
        format!("Battery:     {}", output::reading(r.battery, " %")),
        format!("Online:      {}", if r.online { "yes" } else { "no" }),
        format!("Updated:     {}", updated_label(t)),
    ]
    .join("\n")
}

/// Match a thermometer by MAC (case-insensitive) or exact name.
fn find<'a>(thermometers: &'a [Thermometer], identifier: &str) -> Option<&'a Thermometer> {
    thermometers
        .iter()
        .find(|t| t.mac.eq_ignore_ascii_case(identifier))
        .or_else(|| thermometers.iter().find(|t| t.name == identifier))
}

/// Render a thermometer list in the selected format.
pub(crate) fn render_list(
    thermometers: &[Thermometer],
    ctx: &Context,
) -> Result<String, CliError> {
    output::render_list(
        ctx.format,
        thermometers,
        |t| ThermometerRow::from(t),
        |t| t.mac.clone(),
    )
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    client: &GoveeClient,
    args: DevicesArgs,
    ctx: &Context,
) -> Result<(), CliError> {
    let thermometers = poll_once(client).await?;

    let out = match args.device {
        Some(identifier) => {
            let found = find(&thermometers, &identifier)
                .ok_or(CliError::NotFound { identifier })?;
            output::render_single(ctx.format, found, detail, |t| t.mac.clone())?
        }
        None => render_list(&thermometers, ctx)?,
    };
    output::print_output(&out, ctx.quiet);
    Ok(())
}
