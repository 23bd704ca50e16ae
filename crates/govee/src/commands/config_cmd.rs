//! Config subcommand handlers.

use dialoguer::{Input, Select};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config};
use crate::error::CliError;
use crate::output;

// ── Helpers ─────────────────────────────────────────────────────────

/// Copy of the config safe to print.
fn redacted(cfg: &Config) -> Config {
    let mut shown = cfg.clone();
    if shown.password.is_some() {
        shown.password = Some("****".into());
    }
    shown
}

/// Format config for display as TOML-like text.
fn format_config(cfg: &Config) -> String {
    use std::fmt::Write;
    let mut out = String::new();

    match cfg.email {
        Some(ref email) => {
            let _ = writeln!(out, "email = \"{email}\"");
        }
        None => {
            let _ = writeln!(out, "# email is not set");
        }
    }
    if cfg.password.is_some() {
        let _ = writeln!(out, "password = \"****\"");
    }
    let _ = writeln!(out, "base_url = \"{}\"", cfg.base_url);
    match cfg.cache_dir {
        Some(ref dir) => {
            let _ = writeln!(out, "cache_dir = \"{}\"", dir.display());
        }
        None => {
            let _ = writeln!(
                out,
                "# cache_dir defaults to {}",
                govee_config::default_cache_dir().display()
            );
        }
    }
    let _ = writeln!(out, "poll_interval = {}", cfg.poll_interval);
    let _ = writeln!(out, "timeout = {}", cfg.timeout);
    let _ = writeln!(out);
    let _ = writeln!(out, "[defaults]");
    let _ = writeln!(out, "output = \"{}\"", cfg.defaults.output);
    let _ = write!(out, "color = \"{}\"", cfg.defaults.color);

    out
}

/// Map a dialoguer / interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

fn parse_secs(field: &str, value: &str) -> Result<u64, CliError> {
    match value.parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(secs),
        _ => Err(CliError::Validation {
            field: field.into(),
            reason: "must be a positive number of seconds".into(),
        }),
    }
}

/// Apply `config set <key> <value>` to a loaded config.
fn set_value(cfg: &mut Config, key: &str, value: String) -> Result<(), CliError> {
    match key {
        "email" => cfg.email = Some(value),
        "base_url" | "base-url" => {
            if value.parse::<url::Url>().is_err() {
                return Err(CliError::Validation {
                    field: "base_url".into(),
                    reason: format!("invalid URL: {value}"),
                });
            }
            cfg.base_url = value;
        }
        "cache_dir" | "cache-dir" => cfg.cache_dir = Some(value.into()),
        "poll_interval" | "poll-interval" => cfg.poll_interval = parse_secs(key, &value)?,
        "timeout" => cfg.timeout = parse_secs(key, &value)?,
        "defaults.output" => {
            if !matches!(
                value.as_str(),
                "table" | "json" | "json-compact" | "yaml" | "plain"
            ) {
                return Err(CliError::Validation {
                    field: "defaults.output".into(),
                    reason: "must be table, json, json-compact, yaml, or plain".into(),
                });
            }
            cfg.defaults.output = value;
        }
        "defaults.color" => {
            if !matches!(value.as_str(), "auto" | "always" | "never") {
                return Err(CliError::Validation {
                    field: "defaults.color".into(),
                    reason: "must be auto, always, or never".into(),
                });
            }
            cfg.defaults.color = value;
        }
        other => {
            return Err(CliError::Validation {
                field: other.into(),
                reason: format!(
                    "unknown config key '{other}'. Valid keys: email, base_url, cache_dir, \
                     poll_interval, timeout, defaults.output, defaults.color"
                ),
            });
        }
    }
    Ok(())
}

/// Prompt for the password and store it in the keyring or return it for the file.
///
/// Returns `Some(password)` if the user chose plaintext, `None` if stored in keyring.
fn prompt_password_storage(email: &str) -> Result<Option<String>, CliError> {
    let password = rpassword::prompt_password("Password: ").map_err(prompt_err)?;
    if password.is_empty() {
        return Err(CliError::Validation {
            field: "password".into(),
            reason: "password cannot be empty".into(),
        });
    }

    let choices = &[
        "Store in system keyring (recommended)",
        "Save to config file (plaintext)",
    ];
    let selection = Select::new()
        .with_prompt("Where to store the password?")
        .items(choices)
        .default(0)
        .interact()
        .map_err(prompt_err)?;

    if selection == 0 {
        govee_config::store_password(email, &password)?;
        eprintln!("   ✓ Password stored in system keyring");
        Ok(None)
    } else {
        Ok(Some(password))
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let path = config::config_path(global);

    match args.command {
        // ── Init: interactive wizard ────────────────────────────────
        ConfigCommand::Init => {
            eprintln!("Govee CLI configuration wizard");
            eprintln!("   Config path: {}\n", path.display());

            let email: String = Input::new()
                .with_prompt("Govee account email")
                .interact_text()
                .map_err(prompt_err)?;
            let email = email.trim().to_owned();
            if email.is_empty() {
                return Err(CliError::Validation {
                    field: "email".into(),
                    reason: "email cannot be empty".into(),
                });
            }

            let password = prompt_password_storage(&email)?;

            let poll_interval: u64 = Input::new()
                .with_prompt("Poll interval (seconds)")
                .default(govee_core::DEFAULT_POLL_INTERVAL.as_secs())
                .interact_text()
                .map_err(prompt_err)?;
            if poll_interval == 0 {
                return Err(CliError::Validation {
                    field: "poll_interval".into(),
                    reason: "must be at least 1 second".into(),
                });
            }

            let cfg = Config {
                email: Some(email),
                password,
                poll_interval,
                ..Config::default()
            };
            govee_config::save_config_to(&path, &cfg)?;

            eprintln!("\n✓ Configuration written to {}", path.display());
            eprintln!("\n  Test it: govee devices");
            Ok(())
        }

        // ── Show ────────────────────────────────────────────────────
        ConfigCommand::Show => {
            let cfg = redacted(&config::load(global)?);
            let format = config::output_format(global, Some(&cfg));
            let out = output::render_single(format, &cfg, format_config, |_| {
                path.display().to_string()
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        // ── Path ────────────────────────────────────────────────────
        ConfigCommand::Path => {
            println!("{}", path.display());
            Ok(())
        }

        // ── Set <key> <value> ───────────────────────────────────────
        ConfigCommand::Set { key, value } => {
            let mut cfg = config::load(global)?;
            set_value(&mut cfg, &key, value)?;
            govee_config::save_config_to(&path, &cfg)?;
            eprintln!("✓ Set {key} in {}", path.display());
            Ok(())
        }

        // ── SetPassword ─────────────────────────────────────────────
        ConfigCommand::SetPassword => {
            let cfg = config::apply_overrides(config::load(global)?, global);
            let email = govee_config::require_email(&cfg)?;

            let password = rpassword::prompt_password("Password: ").map_err(prompt_err)?;
            if password.is_empty() {
                return Err(CliError::Validation {
                    field: "password".into(),
                    reason: "password cannot be empty".into(),
                });
            }
            govee_config::store_password(&email, &password)?;

            eprintln!("✓ Password stored in system keyring for {email}");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn set_value_updates_known_keys() {
        let mut cfg = Config::default();
        set_value(&mut cfg, "email", "me@example.com".into()).unwrap();
        set_value(&mut cfg, "poll-interval", "120".into()).unwrap();
        set_value(&mut cfg, "defaults.output", "json".into()).unwrap();

        assert_eq!(cfg.email.as_deref(), Some("me@example.com"));
        assert_eq!(cfg.poll_interval, 120);
        assert_eq!(cfg.defaults.output, "json");
    }

    #[test]
    fn set_value_rejects_bad_input() {
        let mut cfg = Config::default();
        for (key, value) in [
            ("timeout", "0"),
            ("poll_interval", "soon"),
            ("base_url", "not a url"),
            ("defaults.color", "purple"),
            ("profile", "home"),
        ] {
            let err = set_value(&mut cfg, key, value.into()).unwrap_err();
            assert!(matches!(err, CliError::Validation { .. }), "{key}");
        }
        assert_eq!(cfg.timeout, 30);
    }

    #[test]
    fn show_never_prints_the_password() {
        let cfg = Config {
            email: Some("me@example.com".into()),
            password: Some("hunter2".into()),
            ..Config::default()
        };
        let shown = redacted(&cfg);
        assert_eq!(shown.password.as_deref(), Some("****"));

        let text = format_config(&shown);
        assert!(text.contains("email = \"me@example.com\""));
        assert!(!text.contains("hunter2"));
    }
}
