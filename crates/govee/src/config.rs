//! CLI configuration: thin wrapper around `govee_config`.
//!
//! Adds resolution that respects `GlobalOpts` flag overrides
//! (--config, --email, --cache-dir, --timeout, ...).

use std::path::PathBuf;

use govee_core::ClientConfig;

use crate::cli::{GlobalOpts, OutputFormat};
use crate::error::CliError;

pub use govee_config::Config;

/// The config file this invocation reads and writes.
pub fn config_path(global: &GlobalOpts) -> PathBuf {
    global.config.clone().unwrap_or_else(govee_config::config_path)
}

/// Load the config file (plus `GOVEE_*` env) without flag overrides.
pub fn load(global: &GlobalOpts) -> Result<Config, CliError> {
    Ok(govee_config::load_config_from(&config_path(global))?)
}

/// Apply CLI flag overrides on top of the loaded config.
pub fn apply_overrides(mut cfg: Config, global: &GlobalOpts) -> Config {
    if let Some(ref email) = global.email {
        cfg.email = Some(email.clone());
    }
    if let Some(ref url) = global.base_url {
        cfg.base_url.clone_from(url);
    }
    if let Some(ref dir) = global.cache_dir {
        cfg.cache_dir = Some(dir.clone());
    }
    if let Some(timeout) = global.timeout {
        cfg.timeout = timeout;
    }
    cfg
}

/// Resolve everything needed to build a client: file and env, then flags,
/// then the password chain.
pub fn resolve_client_config(cfg: &Config, global: &GlobalOpts) -> Result<ClientConfig, CliError> {
    let merged = apply_overrides(cfg.clone(), global);
    Ok(govee_config::to_client_config(&merged)?)
}

/// Token cache directory: flag > config > platform cache dir.
pub fn cache_dir(cfg: &Config, global: &GlobalOpts) -> PathBuf {
    global
        .cache_dir
        .clone()
        .or_else(|| cfg.cache_dir.clone())
        .unwrap_or_else(govee_config::default_cache_dir)
}

/// Output format: flag > config `defaults.output` > table.
pub fn output_format(global: &GlobalOpts, cfg: Option<&Config>) -> OutputFormat {
    if let Some(format) = global.output {
        return format;
    }
    let configured = cfg.map(|c| c.defaults.output.as_str()).unwrap_or_default();
    match configured {
        "json" => OutputFormat::Json,
        "json-compact" => OutputFormat::JsonCompact,
        "yaml" => OutputFormat::Yaml,
        "plain" => OutputFormat::Plain,
        _ => OutputFormat::Table,
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;
    use crate::cli::Cli;

    fn global(args: &[&str]) -> GlobalOpts {
        let mut argv = vec!["govee"];
        argv.extend_from_slice(args);
        argv.push("login");
        match Cli::try_parse_from(argv) {
            Ok(cli) => cli.global,
            Err(e) => panic!("{e}"),
        }
    }

    #[test]
    fn flags_override_config_values() {
        let cfg = Config {
            email: Some("file@example.com".into()),
            timeout: 30,
            ..Config::default()
        };
        let opts = global(&["--email", "flag@example.com", "--timeout", "5"]);

        let merged = apply_overrides(cfg, &opts);
        assert_eq!(merged.email.as_deref(), Some("flag@example.com"));
        assert_eq!(merged.timeout, 5);
        assert_eq!(merged.poll_interval, 300);
    }

    #[test]
    fn output_format_falls_back_to_config_default() {
        let mut cfg = Config::default();
        cfg.defaults.output = "yaml".into();

        assert_eq!(output_format(&global(&[]), Some(&cfg)), OutputFormat::Yaml);
        assert_eq!(
            output_format(&global(&["-o", "plain"]), Some(&cfg)),
            OutputFormat::Plain
        );
        assert_eq!(output_format(&global(&[]), None), OutputFormat::Table);
    }
}
