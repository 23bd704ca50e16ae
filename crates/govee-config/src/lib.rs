//! Configuration for the Govee cloud tools.
//!
//! A single TOML file plus `GOVEE_*` environment overrides, password
//! resolution (env + keyring + plaintext), and translation to
//! `govee_core::ClientConfig`. The CLI layers its flags on top.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use govee_core::ClientConfig;

/// Keyring service name; the account is the configured email.
pub const KEYRING_SERVICE: &str = "govee-cloud";

/// Environment variable consulted first for the account password.
pub const PASSWORD_ENV: &str = "GOVEE_PASSWORD";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no email configured (set `email` in the config file or GOVEE_EMAIL)")]
    NoEmail,

    #[error("no password found for {email} (tried GOVEE_PASSWORD, keyring, config file)")]
    NoPassword { email: String },

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Govee account email.
    pub email: Option<String>,

    /// Account password (plaintext; prefer keyring or GOVEE_PASSWORD).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Vendor API root.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Directory for the token cache. Platform cache dir when unset.
    pub cache_dir: Option<PathBuf>,

    /// Seconds between polls.
    #[serde(default = "default_poll_interval")]
    pub poll_interval: u64,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    #[serde(default)]
    pub defaults: Defaults,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            email: None,
            password: None,
            base_url: default_base_url(),
            cache_dir: None,
            poll_interval: default_poll_interval(),
            timeout: default_timeout(),
            defaults: Defaults::default(),
        }
    }
}

/// Presentation defaults for the CLI.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
        }
    }
}

fn default_base_url() -> String {
    govee_core::DEFAULT_BASE_URL.into()
}
fn default_poll_interval() -> u64 {
    govee_core::DEFAULT_POLL_INTERVAL.as_secs()
}
fn default_timeout() -> u64 {
    govee_core::DEFAULT_TIMEOUT.as_secs()
}
fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}

// ── Paths ───────────────────────────────────────────────────────────

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "govee-cloud", "govee-cloud")
}

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    project_dirs().map_or_else(
        || home_fallback(".config").join("config.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

/// Default directory for the token cache.
pub fn default_cache_dir() -> PathBuf {
    project_dirs().map_or_else(
        || home_fallback(".cache"),
        |dirs| dirs.cache_dir().to_path_buf(),
    )
}

fn home_fallback(kind: &str) -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(kind);
    p.push("govee-cloud");
    p
}

// ── Loading ─────────────────────────────────────────────────────────

/// Load the Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load the Config from `path` + environment. A missing file yields the
/// defaults (still subject to env overrides).
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("GOVEE_").only(&[
            "email",
            "base_url",
            "cache_dir",
            "poll_interval",
            "timeout",
        ]));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if it cannot be read.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Saving ──────────────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(&config_path(), cfg)
}

pub fn save_config_to(path: &Path, cfg: &Config) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Password resolution ─────────────────────────────────────────────

/// Resolve the account password: `GOVEE_PASSWORD` → system keyring →
/// plaintext in the config file.
pub fn resolve_password(cfg: &Config, email: &str) -> Result<SecretString, ConfigError> {
    first_password(
        std::env::var(PASSWORD_ENV).ok(),
        || keyring_password(email),
        cfg.password.as_deref(),
    )
    .ok_or_else(|| ConfigError::NoPassword {
        email: email.into(),
    })
}

fn first_password(
    env: Option<String>,
    keyring: impl FnOnce() -> Option<String>,
    plaintext: Option<&str>,
) -> Option<SecretString> {
    env.filter(|pw| !pw.is_empty())
        .or_else(keyring)
        .or_else(|| plaintext.filter(|pw| !pw.is_empty()).map(str::to_owned))
        .map(SecretString::from)
}

fn keyring_password(email: &str) -> Option<String> {
    keyring::Entry::new(KEYRING_SERVICE, email)
        .and_then(|entry| entry.get_password())
        .ok()
}

/// Store the password for `email` in the system keyring.
pub fn store_password(email: &str, password: &str) -> Result<(), ConfigError> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, email)?;
    entry.set_password(password)?;
    Ok(())
}

// ── Translation ─────────────────────────────────────────────────────

/// The configured email, trimmed; errors when absent or blank.
pub fn require_email(cfg: &Config) -> Result<String, ConfigError> {
    cfg.email
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .map(str::to_owned)
        .ok_or(ConfigError::NoEmail)
}

/// Build a `ClientConfig` with an already-resolved password.
pub fn to_client_config_with(
    cfg: &Config,
    password: SecretString,
) -> Result<ClientConfig, ConfigError> {
    let email = require_email(cfg)?;

    let base_url: url::Url = cfg.base_url.parse().map_err(|_| ConfigError::Validation {
        field: "base_url".into(),
        reason: format!("invalid URL: {}", cfg.base_url),
    })?;

    if cfg.poll_interval == 0 {
        return Err(ConfigError::Validation {
            field: "poll_interval".into(),
            reason: "must be at least 1 second".into(),
        });
    }
    if cfg.timeout == 0 {
        return Err(ConfigError::Validation {
            field: "timeout".into(),
            reason: "must be at least 1 second".into(),
        });
    }

    Ok(ClientConfig {
        base_url,
        email,
        password,
        cache_dir: cfg.cache_dir.clone().unwrap_or_else(default_cache_dir),
        timeout: Duration::from_secs(cfg.timeout),
        poll_interval: Duration::from_secs(cfg.poll_interval),
    })
}

/// Build a `ClientConfig`, resolving the password through the full chain.
pub fn to_client_config(cfg: &Config) -> Result<ClientConfig, ConfigError> {
    let email = require_email(cfg)?;
    let password = resolve_password(cfg, &email)?;
    to_client_config_with(cfg, password)
}
