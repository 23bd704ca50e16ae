//! Domain layer between `govee-api` and consumers (CLI, dashboards).
//!
//! - **[`telemetry`]**: turns raw device records into typed
//!   [`TelemetrySnapshot`]s and [`Thermometer`]s. Pure; tolerant of missing
//!   or malformed nested data.
//!
//! - **[`Poller`]**: background task that runs the fetch-and-normalize
//!   cycle on a fixed interval and publishes [`PollState`] through a
//!   `tokio::sync::watch` channel. [`poll_once`] runs a single cycle.
//!
//! - **[`ClientConfig`]**: everything needed to build a
//!   [`GoveeClient`](govee_api::GoveeClient) and run the poller.

pub mod config;
pub mod error;
pub mod poller;
pub mod telemetry;

pub use config::{ClientConfig, DEFAULT_POLL_INTERVAL, DEFAULT_TIMEOUT};
pub use error::CoreError;
pub use poller::{PollState, Poller, poll_once};
pub use telemetry::{
    TelemetrySnapshot, Thermometer, extract, normalize_humidity, normalize_temperature,
};

pub use govee_api::{DEFAULT_BASE_URL, Device, GoveeClient, Token, TokenStore};
