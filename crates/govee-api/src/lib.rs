// govee-api: Async Rust client for the Govee cloud account and device-list API

pub mod auth;
pub mod client;
pub mod error;
pub mod models;
pub mod session;
pub mod token;
pub mod token_store;
pub mod transport;

pub use auth::Credentials;
pub use client::GoveeClient;
pub use error::Error;
pub use models::{Device, DeviceExt, THERMOMETER_SKU};
pub use token::{Claims, Token};
pub use token_store::{TOKEN_FILE_NAME, TokenStore};
pub use transport::{DEFAULT_BASE_URL, TransportConfig};
