// ── Client configuration ──
//
// Everything needed to build a `GoveeClient` and run the poller. Produced
// by `govee-config` from the TOML file and environment; tests build it
// directly.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use govee_api::{Credentials, GoveeClient, TokenStore, TransportConfig};

use crate::error::CoreError;

/// Poll interval used when none is configured.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(300);

/// Per-request timeout used when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Vendor API root.
    pub base_url: Url,
    pub email: String,
    pub password: SecretString,
    /// Directory holding the token cache file.
    pub cache_dir: PathBuf,
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl ClientConfig {
    pub fn token_store(&self) -> TokenStore {
        TokenStore::in_dir(&self.cache_dir)
    }

    /// Build the API client this configuration describes.
    pub fn build_client(&self) -> Result<GoveeClient, CoreError> {
        if self.email.trim().is_empty() {
            return Err(CoreError::Config {
                message: "email must not be empty".into(),
            });
        }
        if self.timeout.is_zero() {
            return Err(CoreError::Config {
                message: "timeout must be greater than zero".into(),
            });
        }

        let transport = TransportConfig::new(self.base_url.clone()).with_timeout(self.timeout);
        let credentials = Credentials::new(self.email.clone(), self.password.clone());
        Ok(GoveeClient::new(credentials, self.token_store(), transport)?)
    }
}
