// Shared transport configuration for building reqwest::Client instances.
//
// Holds the vendor base URL and the per-request timeout. Every outbound
// call goes through a client built here, so no call can wait forever.

use std::time::Duration;

use url::Url;

use crate::error::Error;

/// Production API host.
pub const DEFAULT_BASE_URL: &str = "https://app2.govee.com";

/// Login path, relative to the base URL.
pub const LOGIN_PATH: &str = "/account/rest/account/v2/login";

/// Device-list path, relative to the base URL.
pub const DEVICES_PATH: &str = "/bff-app/v1/device/list";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub base_url: Url,
    pub timeout: Duration,
}

impl TransportConfig {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Transport for the production host.
    pub fn production() -> Result<Self, Error> {
        Ok(Self::new(Url::parse(DEFAULT_BASE_URL)?))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        reqwest::Client::builder()
            .timeout(self.timeout)
            .connect_timeout(self.timeout)
            .build()
            .map_err(|e| Error::Tls(format!("failed to build HTTP client: {e}")))
    }

    /// Resolve an endpoint path against the base URL.
    pub fn endpoint(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(path)?)
    }
}
