// Govee app API client
//
// Owns the account credentials, the in-memory bearer token and the on-disk
// token cache. All endpoint calls obtain their token through
// `ensure_authenticated`, which prefers memory, then the cache, then a
// fresh login. A device-list response that reports `status: 401` in its
// body triggers exactly one forced re-login and one retry.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;
use reqwest::header::{HeaderName, HeaderValue};
use secrecy::ExposeSecret;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::auth::Credentials;
use crate::error::{Error, body_preview};
use crate::models::{Device, DeviceListResponse, LoginRequest, LoginResponse};
use crate::session::{self, CLIENT_ID};
use crate::token::Token;
use crate::token_store::TokenStore;
use crate::transport::{DEVICES_PATH, LOGIN_PATH, TransportConfig};

/// Authenticated client for one Govee account.
///
/// The token lock is held for the whole obtain-or-login sequence, so
/// concurrent callers never race each other into duplicate logins.
pub struct GoveeClient {
    http: reqwest::Client,
    transport: TransportConfig,
    credentials: Credentials,
    store: TokenStore,
    token: Mutex<Option<Token>>,
    last_transaction: AtomicI64,
}

impl GoveeClient {
    /// Create a client whose HTTP stack is built from `transport`.
    pub fn new(
        credentials: Credentials,
        store: TokenStore,
        transport: TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self::with_client(http, credentials, store, transport))
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(
        http: reqwest::Client,
        credentials: Credentials,
        store: TokenStore,
        transport: TransportConfig,
    ) -> Self {
        Self {
            http,
            transport,
            credentials,
            store,
            token: Mutex::new(None),
            last_transaction: AtomicI64::new(0),
        }
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn token_store(&self) -> &TokenStore {
        &self.store
    }

    pub fn transport(&self) -> &TransportConfig {
        &self.transport
    }

    /// The token currently held in memory, if any.
    pub async fn current_token(&self) -> Option<Token> {
        self.token.lock().await.clone()
    }

    // ── Authentication ───────────────────────────────────────────────

    /// Log in with the account credentials, bypassing every cache.
    ///
    /// The new token replaces the in-memory one and is written to the
    /// token store (best-effort).
    pub async fn login(&self) -> Result<Token, Error> {
        let mut guard = self.token.lock().await;
        *guard = None;
        let token = self.request_token().await?;
        *guard = Some(token.clone());
        Ok(token)
    }

    /// Return a usable token: memory first, then the token store, then a
    /// fresh login. Never returns without a token.
    pub async fn ensure_authenticated(&self) -> Result<Token, Error> {
        let mut guard = self.token.lock().await;
        if let Some(token) = guard.as_ref() {
            return Ok(token.clone());
        }

        let token = match self.store.load() {
            Some(cached) => cached,
            None => self.request_token().await?,
        };
        *guard = Some(token.clone());
        Ok(token)
    }

    /// Drop the in-memory token. The next call re-reads the cache or logs in.
    pub async fn invalidate(&self) {
        *self.token.lock().await = None;
    }

    /// Replace a token the server just rejected.
    ///
    /// If another caller already swapped in a different token while we were
    /// waiting for the lock, that one is used instead of logging in again.
    async fn reauthenticate(&self, rejected: &Token) -> Result<Token, Error> {
        let mut guard = self.token.lock().await;
        if let Some(current) = guard.as_ref() {
            if current != rejected {
                debug!("token already refreshed by another caller");
                return Ok(current.clone());
            }
        }

        *guard = None;
        let token = self.request_token().await?;
        *guard = Some(token.clone());
        Ok(token)
    }

    /// POST the login endpoint and persist the resulting token.
    async fn request_token(&self) -> Result<Token, Error> {
        info!("authenticating with Govee API");

        let transaction = self.next_transaction();
        let body = LoginRequest {
            client: CLIENT_ID,
            code1: "",
            email: self.credentials.email(),
            password: self.credentials.password().expose_secret(),
            key: "",
            view: 0,
            transaction: transaction.to_string(),
        };

        let mut headers = session::headers(None)?;
        headers.insert(
            HeaderName::from_static("timestamp"),
            HeaderValue::from(transaction),
        );

        let url = self.transport.endpoint(LOGIN_PATH)?;
        debug!("logging in at {}", url);

        let resp = self
            .http
            .post(url)
            .headers(headers)
            .json(&body)
            .send()
            .await
            .map_err(Error::Transport)?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Authentication {
                message: format!("login failed (HTTP {status}): {}", body_preview(&body)),
            });
        }

        let body = resp.text().await.map_err(Error::Transport)?;
        let parsed: LoginResponse =
            serde_json::from_str(&body).map_err(|e| Error::Authentication {
                message: format!("login response was not valid JSON: {e}"),
            })?;

        let message = parsed.message;
        let raw = parsed
            .client
            .and_then(|c| c.token)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| Error::Authentication {
                message: message.unwrap_or_else(|| "login response missing client.token".into()),
            })?;

        let token = Token::new(raw);
        self.store.save(&token);
        info!(expires = %token.expiry_label(), "successfully authenticated with Govee API");
        Ok(token)
    }

    /// Millisecond timestamp that never repeats or goes backwards for this
    /// client, used as the login transaction marker.
    fn next_transaction(&self) -> i64 {
        let now = Utc::now().timestamp_millis();
        let prev = self
            .last_transaction
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |prev| {
                Some(now.max(prev + 1))
            })
            .unwrap_or_else(|prev| prev);
        now.max(prev + 1)
    }

    // ── Devices ──────────────────────────────────────────────────────

    /// Fetch the account's thermometers.
    ///
    /// Re-authenticates at most once when the body reports an expired
    /// token; a second rejection is returned as
    /// [`Error::Authentication`]. Transport-level error statuses are
    /// returned as [`Error::Api`] without re-authenticating.
    pub async fn get_devices(&self) -> Result<Vec<Device>, Error> {
        let token = self.ensure_authenticated().await?;
        let mut response = self.fetch_device_list(&token).await?;

        if response.is_unauthorized() {
            warn!("token expired, re-authenticating");
            let fresh = self.reauthenticate(&token).await?;
            response = self.fetch_device_list(&fresh).await?;

            if response.is_unauthorized() {
                self.invalidate().await;
                return Err(Error::Authentication {
                    message: response
                        .message
                        .unwrap_or_else(|| "token rejected after re-authentication".into()),
                });
            }
        }

        let thermometers: Vec<Device> = response
            .into_devices()
            .into_iter()
            .filter_map(|raw| match serde_json::from_value::<Device>(raw) {
                Ok(device) => Some(device),
                Err(e) => {
                    debug!(error = %e, "skipping malformed device record");
                    None
                }
            })
            .filter(Device::is_thermometer)
            .collect();

        debug!(count = thermometers.len(), "found thermometer devices");
        Ok(thermometers)
    }

    async fn fetch_device_list(&self, token: &Token) -> Result<DeviceListResponse, Error> {
        let url = self.transport.endpoint(DEVICES_PATH)?;
        debug!("GET {}", url);

        let resp = self
            .http
            .get(url)
            .headers(session::headers(Some(token))?)
            .send()
            .await
            .map_err(Error::Transport)?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Api {
                status: status.as_u16(),
                message: format!("HTTP {status}: {}", body_preview(&body)),
            });
        }

        let body = resp.text().await.map_err(Error::Transport)?;
        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: format!("{e} (body preview: {:?})", body_preview(&body)),
            body: body.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn client() -> GoveeClient {
        let dir = std::env::temp_dir().join("govee-api-unit");
        GoveeClient::with_client(
            reqwest::Client::new(),
            Credentials::new("me@example.com", "pw".to_string().into()),
            TokenStore::in_dir(dir),
            TransportConfig::production().unwrap(),
        )
    }

    #[test]
    fn transactions_strictly_increase() {
        let client = client();
        let mut last = client.next_transaction();
        for _ in 0..1000 {
            let next = client.next_transaction();
            assert!(next > last, "{next} should be greater than {last}");
            last = next;
        }
    }

    #[tokio::test]
    async fn invalidate_clears_memory_only() {
        let client = client();
        *client.token.lock().await = Some(Token::new("abc"));
        assert!(client.current_token().await.is_some());
        client.invalidate().await;
        assert!(client.current_token().await.is_none());
    }
}
