// ── Core error types ──
//
// User-facing errors from govee-core. Consumers never see HTTP status
// codes or JSON parse failures directly; the `From<govee_api::Error>` impl
// translates transport-layer errors into domain categories.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot reach the Govee API at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Govee API request timed out")]
    Timeout,

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<govee_api::Error> for CoreError {
    fn from(err: govee_api::Error) -> Self {
        match err {
            govee_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            govee_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            govee_api::Error::Api { status, message } => CoreError::Api {
                message,
                status: Some(status),
            },
            govee_api::Error::Deserialization { message, .. } => CoreError::Api {
                message: format!("unexpected response: {message}"),
                status: None,
            },
            govee_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("invalid API URL: {e}"),
            },
            govee_api::Error::Tls(message) => CoreError::ConnectionFailed {
                url: "<client>".into(),
                reason: message,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_api_errors() {
        let auth: CoreError = govee_api::Error::Authentication {
            message: "nope".into(),
        }
        .into();
        assert!(matches!(auth, CoreError::AuthenticationFailed { .. }));

        let api: CoreError = govee_api::Error::Api {
            status: 502,
            message: "bad gateway".into(),
        }
        .into();
        assert!(matches!(api, CoreError::Api { status: Some(502), .. }));

        let body: CoreError = govee_api::Error::Deserialization {
            message: "expected value".into(),
            body: "<html>".into(),
        }
        .into();
        assert!(body.to_string().contains("unexpected response"));
    }
}
