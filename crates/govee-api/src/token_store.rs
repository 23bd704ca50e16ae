// On-disk token cache
//
// A single `{"token": "..."}` record in the configuration directory so a
// restart does not cost a login. Caching is purely an optimization: every
// read or write problem is logged and absorbed here, never returned.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::token::{Claims, Token};

/// File name of the cache record inside the configuration directory.
pub const TOKEN_FILE_NAME: &str = ".govee_token.json";

#[derive(Debug, Serialize, Deserialize)]
struct TokenRecord {
    #[serde(default)]
    token: Option<String>,
}

/// Why a cached token could not be used. Only ever logged.
#[derive(Debug)]
enum CacheMiss {
    Io(io::Error),
    Malformed(serde_json::Error),
    Empty,
    UndecodableClaims,
}

impl std::fmt::Display for CacheMiss {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "read failed: {e}"),
            Self::Malformed(e) => write!(f, "malformed record: {e}"),
            Self::Empty => f.write_str("record has no token"),
            Self::UndecodableClaims => f.write_str("token claims could not be decoded"),
        }
    }
}

/// Persists one bearer token at a fixed path.
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    /// Store the cache record at an explicit file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store the cache record as [`TOKEN_FILE_NAME`] inside `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(TOKEN_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the cached token if it exists and has not expired.
    pub fn load(&self) -> Option<Token> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "no cached token found");
            return None;
        }

        let token = match self.read() {
            Ok(token) => token,
            Err(miss) => {
                debug!(path = %self.path.display(), reason = %miss, "ignoring cached token");
                return None;
            }
        };

        if token.is_expired() {
            info!("cached token expired, will need to re-authenticate");
            return None;
        }

        info!(expires = %token.expiry_label(), "using cached token");
        Some(token)
    }

    /// Overwrite the cache record. Failures are logged and swallowed.
    pub fn save(&self, token: &Token) {
        match self.write(token) {
            Ok(()) => info!(expires = %token.expiry_label(), "token cached successfully"),
            Err(e) => error!(path = %self.path.display(), error = %e, "failed to cache token"),
        }
    }

    /// Remove the cache record, if any. Failures are logged and swallowed.
    ///
    /// Returns `true` only when a record was actually deleted.
    pub fn clear(&self) -> bool {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                debug!(path = %self.path.display(), "cached token removed");
                true
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => false,
            Err(e) => {
                error!(path = %self.path.display(), error = %e, "failed to remove cached token");
                false
            }
        }
    }

    fn read(&self) -> Result<Token, CacheMiss> {
        let contents = fs::read_to_string(&self.path).map_err(CacheMiss::Io)?;
        let record: TokenRecord = serde_json::from_str(&contents).map_err(CacheMiss::Malformed)?;
        let raw = record
            .token
            .filter(|t| !t.is_empty())
            .ok_or(CacheMiss::Empty)?;
        let claims = Claims::decode(&raw).ok_or(CacheMiss::UndecodableClaims)?;
        Ok(Token::with_claims(raw, &claims))
    }

    fn write(&self, token: &Token) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let record = TokenRecord {
            token: Some(token.as_str().to_owned()),
        };
        let json = serde_json::to_string(&record).map_err(io::Error::other)?;
        fs::write(&self.path, json)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use base64::Engine;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use chrono::{Duration, Utc};

    use super::*;

    fn jwt_expiring_in(delta: Duration) -> String {
        let exp = (Utc::now() + delta).timestamp();
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256"}"#);
        let payload = URL_SAFE_NO_PAD.encode(format!(r#"{{"exp":{exp}}}"#));
        format!("{header}.{payload}.sig")
    }

    #[test]
    fn missing_file_loads_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::in_dir(dir.path());
        assert!(store.load().is_none());
    }

    #[test]
    fn round_trips_unexpired_token() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::in_dir(dir.path());
        let token = Token::new(jwt_expiring_in(Duration::hours(1)));

        for _ in 0..3 {
            store.save(&token);
            assert_eq!(store.load(), Some(token.clone()));
        }
    }

    #[test]
    fn expired_token_is_absent_every_cycle() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::in_dir(dir.path());
        let token = Token::new(jwt_expiring_in(-Duration::minutes(5)));

        for _ in 0..3 {
            store.save(&token);
            assert!(store.load().is_none());
        }
    }

    #[test]
    fn record_format_is_single_token_object() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::in_dir(dir.path());
        let raw = jwt_expiring_in(Duration::hours(1));
        store.save(&Token::new(raw.clone()));

        let contents = fs::read_to_string(store.path()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&contents).unwrap();
        assert_eq!(value, serde_json::json!({ "token": raw }));
    }

    #[test]
    fn corrupt_or_incomplete_records_load_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::in_dir(dir.path());

        for contents in ["not json", "{}", r#"{"token":""}"#, r#"{"token":"opaque"}"#] {
            fs::write(store.path(), contents).unwrap();
            assert!(store.load().is_none(), "expected no token for {contents:?}");
        }
    }

    #[test]
    fn token_without_exp_claim_is_usable() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::in_dir(dir.path());
        let header = URL_SAFE_NO_PAD.encode(b"{}");
        let payload = URL_SAFE_NO_PAD.encode(br#"{"sub":"account"}"#);
        let token = Token::new(format!("{header}.{payload}.sig"));

        store.save(&token);
        let loaded = store.load().unwrap();
        assert_eq!(loaded.expires_at(), None);
    }

    #[test]
    fn unwritable_location_is_swallowed() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, "x").unwrap();
        // Parent "directory" is a regular file, so the write must fail.
        let store = TokenStore::in_dir(&blocker);

        store.save(&Token::new(jwt_expiring_in(Duration::hours(1))));
        assert!(store.load().is_none());
    }

    #[test]
    fn clear_removes_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::in_dir(dir.path());
        store.save(&Token::new(jwt_expiring_in(Duration::hours(1))));
        assert!(store.clear());
        assert!(!store.path().exists());
        assert!(!store.clear());
    }

    #[test]
    fn clear_reports_failure() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::in_dir(dir.path());
        // A directory at the record path cannot be removed as a file.
        fs::create_dir(store.path()).unwrap();
        assert!(!store.clear());
        assert!(store.path().exists());
    }
}
