// Per-request header set
//
// The Govee app API rejects requests that do not look like they come from
// the official Android client, so every call carries the same identifying
// headers. The bearer token is the only piece that varies.

use reqwest::header::{
    ACCEPT_LANGUAGE, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue, USER_AGENT,
};

use crate::error::Error;
use crate::token::Token;

/// Client identifier the vendor app registers with.
pub const CLIENT_ID: &str = "53b5cfa4c9726a27";

/// App version the vendor API expects to see.
pub const APP_VERSION: &str = "7.0.30";

const FIXED_HEADERS: &[(&str, &str)] = &[
    ("sysversion", "12"),
    ("country", "US"),
    ("appversion", APP_VERSION),
    ("clientid", CLIENT_ID),
    ("clienttype", "0"),
    ("timezone", "America/New_York"),
    ("envid", "0"),
    ("iotversion", "0"),
];

/// Build the header set for one vendor API call.
///
/// Adds `Authorization: Bearer <token>` when a token is supplied.
pub fn headers(token: Option<&Token>) -> Result<HeaderMap, Error> {
    let mut map = HeaderMap::new();
    for (name, value) in FIXED_HEADERS {
        map.insert(
            HeaderName::from_static(name),
            HeaderValue::from_static(value),
        );
    }
    map.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en"));
    map.insert(
        CONTENT_TYPE,
        HeaderValue::from_static("application/json; charset=UTF-8"),
    );
    map.insert(USER_AGENT, HeaderValue::from_static("okhttp/4.12.0"));

    if let Some(token) = token {
        let mut value = HeaderValue::from_str(&format!("Bearer {}", token.as_str()))
            .map_err(|_| Error::Authentication {
                message: "token contains characters not allowed in a header".into(),
            })?;
        value.set_sensitive(true);
        map.insert(AUTHORIZATION, value);
    }

    Ok(map)
}
