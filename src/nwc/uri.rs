//! Connection string parsing
//!
//! `nostr+walletconnect://<wallet-pubkey>?relay=<urlencoded relay>&secret=<hex>`
//!
//! The wallet key may also sit in the path (`scheme:<pubkey>?...`). Key format
//! is not checked here; a bad key fails later at identity derivation.

use crate::error::UriError;
use percent_encoding::percent_decode_str;
use std::fmt;
use url::Url;

pub const RELAY_PARAM: &str = "relay";
pub const SECRET_PARAM: &str = "secret";

/// Parsed connection string.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionUri {
    pub wallet_pubkey: String,
    pub relay: String,
    pub secret: String,
}

impl fmt::Debug for ConnectionUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionUri")
            .field("wallet_pubkey", &self.wallet_pubkey)
            .field("relay", &self.relay)
            .field("secret", &"<redacted>")
            .finish()
    }
}

impl std::str::FromStr for ConnectionUri {
    type Err = UriError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_connection_uri(s)
    }
}

pub fn parse_connection_uri(uri: &str) -> Result<ConnectionUri, UriError> {
    let parsed = Url::parse(uri.trim()).map_err(|e| UriError::Malformed(e.to_string()))?;

    let wallet_pubkey = match parsed.host_str().filter(|h| !h.is_empty()) {
        Some(host) => host.to_string(),
        None => {
            let path = parsed.path();
            path.strip_prefix('/').unwrap_or(path).to_string()
        }
    };

    let query = parsed.query().unwrap_or("");
    let relay = query_param(query, RELAY_PARAM)
        .and_then(decode_component)
        .filter(|v| !v.is_empty())
        .ok_or(UriError::MissingRelay)?;
    let secret = query_param(query, SECRET_PARAM)
        .and_then(decode_component)
        .filter(|v| !v.is_empty())
        .ok_or(UriError::MissingSecret)?;

    Ok(ConnectionUri { wallet_pubkey, relay, secret })
}

/// First raw value for `key`.
fn query_param<'a>(query: &'a str, key: &str) -> Option<&'a str> {
    query
        .split('&')
        .filter_map(|pair| pair.split_once('=').or(Some((pair, ""))))
        .find(|(k, _)| *k == key)
        .map(|(_, v)| v)
}

/// Form-style decode. `None` on a broken escape or non-UTF-8 result.
fn decode_component(raw: &str) -> Option<String> {
    let bytes = raw.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let valid = bytes.get(i + 1).is_some_and(u8::is_ascii_hexdigit)
                && bytes.get(i + 2).is_some_and(u8::is_ascii_hexdigit);
            if !valid {
                return None;
            }
            i += 3;
        } else {
            i += 1;
        }
    }
    let spaced = raw.replace('+', " ");
    percent_decode_str(&spaced).decode_utf8().ok().map(|s| s.into_owned())
}
