//! Error types for wallet requests.
//!
//! Every failure of a call surfaces as one `NwcError` variant. Nothing is
//! retried or swallowed below the caller.

use std::time::Duration;
use thiserror::Error;

/// Connection string errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UriError {
    #[error("malformed connection string: {0}")]
    Malformed(String),

    /// `relay` query parameter absent, empty, or not percent-decodable
    #[error("connection string has no relay")]
    MissingRelay,

    #[error("connection string has no secret")]
    MissingSecret,
}

/// Errors reported by a `Connector` or `RelayConnection`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("connect failed: {0}")]
    Connect(String),

    #[error("not connected")]
    NotConnected,

    #[error("send failed: {0}")]
    Send(String),

    #[error("relay rejected event: {0}")]
    Rejected(String),

    #[error("no acknowledgement from relay within {0:?}")]
    AckTimeout(Duration),

    #[error("subscription ended before a reply arrived")]
    SubscriptionClosed,
}

#[derive(Debug, Error)]
pub enum NwcError {
    #[error(transparent)]
    Uri(#[from] UriError),

    #[error("invalid secret key: {0}")]
    InvalidSecretKey(String),

    #[error("invalid wallet public key: {0}")]
    InvalidPublicKey(String),

    #[error("signing failed: {0}")]
    Signing(String),

    #[error("transport unavailable: {0}")]
    TransportUnavailable(TransportError),

    #[error("publish failed: {0}")]
    PublishFailed(TransportError),

    #[error("no response within {0:?}")]
    ResponseTimeout(Duration),

    #[error("decryption failed: {0}")]
    Decryption(String),

    #[error("encoding failed: {0}")]
    Encoding(String),

    /// Wallet answered with an error document
    #[error("wallet error {code}: {message}")]
    Remote { code: String, message: String },
}

impl NwcError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, NwcError::ResponseTimeout(_))
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, NwcError::Remote { .. })
    }
}

impl From<serde_json::Error> for NwcError {
    fn from(e: serde_json::Error) -> Self {
        NwcError::Encoding(e.to_string())
    }
}

pub type NwcResult<T> = Result<T, NwcError>;
