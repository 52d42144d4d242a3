//! Payload codec: JSON request/response documents under NIP-04 encryption.
//!
//! Both directions use the key agreed from (our secret, their pubkey). The codec
//! is built once per client, so requests and replies share one key pair.

use crate::error::{NwcError, NwcResult};
use nostr::nips::nip04;
use nostr::{Keys, PublicKey, SecretKey};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Plaintext wallet request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub method: String,
    #[serde(default)]
    pub params: Map<String, Value>,
}

impl Request {
    pub fn new(method: impl Into<String>, params: Map<String, Value>) -> Self {
        Self { method: method.into(), params }
    }
}

/// Error body carried by a wallet reply
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteErrorBody {
    pub code: String,
    #[serde(default)]
    pub message: String,
}

/// Decrypted wallet reply
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ResponseDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RemoteErrorBody>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
}

impl ResponseDocument {
    pub fn success(result_type: impl Into<String>, result: Value) -> Self {
        Self { result_type: Some(result_type.into()), error: None, result: Some(result) }
    }

    pub fn failure(result_type: impl Into<String>, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            result_type: Some(result_type.into()),
            error: Some(RemoteErrorBody { code: code.into(), message: message.into() }),
            result: None,
        }
    }

    /// `error` wins over `result`; a reply with neither is an encoding failure.
    pub fn into_result(self) -> NwcResult<Value> {
        if let Some(err) = self.error {
            return Err(NwcError::Remote { code: err.code, message: err.message });
        }
        match self.result {
            Some(Value::Null) | None => Err(NwcError::Encoding("reply has no result".into())),
            Some(v) => Ok(v),
        }
    }
}

/// NIP-04 encryption between one local secret and one peer.
#[derive(Clone)]
pub struct Nip04Codec {
    secret_key: SecretKey,
    peer: PublicKey,
}

impl Nip04Codec {
    pub fn new(keys: &Keys, peer: PublicKey) -> Self {
        Self { secret_key: keys.secret_key().clone(), peer }
    }

    pub fn peer(&self) -> &PublicKey {
        &self.peer
    }

    pub fn encrypt(&self, plaintext: &str) -> NwcResult<String> {
        nip04::encrypt(&self.secret_key, &self.peer, plaintext)
            .map_err(|e| NwcError::Encoding(format!("nip04 encrypt: {}", e)))
    }

    pub fn decrypt(&self, ciphertext: &str) -> NwcResult<String> {
        nip04::decrypt(&self.secret_key, &self.peer, ciphertext)
            .map_err(|e| NwcError::Decryption(e.to_string()))
    }

    pub fn encrypt_json<T: Serialize>(&self, value: &T) -> NwcResult<String> {
        let plaintext = serde_json::to_string(value)?;
        self.encrypt(&plaintext)
    }

    pub fn decrypt_json<T: DeserializeOwned>(&self, ciphertext: &str) -> NwcResult<T> {
        let plaintext = self.decrypt(ciphertext)?;
        Ok(serde_json::from_str(&plaintext)?)
    }

    pub fn encrypt_request(&self, request: &Request) -> NwcResult<String> {
        self.encrypt_json(request)
    }

    /// Plaintext that is not JSON at all means the wrong key or a mangled
    /// envelope, so it counts as a decryption failure. JSON of the wrong
    /// shape is an encoding failure.
    pub fn decrypt_response(&self, ciphertext: &str) -> NwcResult<ResponseDocument> {
        let plaintext = self.decrypt(ciphertext)?;
        let value: Value = serde_json::from_str(&plaintext)
            .map_err(|e| NwcError::Decryption(format!("reply plaintext is not JSON: {}", e)))?;
        Ok(serde_json::from_value(value)?)
    }
}

impl std::fmt::Debug for Nip04Codec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Nip04Codec").field("peer", &self.peer.to_hex()).finish_non_exhaustive()
    }
}
