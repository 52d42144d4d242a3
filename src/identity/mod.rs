//! Identity - Client keys from the connection secret. The secret never leaves this struct.

use crate::error::{NwcError, NwcResult};
use crate::nwc::uri::ConnectionUri;
use nostr::{Keys, PublicKey};
use zeroize::Zeroize;

/// Derive the x-only public key (hex) for a secret key (hex or nsec).
pub fn derive_public_key(secret: &str) -> NwcResult<String> {
    let keys = Keys::parse(secret).map_err(|e| NwcError::InvalidSecretKey(e.to_string()))?;
    Ok(keys.public_key().to_hex())
}

/// Who we are and whom we address. Built once per client, immutable afterwards.
#[derive(Debug, Clone)]
pub struct ClientIdentity {
    pub relay: String,
    pub wallet_pubkey: PublicKey,
    pub client_pubkey: PublicKey,
    keys: Keys,
}

impl ClientIdentity {
    pub fn new(relay: impl Into<String>, wallet_pubkey: &str, secret: &str) -> NwcResult<Self> {
        let keys = Keys::parse(secret).map_err(|e| NwcError::InvalidSecretKey(e.to_string()))?;
        let wallet_pubkey = PublicKey::from_hex(wallet_pubkey)
            .map_err(|e| NwcError::InvalidPublicKey(e.to_string()))?;
        Ok(Self { relay: relay.into(), wallet_pubkey, client_pubkey: keys.public_key(), keys })
    }

    /// Consumes the parsed URI and wipes its copy of the secret.
    pub fn from_uri(mut uri: ConnectionUri) -> NwcResult<Self> {
        let identity = Self::new(uri.relay.clone(), &uri.wallet_pubkey, &uri.secret);
        uri.secret.zeroize();
        identity
    }

    pub fn keys(&self) -> &Keys {
        &self.keys
    }

    pub fn client_pubkey_hex(&self) -> String {
        self.client_pubkey.to_hex()
    }

    pub fn wallet_pubkey_hex(&self) -> String {
        self.wallet_pubkey.to_hex()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "0000000000000000000000000000000000000000000000000000000000000001";
    // x-only pubkey of scalar 1 (the secp256k1 generator)
    const SECRET_PUBKEY: &str = "79be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798";

    #[test]
    fn test_derive_known_key() {
        assert_eq!(derive_public_key(SECRET).expect("derive"), SECRET_PUBKEY);
    }

    #[test]
    fn test_derive_deterministic() {
        let keys = Keys::generate();
        let secret = keys.secret_key().to_secret_hex();
        let a = derive_public_key(&secret).expect("derive");
        let b = derive_public_key(&secret).expect("derive");
        assert_eq!(a, b);
        assert_eq!(a, keys.public_key().to_hex());
    }

    #[test]
    fn test_invalid_secret() {
        assert!(matches!(derive_public_key("deadbeef"), Err(NwcError::InvalidSecretKey(_))));
        assert!(matches!(derive_public_key(""), Err(NwcError::InvalidSecretKey(_))));
    }

    #[test]
    fn test_identity_from_uri() {
        let wallet = Keys::generate().public_key().to_hex();
        let uri = ConnectionUri {
            wallet_pubkey: wallet.clone(),
            relay: "wss://relay.example".into(),
            secret: SECRET.into(),
        };
        let identity = ClientIdentity::from_uri(uri).expect("identity");
        assert_eq!(identity.relay, "wss://relay.example");
        assert_eq!(identity.wallet_pubkey_hex(), wallet);
        assert_eq!(identity.client_pubkey_hex(), SECRET_PUBKEY);
        assert_eq!(identity.keys().public_key(), identity.client_pubkey);
    }

    #[test]
    fn test_invalid_wallet_key() {
        let err = ClientIdentity::new("wss://r", "abc123", SECRET).unwrap_err();
        assert!(matches!(err, NwcError::InvalidPublicKey(_)));
    }
}
