//! Beenode NWC: Nostr Wallet Connect client. One encrypted request, one correlated reply.
//!
//! # Architecture
//!
//! ```text
//! NwcClient (entry point)
//!   │
//!   ├── ConnectionUri (relay, wallet pubkey, secret)
//!   │     └── ClientIdentity (secret → client pubkey, derived once)
//!   │
//!   └── Session (per call)
//!         ├── Nip04Codec (encrypt request / decrypt reply)
//!         └── Connector → RelayConnection (publish, subscribe, close)
//! ```
//!
//! # Features
//!
//! - `relay` (default) - WebSocket relay transport via tokio-tungstenite
//!
//! # Usage
//!
//! ```ignore
//! use beenode_nwc::NwcClient;
//!
//! let client = NwcClient::new("nostr+walletconnect://<wallet>?relay=wss%3A%2F%2Frelay.example&secret=<hex>")?;
//!
//! let balance = client.get_balance().await?;
//! let invoice = client.make_invoice(1000, "coffee").await?;
//! ```

pub mod error;
pub mod identity;
pub mod logging;
pub mod nostr;
pub mod nwc;

pub use error::{NwcError, NwcResult, TransportError, UriError};
pub use identity::{derive_public_key, ClientIdentity};
pub use nwc::{
    parse_connection_uri, Balance, ConnectionUri, InvoiceDetails, Method, NwcClient, PaymentResult,
    SessionConfig, TransactionDetails, WalletInfo,
};

#[cfg(feature = "relay")]
pub use crate::nostr::{RelayClient, WebSocketConnector};
