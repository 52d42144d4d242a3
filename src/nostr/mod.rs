//! Nostr - Relay plumbing for wallet requests
//!
//! - Event kinds used by Nostr Wallet Connect (NIP-47)
//! - Subscription filters (NIP-01)
//! - `Connector` / `RelayConnection`: the narrow transport seam the session runs on
//! - `RelayClient`: tokio-tungstenite WebSocket implementation (feature `relay`)
//!
//! # Relay Messages
//!
//! | Message | Direction | Handling |
//! |---------|-----------|----------|
//! | `EVENT` | out | publish, wait for `OK` |
//! | `REQ` / `CLOSE` | out | open / close a subscription |
//! | `EVENT` | in | routed to the subscription's channel |
//! | `OK` | in | resolves the pending publish |
//! | `EOSE` / `NOTICE` | in | logged |
//! | `CLOSED` | in | ends the subscription's channel |

pub mod transport;
#[cfg(feature = "relay")]
pub mod client;

pub use transport::{Connector, EventStream, RelayConnection};
#[cfg(feature = "relay")]
pub use client::{parse_relay_message, RelayClient, RelayMessage, RelayState, WebSocketConnector};

use serde::{Deserialize, Serialize};

/// NIP-47 event kinds
pub mod kinds {
    /// Client → wallet request
    pub const WALLET_REQUEST: u16 = 23194;
    /// Wallet → client response
    pub const WALLET_RESPONSE: u16 = 23195;
}

/// Event filter for subscriptions (NIP-01)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct EventFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ids: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authors: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kinds: Option<Vec<u16>>,
    #[serde(rename = "#e", skip_serializing_if = "Option::is_none")]
    pub events: Option<Vec<String>>,
    #[serde(rename = "#p", skip_serializing_if = "Option::is_none")]
    pub pubkeys: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub since: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub until: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

impl EventFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn kind(mut self, kind: u16) -> Self {
        self.kinds.get_or_insert_with(Vec::new).push(kind);
        self
    }

    pub fn author(mut self, pubkey_hex: impl Into<String>) -> Self {
        self.authors.get_or_insert_with(Vec::new).push(pubkey_hex.into());
        self
    }

    pub fn event(mut self, event_id_hex: impl Into<String>) -> Self {
        self.events.get_or_insert_with(Vec::new).push(event_id_hex.into());
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Value of the first tag named `name`, e.g. `["e", <id>]` → `<id>`.
pub fn first_tag_value<'a>(event: &'a nostr::Event, name: &str) -> Option<&'a str> {
    event.tags.iter().find_map(|tag| {
        let fields = tag.as_slice();
        match (fields.first(), fields.get(1)) {
            (Some(n), Some(v)) if n == name => Some(v.as_str()),
            _ => None,
        }
    })
}
