//! Session - one encrypted request, one correlated reply.
//!
//! ```text
//! Idle ──connect──▶ Connected ──REQ + EVENT──▶ Published ──▶ AwaitingResponse
//!                                                              │
//!                                  ┌───────────────┬───────────┴──────┐
//!                                  ▼               ▼                  ▼
//!                              Decrypted        TimedOut            Failed
//! ```
//!
//! Every call opens its own relay connection and closes it on every exit path,
//! including a caller dropping the call future. The response timeout bounds
//! everything after connect: subscribe, publish acknowledgement and the wait.
//! The reply subscription is opened before the request is published: wallet
//! replies are ephemeral events, so a relay will not replay one that arrived
//! before the subscription existed.

use crate::error::{NwcError, NwcResult, TransportError};
use crate::identity::ClientIdentity;
use crate::nostr::{first_tag_value, kinds, Connector, EventFilter, EventStream, RelayConnection};
use crate::nwc::codec::{Nip04Codec, Request, ResponseDocument};
use crate::nwc::config::SessionConfig;
use nostr::{Event, EventId, Kind, Tag, Timestamp, UnsignedEvent};
use std::sync::Arc;
use tokio::time::error::Elapsed;
use tokio::time::{timeout_at, Instant};

pub struct Session {
    identity: ClientIdentity,
    codec: Nip04Codec,
    connector: Arc<dyn Connector>,
    config: SessionConfig,
}

impl Session {
    pub fn new(identity: ClientIdentity, connector: Arc<dyn Connector>, config: SessionConfig) -> Self {
        let codec = Nip04Codec::new(identity.keys(), identity.wallet_pubkey);
        Self { identity, codec, connector, config }
    }

    pub fn identity(&self) -> &ClientIdentity {
        &self.identity
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Send `request` to the wallet and return its decrypted reply document.
    pub async fn request(&self, request: &Request) -> NwcResult<ResponseDocument> {
        let event = self.request_event(request)?;
        tracing::debug!(method = %request.method, event_id = %event.id, "Wallet request built");

        let relay = self
            .connector
            .connect(&self.identity.relay)
            .await
            .map_err(NwcError::TransportUnavailable)?;
        let relay = OpenRelay::new(relay);

        let outcome = self.exchange(relay.connection(), &event, &request.method).await;
        relay.close().await;

        match &outcome {
            Ok(_) => tracing::debug!(method = %request.method, event_id = %event.id, "Wallet replied"),
            Err(e) => tracing::debug!(method = %request.method, event_id = %event.id, error = %e, "Wallet request failed"),
        }
        outcome
    }

    /// Encrypt and sign a request event addressed to the wallet.
    pub fn request_event(&self, request: &Request) -> NwcResult<Event> {
        let content = self.codec.encrypt_request(request)?;
        UnsignedEvent::new(
            self.identity.client_pubkey,
            Timestamp::now(),
            Kind::WalletConnectRequest,
            vec![Tag::public_key(self.identity.wallet_pubkey)],
            content,
        )
        .sign_with_keys(self.identity.keys())
        .map_err(|e| NwcError::Signing(e.to_string()))
    }

    /// Filter for the reply to `request_id`.
    pub fn response_filter(&self, request_id: &EventId) -> EventFilter {
        EventFilter::new()
            .kind(kinds::WALLET_RESPONSE)
            .author(self.identity.wallet_pubkey_hex())
            .event(request_id.to_hex())
            .limit(self.config.response_limit)
    }

    /// Local check of a candidate reply; the relay's filtering is not trusted.
    pub fn is_reply_to(&self, request_id: &EventId, event: &Event) -> bool {
        if event.kind != Kind::WalletConnectResponse {
            tracing::debug!(event_id = %event.id, kind = event.kind.as_u16(), "Ignoring event of wrong kind");
            return false;
        }
        if event.pubkey != self.identity.wallet_pubkey {
            tracing::debug!(event_id = %event.id, author = %event.pubkey, "Ignoring event from another author");
            return false;
        }
        let request_hex = request_id.to_hex();
        if first_tag_value(event, "e") != Some(request_hex.as_str()) {
            tracing::debug!(event_id = %event.id, "Ignoring reply to another request");
            return false;
        }
        if let Err(e) = event.verify() {
            tracing::warn!(event_id = %event.id, error = %e, "Ignoring reply with bad signature");
            return false;
        }
        true
    }

    async fn exchange(&self, relay: &dyn RelayConnection, event: &Event, method: &str) -> NwcResult<ResponseDocument> {
        let deadline = Instant::now() + self.config.response_timeout;
        let timed_out = |_: Elapsed| NwcError::ResponseTimeout(self.config.response_timeout);

        let sub_id = subscription_id(&event.id);
        let mut replies = timeout_at(deadline, relay.subscribe(&sub_id, self.response_filter(&event.id)))
            .await
            .map_err(timed_out)?
            .map_err(NwcError::TransportUnavailable)?;

        timeout_at(deadline, relay.publish(event))
            .await
            .map_err(timed_out)?
            .map_err(NwcError::PublishFailed)?;
        tracing::debug!(event_id = %event.id, sub_id = %sub_id, "Published, awaiting reply");

        let reply = timeout_at(deadline, self.first_reply(&mut replies, &event.id))
            .await
            .map_err(timed_out)??;

        let document = self.codec.decrypt_response(&reply.content)?;
        if let Some(result_type) = document.result_type.as_deref() {
            if result_type != method {
                tracing::warn!(expected = %method, got = %result_type, "Reply result_type mismatch");
            }
        }
        Ok(document)
    }

    async fn first_reply(&self, replies: &mut EventStream, request_id: &EventId) -> NwcResult<Event> {
        while let Some(event) = replies.recv().await {
            if self.is_reply_to(request_id, &event) {
                return Ok(event);
            }
        }
        Err(NwcError::TransportUnavailable(TransportError::SubscriptionClosed))
    }
}

/// Relay connection owned by one call. Dropped without `close`, it closes
/// itself on the current runtime.
struct OpenRelay {
    relay: Arc<dyn RelayConnection>,
    open: bool,
}

impl OpenRelay {
    fn new(relay: Box<dyn RelayConnection>) -> Self {
        Self { relay: Arc::from(relay), open: true }
    }

    fn connection(&self) -> &dyn RelayConnection {
        self.relay.as_ref()
    }

    async fn close(mut self) {
        self.relay.close().await;
        self.open = false;
    }
}

impl Drop for OpenRelay {
    fn drop(&mut self) {
        if !self.open {
            return;
        }
        let relay = self.relay.clone();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                tracing::debug!("Call dropped mid-flight, closing relay connection");
                handle.spawn(async move { relay.close().await });
            }
            Err(_) => tracing::warn!("Call dropped outside a runtime, relay connection left to its own drop"),
        }
    }
}

fn subscription_id(request_id: &EventId) -> String {
    let hex = request_id.to_hex();
    format!("nwc-{}", &hex[..16])
}
