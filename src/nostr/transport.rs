//! Transport seam: what the session needs from a relay, and nothing more.

use crate::error::TransportError;
use crate::nostr::EventFilter;
use async_trait::async_trait;
use nostr::Event;
use tokio::sync::mpsc;

/// Events delivered to one subscription. Ends when the relay closes it.
pub type EventStream = mpsc::Receiver<Event>;

/// One open relay connection.
#[async_trait]
pub trait RelayConnection: Send + Sync {
    /// Publish a signed event. Returns once the relay accepted it.
    async fn publish(&self, event: &Event) -> Result<(), TransportError>;

    /// Open subscription `id`. Events may arrive that do not match `filter`;
    /// callers check what they receive.
    async fn subscribe(&self, id: &str, filter: EventFilter) -> Result<EventStream, TransportError>;

    /// Release the connection. Idempotent.
    async fn close(&self);
}

/// Opens connections to a relay URL.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, url: &str) -> Result<Box<dyn RelayConnection>, TransportError>;
}
