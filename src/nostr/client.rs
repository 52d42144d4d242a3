//! Nostr relay client - tokio-tungstenite WebSocket
//!
//! One writer task drains outgoing frames, one reader task dispatches relay
//! messages: `EVENT` to its subscription channel, `OK` to the waiting publish.

use crate::error::TransportError;
use crate::nostr::transport::{Connector, EventStream, RelayConnection};
use crate::nostr::EventFilter;
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, RwLock};
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message};

const DEFAULT_PUBLISH_TIMEOUT: Duration = Duration::from_secs(10);
const CLOSE_GRACE: Duration = Duration::from_secs(2);

/// Relay connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayState {
    Disconnected,
    Connecting,
    Connected,
}

#[derive(Debug)]
struct Ack {
    accepted: bool,
    message: Option<String>,
}

type Subscriptions = Arc<Mutex<HashMap<String, mpsc::Sender<nostr::Event>>>>;
type PendingAcks = Arc<Mutex<HashMap<String, oneshot::Sender<Ack>>>>;

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|p| p.into_inner())
}

/// Nostr relay client
pub struct RelayClient {
    url: String,
    state: Arc<RwLock<RelayState>>,
    tx: Mutex<Option<mpsc::Sender<Message>>>,
    subscriptions: Subscriptions,
    acks: PendingAcks,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    publish_timeout: Duration,
}

impl RelayClient {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            state: Arc::new(RwLock::new(RelayState::Disconnected)),
            tx: Mutex::new(None),
            subscriptions: Arc::new(Mutex::new(HashMap::new())),
            acks: Arc::new(Mutex::new(HashMap::new())),
            tasks: Mutex::new(Vec::new()),
            publish_timeout: DEFAULT_PUBLISH_TIMEOUT,
        }
    }

    pub fn with_publish_timeout(mut self, timeout: Duration) -> Self {
        self.publish_timeout = timeout;
        self
    }

    pub async fn state(&self) -> RelayState {
        *self.state.read().await
    }

    /// Connect to relay
    pub async fn connect(&self) -> Result<(), TransportError> {
        *self.state.write().await = RelayState::Connecting;

        let (ws, _) = match connect_async(self.url.as_str()).await {
            Ok(pair) => pair,
            Err(e) => {
                *self.state.write().await = RelayState::Disconnected;
                return Err(TransportError::Connect(e.to_string()));
            }
        };
        let (mut write, mut read) = ws.split();

        // Channel for outgoing frames
        let (out_tx, mut out_rx) = mpsc::channel::<Message>(32);
        *lock(&self.tx) = Some(out_tx);

        let state = self.state.clone();
        *state.write().await = RelayState::Connected;
        tracing::info!(relay = %self.url, "Connected");

        // Writer: ends when every sender is dropped, then says goodbye
        let state_w = state.clone();
        let writer = tokio::spawn(async move {
            while let Some(msg) = out_rx.recv().await {
                if write.send(msg).await.is_err() {
                    break;
                }
            }
            let _ = write.close().await;
            *state_w.write().await = RelayState::Disconnected;
        });

        // Reader
        let state_r = state.clone();
        let subs = self.subscriptions.clone();
        let acks = self.acks.clone();
        let url = self.url.clone();
        let reader = tokio::spawn(async move {
            while let Some(Ok(msg)) = read.next().await {
                match msg {
                    Message::Text(txt) => dispatch(&url, &txt, &subs, &acks),
                    Message::Close(_) => break,
                    _ => {}
                }
            }
            // Dropping senders ends every stream and fails every pending publish
            lock(&subs).clear();
            lock(&acks).clear();
            *state_r.write().await = RelayState::Disconnected;
            tracing::debug!(relay = %url, "Reader stopped");
        });

        lock(&self.tasks).extend([writer, reader]);
        Ok(())
    }

    /// Send raw message
    pub async fn send(&self, msg: &str) -> Result<(), TransportError> {
        let tx = lock(&self.tx).clone().ok_or(TransportError::NotConnected)?;
        tx.send(Message::Text(msg.to_string()))
            .await
            .map_err(|e| TransportError::Send(e.to_string()))
    }

    /// Publish event (NIP-01) and wait for the relay's `OK`
    pub async fn publish(&self, event: &nostr::Event) -> Result<(), TransportError> {
        let event_id = event.id.to_hex();
        let (ack_tx, ack_rx) = oneshot::channel();
        lock(&self.acks).insert(event_id.clone(), ack_tx);

        let msg = json!(["EVENT", event]).to_string();
        if let Err(e) = self.send(&msg).await {
            lock(&self.acks).remove(&event_id);
            return Err(e);
        }

        match tokio::time::timeout(self.publish_timeout, ack_rx).await {
            Ok(Ok(Ack { accepted: true, .. })) => Ok(()),
            Ok(Ok(Ack { message, .. })) => {
                let reason = message.unwrap_or_default();
                tracing::warn!(relay = %self.url, event_id = %event_id, reason = %reason, "Publish rejected");
                Err(TransportError::Rejected(reason))
            }
            Ok(Err(_)) => Err(TransportError::NotConnected),
            Err(_) => {
                lock(&self.acks).remove(&event_id);
                Err(TransportError::AckTimeout(self.publish_timeout))
            }
        }
    }

    /// Subscribe (NIP-01)
    pub async fn subscribe(&self, id: &str, filters: Vec<Value>) -> Result<EventStream, TransportError> {
        let (tx, rx) = mpsc::channel(64);
        lock(&self.subscriptions).insert(id.to_string(), tx);

        let mut msg = vec![json!("REQ"), json!(id)];
        msg.extend(filters);
        if let Err(e) = self.send(&Value::Array(msg).to_string()).await {
            lock(&self.subscriptions).remove(id);
            return Err(e);
        }
        Ok(rx)
    }

    /// Unsubscribe (NIP-01)
    pub async fn unsubscribe(&self, id: &str) -> Result<(), TransportError> {
        lock(&self.subscriptions).remove(id);
        let msg = json!(["CLOSE", id]).to_string();
        self.send(&msg).await
    }

    /// Close open subscriptions, send a close frame, stop both tasks.
    pub async fn disconnect(&self) {
        let open: Vec<String> = lock(&self.subscriptions).keys().cloned().collect();
        for id in open {
            let _ = self.unsubscribe(&id).await;
        }

        // Last sender gone → writer sends the close frame and exits
        let had_sender = lock(&self.tx).take().is_some();
        let handles: Vec<JoinHandle<()>> = lock(&self.tasks).drain(..).collect();
        let mut handles = handles.into_iter();
        if let Some(writer) = handles.next() {
            if had_sender {
                let abort = writer.abort_handle();
                if tokio::time::timeout(CLOSE_GRACE, writer).await.is_err() {
                    abort.abort();
                }
            } else {
                writer.abort();
            }
        }
        for task in handles {
            task.abort();
        }

        *self.state.write().await = RelayState::Disconnected;
        tracing::info!(relay = %self.url, "Disconnected");
    }
}

impl Drop for RelayClient {
    fn drop(&mut self) {
        for task in lock(&self.tasks).drain(..) {
            task.abort();
        }
    }
}

/// Never waits on a subscriber: a full subscription drops the event so the
/// reader keeps delivering `OK`s.
fn dispatch(url: &str, txt: &str, subs: &Subscriptions, acks: &PendingAcks) {
    match parse_relay_message(txt) {
        Some(RelayMessage::Event { sub_id, event }) => {
            let tx = lock(subs).get(&sub_id).cloned();
            match tx {
                Some(tx) => match tx.try_send(event) {
                    Ok(()) => {}
                    Err(mpsc::error::TrySendError::Full(_)) => {
                        tracing::debug!(relay = %url, sub_id = %sub_id, "Subscription full, dropping event")
                    }
                    Err(mpsc::error::TrySendError::Closed(_)) => {
                        lock(subs).remove(&sub_id);
                    }
                },
                None => tracing::debug!(relay = %url, sub_id = %sub_id, "Event for unknown subscription"),
            }
        }
        Some(RelayMessage::Ok { event_id, accepted, message }) => {
            if let Some(waiter) = lock(acks).remove(&event_id) {
                let _ = waiter.send(Ack { accepted, message });
            }
        }
        Some(RelayMessage::Eose { sub_id }) => {
            tracing::debug!(relay = %url, sub_id = %sub_id, "End of stored events");
        }
        Some(RelayMessage::Closed { sub_id, message }) => {
            tracing::warn!(relay = %url, sub_id = %sub_id, reason = %message, "Subscription closed by relay");
            lock(subs).remove(&sub_id);
        }
        Some(RelayMessage::Notice { message }) => {
            tracing::warn!(relay = %url, notice = %message, "Relay notice");
        }
        None => tracing::debug!(relay = %url, "Unparsed relay message"),
    }
}

#[async_trait]
impl RelayConnection for RelayClient {
    async fn publish(&self, event: &nostr::Event) -> Result<(), TransportError> {
        RelayClient::publish(self, event).await
    }

    async fn subscribe(&self, id: &str, filter: EventFilter) -> Result<EventStream, TransportError> {
        let filter = serde_json::to_value(&filter).map_err(|e| TransportError::Send(e.to_string()))?;
        RelayClient::subscribe(self, id, vec![filter]).await
    }

    async fn close(&self) {
        self.disconnect().await
    }
}

/// Opens a fresh `RelayClient` per call.
#[derive(Debug, Clone)]
pub struct WebSocketConnector {
    publish_timeout: Duration,
}

impl Default for WebSocketConnector {
    fn default() -> Self {
        Self::new(DEFAULT_PUBLISH_TIMEOUT)
    }
}

impl WebSocketConnector {
    pub fn new(publish_timeout: Duration) -> Self {
        // tokio-tungstenite's rustls backend needs a process-wide provider
        let _ = rustls::crypto::ring::default_provider().install_default();
        Self { publish_timeout }
    }
}

#[async_trait]
impl Connector for WebSocketConnector {
    async fn connect(&self, url: &str) -> Result<Box<dyn RelayConnection>, TransportError> {
        let client = RelayClient::new(url).with_publish_timeout(self.publish_timeout);
        client.connect().await?;
        Ok(Box::new(client))
    }
}

/// Parse relay message
pub fn parse_relay_message(msg: &str) -> Option<RelayMessage> {
    let arr: Vec<Value> = serde_json::from_str(msg).ok()?;
    let cmd = arr.first()?.as_str()?;
    match cmd {
        "EVENT" => {
            let sub_id = arr.get(1)?.as_str()?.to_string();
            let event: nostr::Event = serde_json::from_value(arr.get(2)?.clone()).ok()?;
            Some(RelayMessage::Event { sub_id, event })
        }
        "OK" => {
            let event_id = arr.get(1)?.as_str()?.to_string();
            let accepted = arr.get(2)?.as_bool()?;
            let message = arr.get(3).and_then(|v| v.as_str()).map(String::from);
            Some(RelayMessage::Ok { event_id, accepted, message })
        }
        "EOSE" => {
            let sub_id = arr.get(1)?.as_str()?.to_string();
            Some(RelayMessage::Eose { sub_id })
        }
        "CLOSED" => {
            let sub_id = arr.get(1)?.as_str()?.to_string();
            let message = arr.get(2).and_then(|v| v.as_str()).unwrap_or_default().to_string();
            Some(RelayMessage::Closed { sub_id, message })
        }
        "NOTICE" => {
            let message = arr.get(1)?.as_str()?.to_string();
            Some(RelayMessage::Notice { message })
        }
        _ => None,
    }
}

/// Relay message types
#[derive(Debug)]
pub enum RelayMessage {
    Event { sub_id: String, event: nostr::Event },
    Ok { event_id: String, accepted: bool, message: Option<String> },
    Eose { sub_id: String },
    Closed { sub_id: String, message: String },
    Notice { message: String },
}
