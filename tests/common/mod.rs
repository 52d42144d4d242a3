//! In-memory relay and scripted wallet for session tests.
//!
//! The fake relay does no filtering: every event the wallet script produces is
//! pushed to the open subscription, so the client's own checks are what
//! separates real replies from decoys.

#![allow(dead_code)]

use async_trait::async_trait;
use beenode_nwc::error::TransportError;
use beenode_nwc::nostr::{Connector, EventFilter, EventStream, RelayConnection};
use beenode_nwc::nwc::{Nip04Codec, Request, ResponseDocument};
use nostr::{Event, EventId, Keys, Kind, Tag, Timestamp, UnsignedEvent};
use serde_json::Value;
use std::future::Future;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

pub fn block_on<F: Future>(f: F) -> F::Output {
    let rt = tokio::runtime::Runtime::new().expect("runtime");
    rt.block_on(f)
}

pub fn connection_uri(wallet: &Keys, client: &Keys, relay: &str) -> String {
    format!(
        "nostr+walletconnect://{}?relay={}&secret={}",
        wallet.public_key().to_hex(),
        relay.replace(':', "%3A").replace('/', "%2F"),
        client.secret_key().to_secret_hex()
    )
}

/// What the wallet does with a request
#[derive(Debug, Clone)]
pub enum Reply {
    Result(Value),
    Error { code: String, message: String },
    /// Correlated reply whose content is not valid NIP-04 ciphertext
    Corrupted,
    /// Correlated reply encrypted under an unrelated key
    WrongKey,
    /// Never answer
    Silent,
    /// End the subscription without answering
    HangUp,
}

/// Events pushed ahead of the real reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decoy {
    /// From the wallet, but referencing another request
    OtherRequest,
    /// Referencing this request, but signed by someone else
    ForeignSender,
    /// Right author and reference, wrong kind
    WrongKind,
}

pub type Script = Arc<dyn Fn(&Request) -> Reply + Send + Sync>;

#[derive(Debug, Default)]
pub struct RelayLog {
    pub urls: Vec<String>,
    pub connects: usize,
    pub closes: usize,
    pub published: Vec<Event>,
    pub filters: Vec<EventFilter>,
    pub requests: Vec<Request>,
}

pub struct FakeWallet {
    pub keys: Keys,
    script: Script,
    decoys: Vec<Decoy>,
}

impl FakeWallet {
    pub fn new(script: impl Fn(&Request) -> Reply + Send + Sync + 'static) -> Self {
        Self { keys: Keys::generate(), script: Arc::new(script), decoys: Vec::new() }
    }

    pub fn replying(result: Value) -> Self {
        Self::new(move |_| Reply::Result(result.clone()))
    }

    pub fn with_decoys(mut self, decoys: Vec<Decoy>) -> Self {
        self.decoys = decoys;
        self
    }

    fn respond(&self, request_event: &Event, request: &Request) -> (Vec<Event>, bool) {
        let codec = Nip04Codec::new(&self.keys, request_event.pubkey);
        let mut out = Vec::new();

        for decoy in &self.decoys {
            let decoy_doc = ResponseDocument::success(request.method.clone(), serde_json::json!({"decoy": true}));
            let event = match decoy {
                Decoy::OtherRequest => {
                    let content = codec.encrypt_json(&decoy_doc).expect("encrypt");
                    self.sign(&self.keys, Kind::WalletConnectResponse, request_event, unrelated_id(), content)
                }
                Decoy::ForeignSender => {
                    let imposter = Keys::generate();
                    let content = Nip04Codec::new(&imposter, request_event.pubkey)
                        .encrypt_json(&decoy_doc)
                        .expect("encrypt");
                    self.sign(&imposter, Kind::WalletConnectResponse, request_event, request_event.id, content)
                }
                Decoy::WrongKind => {
                    let content = codec.encrypt_json(&decoy_doc).expect("encrypt");
                    self.sign(&self.keys, Kind::TextNote, request_event, request_event.id, content)
                }
            };
            out.push(event);
        }

        let content = match (self.script)(request) {
            Reply::Result(result) => {
                codec.encrypt_json(&ResponseDocument::success(request.method.clone(), result)).expect("encrypt")
            }
            Reply::Error { code, message } => codec
                .encrypt_json(&ResponseDocument::failure(request.method.clone(), code, message))
                .expect("encrypt"),
            Reply::Corrupted => "bm90IGNpcGhlcnRleHQ=?iv=AAAAAAAAAAAAAAAAAAAAAA==".to_string(),
            Reply::WrongKey => Nip04Codec::new(&Keys::generate(), request_event.pubkey)
                .encrypt_json(&serde_json::json!({"result": {"balance": 0}}))
                .expect("encrypt"),
            Reply::Silent => return (out, false),
            Reply::HangUp => return (out, true),
        };
        out.push(self.sign(&self.keys, Kind::WalletConnectResponse, request_event, request_event.id, content));
        (out, false)
    }

    fn sign(&self, signer: &Keys, kind: Kind, request: &Event, reference: EventId, content: String) -> Event {
        UnsignedEvent::new(
            signer.public_key(),
            Timestamp::now(),
            kind,
            vec![Tag::public_key(request.pubkey), Tag::event(reference)],
            content,
        )
        .sign_with_keys(signer)
        .expect("sign")
    }
}

fn unrelated_id() -> EventId {
    let keys = Keys::generate();
    UnsignedEvent::new(keys.public_key(), Timestamp::now(), Kind::WalletConnectRequest, Vec::<Tag>::new(), "x".to_string())
        .sign_with_keys(&keys)
        .expect("sign")
        .id
}

#[derive(Clone)]
pub struct FakeConnector {
    pub wallet: Arc<FakeWallet>,
    pub log: Arc<Mutex<RelayLog>>,
    pub refuse: bool,
    pub reject_publish: bool,
    pub stall_publish: bool,
}

impl FakeConnector {
    pub fn new(wallet: FakeWallet) -> Self {
        Self {
            wallet: Arc::new(wallet),
            log: Arc::new(Mutex::new(RelayLog::default())),
            refuse: false,
            reject_publish: false,
            stall_publish: false,
        }
    }

    pub fn refusing(mut self) -> Self {
        self.refuse = true;
        self
    }

    pub fn rejecting_publish(mut self) -> Self {
        self.reject_publish = true;
        self
    }

    /// Relay that never acknowledges the request event
    pub fn stalling_publish(mut self) -> Self {
        self.stall_publish = true;
        self
    }

    pub fn log(&self) -> std::sync::MutexGuard<'_, RelayLog> {
        self.log.lock().unwrap_or_else(|p| p.into_inner())
    }
}

#[async_trait]
impl Connector for FakeConnector {
    async fn connect(&self, url: &str) -> Result<Box<dyn RelayConnection>, TransportError> {
        self.log().urls.push(url.to_string());
        if self.refuse {
            return Err(TransportError::Connect("connection refused".into()));
        }
        self.log().connects += 1;
        Ok(Box::new(FakeRelay {
            connector: self.clone(),
            subscription: Mutex::new(None),
        }))
    }
}

pub struct FakeRelay {
    connector: FakeConnector,
    subscription: Mutex<Option<mpsc::Sender<Event>>>,
}

impl FakeRelay {
    fn sender(&self) -> Option<mpsc::Sender<Event>> {
        self.subscription.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }
}

#[async_trait]
impl RelayConnection for FakeRelay {
    async fn publish(&self, event: &Event) -> Result<(), TransportError> {
        self.connector.log().published.push(event.clone());
        if self.connector.reject_publish {
            return Err(TransportError::Rejected("blocked: test".into()));
        }
        if self.connector.stall_publish {
            std::future::pending::<()>().await;
        }

        let wallet = self.connector.wallet.clone();
        let codec = Nip04Codec::new(&wallet.keys, event.pubkey);
        let request: Request = codec.decrypt_json(&event.content).expect("wallet decrypts request");
        self.connector.log().requests.push(request.clone());

        let (events, hang_up) = wallet.respond(event, &request);
        if let Some(tx) = self.sender() {
            for e in events {
                let _ = tx.send(e).await;
            }
        }
        if hang_up {
            self.subscription.lock().unwrap_or_else(|p| p.into_inner()).take();
        }
        Ok(())
    }

    async fn subscribe(&self, _id: &str, filter: EventFilter) -> Result<EventStream, TransportError> {
        self.connector.log().filters.push(filter);
        let (tx, rx) = mpsc::channel(16);
        *self.subscription.lock().unwrap_or_else(|p| p.into_inner()) = Some(tx);
        Ok(rx)
    }

    async fn close(&self) {
        self.subscription.lock().unwrap_or_else(|p| p.into_inner()).take();
        self.connector.log().closes += 1;
    }
}
