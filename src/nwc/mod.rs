//! NWC - Nostr Wallet Connect (NIP-47) client
//!
//! ```text
//! NwcClient::get_balance() ──▶ call(Method, params)
//!                                 │
//!                                 ├── Nip04Codec::encrypt_request
//!                                 ├── Session: connect → REQ → EVENT → await reply (timeout)
//!                                 ├── Nip04Codec::decrypt_response
//!                                 └── ResponseDocument::into_result → typed record
//! ```
//!
//! # Methods
//!
//! | Method | Params | Result |
//! |--------|--------|--------|
//! | `get_balance` | `{}` | `Balance` |
//! | `make_invoice` | `{amount, description}` | `InvoiceDetails` |
//! | `pay_invoice` | `{invoice}` | `PaymentResult` |
//! | `pay_keysend` | `{amount, pubkey}` | `PaymentResult` |
//! | `lookup_invoice` | `{invoice}` | `InvoiceDetails` |
//! | `list_transactions` | `{}` | `TransactionList` |
//! | `get_info` | `{}` | `WalletInfo` |

pub mod client;
pub mod codec;
pub mod config;
pub mod session;
pub mod types;
pub mod uri;

pub use client::NwcClient;
pub use codec::{Nip04Codec, RemoteErrorBody, Request, ResponseDocument};
pub use config::SessionConfig;
pub use session::Session;
pub use types::{
    Balance, InvoiceDetails, ListTransactionsRequest, LookupInvoiceRequest, MakeInvoiceRequest, Method,
    PayInvoiceRequest, PayKeysendRequest, PaymentResult, TransactionDetails, TransactionList, WalletInfo,
};
pub use uri::{parse_connection_uri, ConnectionUri};
