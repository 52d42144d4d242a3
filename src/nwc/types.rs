//! Wallet method names and the records they exchange (NIP-47).
//!
//! Amounts are millisatoshis. Reply fields a wallet leaves out or sends as
//! `null` decode to their defaults.

use crate::error::NwcError;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

fn nullable<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(d).map(Option::unwrap_or_default)
}

/// Wallet methods this client speaks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    GetBalance,
    MakeInvoice,
    PayInvoice,
    PayKeysend,
    LookupInvoice,
    ListTransactions,
    GetInfo,
}

impl Method {
    pub const ALL: [Method; 7] = [
        Method::GetBalance,
        Method::MakeInvoice,
        Method::PayInvoice,
        Method::PayKeysend,
        Method::LookupInvoice,
        Method::ListTransactions,
        Method::GetInfo,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::GetBalance => "get_balance",
            Method::MakeInvoice => "make_invoice",
            Method::PayInvoice => "pay_invoice",
            Method::PayKeysend => "pay_keysend",
            Method::LookupInvoice => "lookup_invoice",
            Method::ListTransactions => "list_transactions",
            Method::GetInfo => "get_info",
        }
    }
}

impl FromStr for Method {
    type Err = NwcError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == value)
            .ok_or_else(|| NwcError::Encoding(format!("unknown wallet method: {}", value)))
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Invoice record. Transactions share the same shape.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct InvoiceDetails {
    #[serde(rename = "type", default, deserialize_with = "nullable")]
    pub kind: String,
    #[serde(default, deserialize_with = "nullable")]
    pub invoice: String,
    #[serde(default, deserialize_with = "nullable")]
    pub description: String,
    #[serde(default, deserialize_with = "nullable")]
    pub description_hash: String,
    #[serde(default, deserialize_with = "nullable")]
    pub preimage: String,
    #[serde(default, deserialize_with = "nullable")]
    pub payment_hash: String,
    #[serde(default, deserialize_with = "nullable")]
    pub amount: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub fees_paid: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub created_at: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub expires_at: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub settled_at: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub metadata: Map<String, Value>,
}

pub type TransactionDetails = InvoiceDetails;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Balance {
    #[serde(default, deserialize_with = "nullable")]
    pub balance: i64,
}

/// Result of `pay_invoice` and `pay_keysend`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PaymentResult {
    #[serde(default, deserialize_with = "nullable")]
    pub preimage: String,
    #[serde(default, deserialize_with = "nullable")]
    pub fees_paid: i64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TransactionList {
    #[serde(default, deserialize_with = "nullable")]
    pub transactions: Vec<TransactionDetails>,
}

/// `get_info` reply. `methods` stays textual so methods newer than this
/// client still decode.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WalletInfo {
    #[serde(default, deserialize_with = "nullable")]
    pub alias: String,
    #[serde(default, deserialize_with = "nullable")]
    pub pubkey: String,
    #[serde(default, deserialize_with = "nullable")]
    pub network: String,
    #[serde(default, deserialize_with = "nullable")]
    pub methods: Vec<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub color: String,
    #[serde(default, deserialize_with = "nullable")]
    pub block_height: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub block_hash: String,
    #[serde(default, deserialize_with = "nullable")]
    pub notifications: Vec<String>,
}

impl WalletInfo {
    pub fn supports(&self, method: Method) -> bool {
        self.methods.iter().any(|m| m == method.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MakeInvoiceRequest {
    pub amount: u64,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description_hash: Option<String>,
    /// Seconds until the invoice expires
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry: Option<u64>,
}

impl MakeInvoiceRequest {
    pub fn new(amount: u64, description: impl Into<String>) -> Self {
        Self { amount, description: description.into(), ..Default::default() }
    }
    pub fn with_description_hash(mut self, hash: impl Into<String>) -> Self { self.description_hash = Some(hash.into()); self }
    pub fn with_expiry(mut self, secs: u64) -> Self { self.expiry = Some(secs); self }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PayInvoiceRequest {
    pub invoice: String,
    /// Only for zero-amount invoices
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PayKeysendRequest {
    pub amount: u64,
    pub pubkey: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LookupInvoiceRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_hash: Option<String>,
}

/// Filters for `list_transactions`; unset fields are not sent.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ListTransactionsRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub until: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unpaid: Option<bool>,
    /// `incoming` or `outgoing`
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_method_names() {
        for m in Method::ALL {
            assert_eq!(m.as_str().parse::<Method>().ok(), Some(m));
            assert_eq!(m.to_string(), m.as_str());
        }
        assert!(matches!("multi_pay_invoice".parse::<Method>(), Err(NwcError::Encoding(_))));
    }

    #[test]
    fn test_invoice_decodes_nulls_and_gaps() {
        let details: InvoiceDetails = serde_json::from_value(json!({
            "type": "incoming",
            "invoice": "lnbc1...",
            "description": null,
            "amount": 1000,
            "metadata": null
        }))
        .expect("decode");
        assert_eq!(details.kind, "incoming");
        assert_eq!(details.invoice, "lnbc1...");
        assert_eq!(details.description, "");
        assert_eq!(details.amount, 1000);
        assert_eq!(details.settled_at, 0);
        assert!(details.metadata.is_empty());
    }

    #[test]
    fn test_invoice_wire_names() {
        let details = InvoiceDetails { kind: "outgoing".into(), fees_paid: 3, ..Default::default() };
        let value = serde_json::to_value(&details).expect("encode");
        assert_eq!(value["type"], "outgoing");
        assert_eq!(value["fees_paid"], 3);
    }

    #[test]
    fn test_request_params_omit_unset() {
        let make = serde_json::to_value(MakeInvoiceRequest::new(1000, "coffee")).expect("encode");
        assert_eq!(make, json!({"amount": 1000, "description": "coffee"}));

        let make = serde_json::to_value(MakeInvoiceRequest::new(1, "x").with_expiry(600)).expect("encode");
        assert_eq!(make["expiry"], 600);

        let list = serde_json::to_value(ListTransactionsRequest::default()).expect("encode");
        assert_eq!(list, json!({}));

        let list = serde_json::to_value(ListTransactionsRequest {
            limit: Some(10),
            kind: Some("incoming".into()),
            ..Default::default()
        })
        .expect("encode");
        assert_eq!(list, json!({"limit": 10, "type": "incoming"}));
    }

    #[test]
    fn test_wallet_info_supports() {
        let info: WalletInfo = serde_json::from_value(json!({
            "alias": "node",
            "methods": ["get_balance", "pay_invoice", "sign_message"],
            "block_height": 840000
        }))
        .expect("decode");
        assert!(info.supports(Method::PayInvoice));
        assert!(!info.supports(Method::PayKeysend));
        assert_eq!(info.block_height, 840000);
        assert!(info.notifications.is_empty());
    }
}
