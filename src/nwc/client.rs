//! NwcClient - one method per wallet operation, all through `call`.

use crate::error::{NwcError, NwcResult};
use crate::identity::ClientIdentity;
use crate::nostr::Connector;
use crate::nwc::codec::Request;
use crate::nwc::config::SessionConfig;
use crate::nwc::session::Session;
use crate::nwc::types::*;
use crate::nwc::uri::parse_connection_uri;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Wallet client for one connection string. Calls are independent and may run
/// concurrently; each opens and closes its own relay connection.
pub struct NwcClient {
    session: Session,
}

impl NwcClient {
    #[cfg(feature = "relay")]
    pub fn new(uri: &str) -> NwcResult<Self> {
        Self::with_config(uri, SessionConfig::default())
    }

    #[cfg(feature = "relay")]
    pub fn with_config(uri: &str, config: SessionConfig) -> NwcResult<Self> {
        let connector = crate::nostr::WebSocketConnector::new(config.publish_timeout);
        Self::with_connector(uri, config, Arc::new(connector))
    }

    pub fn with_connector(uri: &str, config: SessionConfig, connector: Arc<dyn Connector>) -> NwcResult<Self> {
        let identity = ClientIdentity::from_uri(parse_connection_uri(uri)?)?;
        tracing::debug!(
            relay = %identity.relay,
            wallet = %identity.wallet_pubkey_hex(),
            client = %identity.client_pubkey_hex(),
            "Wallet client ready"
        );
        Ok(Self { session: Session::new(identity, connector, config) })
    }

    pub fn identity(&self) -> &ClientIdentity {
        self.session.identity()
    }

    pub fn config(&self) -> &SessionConfig {
        self.session.config()
    }

    /// Untyped call: the reply's `result` as JSON.
    pub async fn request(&self, method: &str, params: Map<String, Value>) -> NwcResult<Value> {
        self.session.request(&Request::new(method, params)).await?.into_result()
    }

    /// Typed call: `params` must serialize to a JSON object.
    pub async fn call<P, R>(&self, method: Method, params: &P) -> NwcResult<R>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let params = match serde_json::to_value(params)? {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => return Err(NwcError::Encoding(format!("{} params must be an object, got {}", method, other))),
        };
        let result = self.request(method.as_str(), params).await?;
        Ok(serde_json::from_value(result)?)
    }

    pub async fn get_balance(&self) -> NwcResult<Balance> {
        self.call(Method::GetBalance, &Map::new()).await
    }

    /// Returns the bolt11 invoice string.
    pub async fn make_invoice(&self, amount: u64, description: &str) -> NwcResult<String> {
        let details = self.make_invoice_with(&MakeInvoiceRequest::new(amount, description)).await?;
        Ok(details.invoice)
    }

    pub async fn make_invoice_with(&self, request: &MakeInvoiceRequest) -> NwcResult<InvoiceDetails> {
        self.call(Method::MakeInvoice, request).await
    }

    pub async fn pay_invoice(&self, invoice: &str) -> NwcResult<PaymentResult> {
        let request = PayInvoiceRequest { invoice: invoice.into(), amount: None };
        self.call(Method::PayInvoice, &request).await
    }

    pub async fn pay_invoice_amount(&self, invoice: &str, amount: u64) -> NwcResult<PaymentResult> {
        let request = PayInvoiceRequest { invoice: invoice.into(), amount: Some(amount) };
        self.call(Method::PayInvoice, &request).await
    }

    pub async fn pay_keysend(&self, pubkey: &str, amount: u64) -> NwcResult<PaymentResult> {
        let request = PayKeysendRequest { amount, pubkey: pubkey.into() };
        self.call(Method::PayKeysend, &request).await
    }

    pub async fn lookup_invoice(&self, invoice: &str) -> NwcResult<InvoiceDetails> {
        let request = LookupInvoiceRequest { invoice: Some(invoice.into()), payment_hash: None };
        self.call(Method::LookupInvoice, &request).await
    }

    pub async fn lookup_payment_hash(&self, payment_hash: &str) -> NwcResult<InvoiceDetails> {
        let request = LookupInvoiceRequest { invoice: None, payment_hash: Some(payment_hash.into()) };
        self.call(Method::LookupInvoice, &request).await
    }

    pub async fn list_transactions(&self) -> NwcResult<Vec<TransactionDetails>> {
        self.list_transactions_filtered(&ListTransactionsRequest::default()).await
    }

    pub async fn list_transactions_filtered(&self, filter: &ListTransactionsRequest) -> NwcResult<Vec<TransactionDetails>> {
        let list: TransactionList = self.call(Method::ListTransactions, filter).await?;
        Ok(list.transactions)
    }

    pub async fn get_info(&self) -> NwcResult<WalletInfo> {
        self.call(Method::GetInfo, &Map::new()).await
    }
}
