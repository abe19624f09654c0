//! Node client seam
//!
//! The bridge never opens or closes a connection. The caller supplies an
//! already-authenticated [`NodeClient`]; certificates, macaroons, and
//! host/port configuration are entirely its concern. Each method mirrors
//! one LND operation, takes a typed request record, and returns the node's
//! raw JSON response — the formatter owns turning that into a stable
//! payload.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Errors a node client reports to the bridge
#[derive(Debug, Error)]
pub enum NodeError {
    /// Connection or network failure
    #[error("transport failure: {0}")]
    Transport(String),

    /// The client's own request deadline expired
    #[error("node request timed out")]
    Timeout,

    /// The node returned a domain-level error (invalid invoice,
    /// insufficient balance, unknown peer, ...)
    #[error("{0}")]
    Rejected(String),
}

/// Request record for `list_channels`
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct ListChannelsRequest {
    /// Only include channels that are currently active
    pub active_only: bool,
}

/// Request record for `decode_pay_req`
#[derive(Debug, Clone, Serialize)]
pub struct DecodePayReqRequest {
    /// BOLT11 payment request string
    pub pay_req: String,
}

/// Request record for `add_invoice`
#[derive(Debug, Clone, Serialize)]
pub struct AddInvoiceRequest {
    /// Invoice amount in satoshis
    pub value_sat: i64,

    /// Optional human-readable memo embedded in the invoice
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,

    /// Invoice lifetime in seconds (node default when absent)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry_seconds: Option<i64>,
}

/// Request record for `send_payment`
#[derive(Debug, Clone, Serialize)]
pub struct SendPaymentRequest {
    /// BOLT11 payment request string
    pub payment_request: String,

    /// Maximum routing fee in satoshis (node default when absent)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fee_limit_sat: Option<i64>,
}

/// An open, authenticated handle to a Lightning node.
///
/// One method per registered capability. Implementations must be safe to
/// share across concurrent invocations; the bridge holds an `Arc` and never
/// assumes exclusive access. Every method reports failure as a
/// [`NodeError`]: `Transport` for connection problems, `Timeout` for an
/// implementation-side deadline, `Rejected` for a node-reported domain
/// error.
#[allow(
    clippy::missing_errors_doc,
    reason = "failure contract is uniform and documented on the trait"
)]
#[async_trait]
pub trait NodeClient: Send + Sync {
    /// Node identity, version, and sync status
    async fn get_info(&self) -> Result<Value, NodeError>;

    /// On-chain wallet balance
    async fn wallet_balance(&self) -> Result<Value, NodeError>;

    /// Channel liquidity totals
    async fn channel_balance(&self) -> Result<Value, NodeError>;

    /// Open channels
    async fn list_channels(&self, req: ListChannelsRequest) -> Result<Value, NodeError>;

    /// Decode a BOLT11 payment request without paying it
    async fn decode_pay_req(&self, req: DecodePayReqRequest) -> Result<Value, NodeError>;

    /// Create an invoice. Mutating: changes node state.
    async fn add_invoice(&self, req: AddInvoiceRequest) -> Result<Value, NodeError>;

    /// Pay a BOLT11 invoice synchronously. Mutating and irreversible.
    async fn send_payment(&self, req: SendPaymentRequest) -> Result<Value, NodeError>;
}
