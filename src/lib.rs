//! lnd-bridge - Tool-invocation bridge between LLM agents and a Lightning node
//!
//! This library lets a language-model agent drive a stateful financial node
//! safely: model-generated JSON arguments are validated against declared
//! schemas before any money-moving call is issued, node responses are
//! flattened into stable payloads the model can reason over, and failures
//! come back as a bounded set of structured categories with retry guidance.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                  Agent runtime                       │
//! │        (tool selection, prompt loop — external)      │
//! └────────────────────┬────────────────────────────────┘
//!                      │ invoke(name, raw JSON args)
//! ┌────────────────────▼────────────────────────────────┐
//! │                    Bridge                            │
//! │  Registry  │  Validator  │  Dispatcher  │ Formatter │
//! └────────────────────┬────────────────────────────────┘
//!                      │ typed requests / raw responses
//! ┌────────────────────▼────────────────────────────────┐
//! │            NodeClient (external)                     │
//! │    authenticated LND connection, caller-owned        │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use lnd_bridge::Bridge;
//!
//! let bridge = Bridge::new(Arc::new(my_node_client))?;
//!
//! // Hand the tool definitions to the agent runtime
//! let tools = bridge.definitions();
//!
//! // Execute a model-issued tool call
//! let result = bridge
//!     .invoke("channel_balance", &serde_json::json!({}))
//!     .await;
//! ```
//!
//! Mutating capabilities (`send_payment`, `add_invoice`) execute at most
//! once per call and are guarded by a deterministic idempotency key; see
//! [`bridge::idempotency_key`].

pub mod bridge;
pub mod capabilities;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod format;
pub mod node;
pub mod registry;
pub mod retry;
pub mod schema;
pub mod validate;

pub use bridge::{Bridge, InvocationResult, idempotency_key};
pub use config::BridgeConfig;
pub use error::{Error, ErrorCategory, Result, Violation};
pub use node::{
    AddInvoiceRequest, DecodePayReqRequest, ListChannelsRequest, NodeClient, NodeError,
    SendPaymentRequest,
};
pub use registry::{Access, Capability, NodeOp, SchemaRegistry, ToolDefinition};
pub use retry::RetryPolicy;
pub use schema::{ArgumentSchema, Constraint, ParamSpec, ParamType};
pub use validate::{ArgValue, TypedArgs, validate};
