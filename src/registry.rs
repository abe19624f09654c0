//! Capability definitions and the schema registry

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::schema::ArgumentSchema;
use crate::{Error, Result};

/// Access class of a capability.
///
/// Drives the retry policy: read-only calls may be retried transparently on
/// transient failures, mutating calls are never retried automatically since
/// the underlying RPC is not guaranteed idempotent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Access {
    /// No node state change; safe to retry
    ReadOnly,
    /// Moves funds or changes node state; at most one dispatch per call
    Mutating,
}

impl Access {
    /// Whether this capability changes node state
    #[must_use]
    pub const fn is_mutating(self) -> bool {
        matches!(self, Self::Mutating)
    }
}

/// The node operation a capability is bound to.
///
/// Closed set: one variant per method on [`NodeClient`], so the dispatcher
/// is an exhaustive match and a new operation cannot be registered without
/// a binding.
///
/// [`NodeClient`]: crate::node::NodeClient
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeOp {
    /// Node identity and sync status
    GetInfo,
    /// On-chain wallet balance
    WalletBalance,
    /// Channel liquidity totals
    ChannelBalance,
    /// Open channel listing
    ListChannels,
    /// Decode a BOLT11 payment request
    DecodePayReq,
    /// Create an invoice
    AddInvoice,
    /// Pay a BOLT11 invoice
    SendPayment,
}

/// A node operation exposed as a callable tool.
///
/// Immutable once registered; built from a static table at bridge
/// construction time.
#[derive(Debug, Clone)]
pub struct Capability {
    /// Unique tool name (e.g. `channel_balance`)
    pub name: String,

    /// LLM-facing description
    pub description: String,

    /// Read-only or mutating
    pub access: Access,

    /// Bound node operation
    pub op: NodeOp,

    /// Argument schema
    pub schema: ArgumentSchema,
}

impl Capability {
    /// Create a capability definition
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        access: Access,
        op: NodeOp,
        schema: ArgumentSchema,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            access,
            op,
            schema,
        }
    }
}

/// Tool definition in the shape the calling agent's tool-description
/// mechanism consumes: name, description, JSON Schema parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Tool name
    pub name: String,
    /// Tool description
    pub description: String,
    /// JSON Schema for the arguments object
    pub parameters: serde_json::Value,
}

/// Registry of capability definitions, iterated in registration order
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    capabilities: IndexMap<String, Capability>,
}

impl SchemaRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self {
            capabilities: IndexMap::new(),
        }
    }

    /// Register a capability definition
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateCapability`] if the name is already taken.
    pub fn register(&mut self, capability: Capability) -> Result<()> {
        if self.capabilities.contains_key(&capability.name) {
            return Err(Error::DuplicateCapability(capability.name));
        }
        self.capabilities.insert(capability.name.clone(), capability);
        Ok(())
    }

    /// Look up a capability by name
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownCapability`] if no capability is registered
    /// under `name`.
    pub fn lookup(&self, name: &str) -> Result<&Capability> {
        self.capabilities
            .get(name)
            .ok_or_else(|| Error::UnknownCapability(name.to_owned()))
    }

    /// Iterate all capabilities in registration order.
    ///
    /// The iterator is finite and restartable; call `list()` again for a
    /// fresh pass.
    #[must_use]
    pub fn list(&self) -> impl Iterator<Item = &Capability> {
        self.capabilities.values()
    }

    /// Render every capability as a [`ToolDefinition`] for agent
    /// registration, in registration order
    #[must_use]
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.list()
            .map(|cap| ToolDefinition {
                name: cap.name.clone(),
                description: cap.description.clone(),
                parameters: cap.schema.to_json_schema(),
            })
            .collect()
    }

    /// Names of all registered capabilities, in registration order
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.capabilities.keys().map(String::as_str).collect()
    }

    /// Whether a capability with the given name is registered
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.capabilities.contains_key(name)
    }

    /// Number of registered capabilities
    #[must_use]
    pub fn len(&self) -> usize {
        self.capabilities.len()
    }

    /// Whether the registry is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.capabilities.is_empty()
    }
}
