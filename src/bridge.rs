//! The invocation bridge façade
//!
//! One call runs `Received → Validating → Dispatching → Formatting →
//! {Succeeded, Failed}`. There is no retry loop inside a single mutating
//! call; read-only capabilities retry transparently on transient failures
//! per the configured policy. The bridge is stateless across calls apart
//! from the read-only registry and the TTL dedup window, so any concurrency
//! model in the agent runtime can drive it safely.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::capabilities;
use crate::config::BridgeConfig;
use crate::dispatch::dispatch;
use crate::error::{Error, ErrorCategory, Result};
use crate::format::format;
use crate::node::NodeClient;
use crate::registry::{Capability, SchemaRegistry, ToolDefinition};
use crate::retry::delay_for_attempt;
use crate::validate::{TypedArgs, validate};

/// Tagged outcome of a single invocation, as handed back to the calling
/// agent.
///
/// Failures are structured data — category plus human-readable message —
/// never an unhandled fault: one bad tool call must not bring down the
/// bridge for subsequent calls. Transport and timeout failures are the
/// retryable categories (see [`ErrorCategory::is_transient`]); the bridge
/// makes no retry decision for mutating capabilities.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum InvocationResult {
    /// The call completed; `payload` is the formatted response
    Success {
        /// Flattened, stable response payload
        payload: Value,
    },
    /// The call failed at some pipeline stage
    Failure {
        /// Bounded failure category
        category: ErrorCategory,
        /// Human-readable detail for the model or end user
        message: String,
    },
}

impl InvocationResult {
    /// Whether the invocation succeeded
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// The success payload, if any
    #[must_use]
    pub const fn payload(&self) -> Option<&Value> {
        match self {
            Self::Success { payload } => Some(payload),
            Self::Failure { .. } => None,
        }
    }

    /// The failure category, if any
    #[must_use]
    pub const fn category(&self) -> Option<ErrorCategory> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { category, .. } => Some(*category),
        }
    }
}

impl From<Result<Value>> for InvocationResult {
    fn from(result: Result<Value>) -> Self {
        match result {
            Ok(payload) => Self::Success { payload },
            Err(err) => Self::Failure {
                category: err.category(),
                message: err.to_string(),
            },
        }
    }
}

/// Derive the deterministic idempotency key for a request: SHA-256 over
/// the capability name and the canonical-JSON arguments, hex-encoded.
///
/// Object keys are serialized sorted, so the argument order the model
/// happened to emit never changes the key. A NUL byte separates name from
/// arguments so distinct (name, args) pairs cannot collide by
/// concatenation.
#[must_use]
pub fn idempotency_key(capability: &str, raw_args: &Value) -> String {
    let mut hasher = Sha256::new();
    hasher.update(capability.as_bytes());
    hasher.update([0u8]);
    hasher.update(canonical_json(raw_args).as_bytes());
    hex::encode(hasher.finalize())
}

/// Serialize a JSON value with object keys sorted at every level
fn canonical_json(value: &Value) -> String {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            let body = entries
                .iter()
                .map(|(key, val)| {
                    format!("{}:{}", Value::String((*key).clone()), canonical_json(val))
                })
                .collect::<Vec<_>>()
                .join(",");
            format!("{{{body}}}")
        }
        Value::Array(items) => {
            let body = items
                .iter()
                .map(canonical_json)
                .collect::<Vec<_>>()
                .join(",");
            format!("[{body}]")
        }
        other => other.to_string(),
    }
}

/// Tool-invocation bridge between an LLM agent and a Lightning node.
///
/// Owns the capability registry for its lifetime and borrows the node
/// connection; opening and closing the connection is the caller's
/// responsibility. Safe to share across concurrent invocations.
///
/// Cancellation: dropping the `invoke` future before dispatch begins has no
/// node side effect. Aborting a mutating capability after dispatch has
/// started is unsupported — the transfer may already have taken effect.
pub struct Bridge {
    registry: SchemaRegistry,
    client: Arc<dyn NodeClient>,
    config: BridgeConfig,
    /// Idempotency keys of recently dispatched mutating requests
    recent_mutations: mini_moka::sync::Cache<String, ()>,
    /// Serializes the window check-and-insert; the cache has no atomic
    /// conditional insert of its own
    dedup_gate: Mutex<()>,
}

impl fmt::Debug for Bridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bridge")
            .field("capabilities", &self.registry.names())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Bridge {
    /// Create a bridge with the built-in LND capability set and default
    /// configuration.
    ///
    /// # Errors
    ///
    /// Propagates registration failure from the capability table.
    pub fn new(client: Arc<dyn NodeClient>) -> Result<Self> {
        Self::with_config(client, BridgeConfig::default())
    }

    /// Create a bridge with the built-in capability set and custom
    /// configuration.
    ///
    /// # Errors
    ///
    /// Propagates registration failure from the capability table.
    pub fn with_config(client: Arc<dyn NodeClient>, config: BridgeConfig) -> Result<Self> {
        Ok(Self::with_registry(capabilities::builtin()?, client, config))
    }

    /// Create a bridge over a caller-supplied registry
    #[must_use]
    pub fn with_registry(
        registry: SchemaRegistry,
        client: Arc<dyn NodeClient>,
        config: BridgeConfig,
    ) -> Self {
        let recent_mutations = mini_moka::sync::Cache::builder()
            .time_to_live(config.dedup_window)
            .build();
        Self {
            registry,
            client,
            config,
            recent_mutations,
            dedup_gate: Mutex::new(()),
        }
    }

    /// The capability registry
    #[must_use]
    pub const fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    /// Tool definitions for registration with the calling agent, in
    /// registration order
    #[must_use]
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.registry.definitions()
    }

    /// Execute one capability invocation.
    ///
    /// Pipeline: capability lookup, argument validation, dispatch (with
    /// transparent retry for read-only capabilities on transient failures),
    /// response formatting. Every failure comes back as a structured
    /// [`InvocationResult::Failure`]; this method never panics on caller
    /// input and never returns `Err`.
    pub async fn invoke(&self, name: &str, raw_args: &Value) -> InvocationResult {
        let result = self.try_invoke(name, raw_args).await;
        if let Err(err) = &result {
            warn!(capability = name, category = ?err.category(), "invocation failed: {err}");
        }
        result.into()
    }

    async fn try_invoke(&self, name: &str, raw_args: &Value) -> Result<Value> {
        let capability = self.registry.lookup(name)?;
        let args = validate(&capability.schema, raw_args)?;

        let raw = if capability.access.is_mutating() {
            self.dispatch_once(capability, &args, name, raw_args).await?
        } else {
            self.dispatch_with_retry(capability, &args).await?
        };

        format(capability, &raw)
    }

    /// Dispatch a mutating capability: at most once per call, guarded by
    /// the idempotency window
    async fn dispatch_once(
        &self,
        capability: &Capability,
        args: &TypedArgs,
        name: &str,
        raw_args: &Value,
    ) -> Result<Value> {
        let key = idempotency_key(name, raw_args);
        {
            // Check-and-insert under one lock: two identical submissions
            // racing on a multi-threaded runtime must not both pass the
            // window check. The guard is dropped before any await.
            let _gate = self
                .dedup_gate
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if self.recent_mutations.contains_key(&key) {
                return Err(Error::DuplicateSubmission(key));
            }
            // Record before dispatching: a resubmission racing a slow
            // dispatch must also be refused
            self.recent_mutations.insert(key, ());
        }

        dispatch(
            capability,
            args,
            self.client.as_ref(),
            self.config.dispatch_timeout,
        )
        .await
    }

    /// Dispatch a read-only capability, retrying transient failures with
    /// bounded exponential backoff
    async fn dispatch_with_retry(
        &self,
        capability: &Capability,
        args: &TypedArgs,
    ) -> Result<Value> {
        let policy = &self.config.retry;
        let max_attempts = policy.max_attempts.max(1);
        let mut attempt = 0u32;

        loop {
            match dispatch(
                capability,
                args,
                self.client.as_ref(),
                self.config.dispatch_timeout,
            )
            .await
            {
                Ok(raw) => return Ok(raw),
                Err(err) if err.is_transient() && attempt + 1 < max_attempts => {
                    let delay = delay_for_attempt(policy, attempt);
                    debug!(
                        capability = %capability.name,
                        attempt,
                        ?delay,
                        "transient failure, retrying: {err}"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
