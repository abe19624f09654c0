//! Error types for the invocation bridge

use std::fmt;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

/// Result type alias for bridge operations
pub type Result<T> = std::result::Result<T, Error>;

/// A single argument-validation failure.
///
/// Validation collects every violation found, not just the first, so the
/// calling model can correct all problems in one round-trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    /// Parameter the violation applies to, or `None` for the argument
    /// payload as a whole (e.g. "arguments must be a JSON object")
    pub param: Option<String>,

    /// Human-readable description of the violation
    pub message: String,
}

impl Violation {
    /// Create a violation scoped to a named parameter
    #[must_use]
    pub fn param(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            param: Some(name.into()),
            message: message.into(),
        }
    }

    /// Create a violation about the argument payload as a whole
    #[must_use]
    pub fn payload(message: impl Into<String>) -> Self {
        Self {
            param: None,
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.param {
            Some(name) => write!(f, "{name}: {}", self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

/// Errors that can occur in the invocation bridge
#[derive(Debug, Error)]
pub enum Error {
    /// No capability registered under the requested name
    #[error("unknown capability: {0}")]
    UnknownCapability(String),

    /// A capability with this name is already registered (registration-time)
    #[error("duplicate capability: {0}")]
    DuplicateCapability(String),

    /// Arguments failed schema validation; every violation is listed
    #[error("invalid arguments: {}", join_violations(.0))]
    Validation(Vec<Violation>),

    /// Connection or network failure talking to the node
    #[error("transport error: {0}")]
    Transport(String),

    /// The node call exceeded its deadline
    #[error("node call timed out after {0:?}")]
    Timeout(Duration),

    /// The node returned a domain-level rejection (e.g. invoice expired,
    /// insufficient balance)
    #[error("node rejected request: {0}")]
    NodeRejected(String),

    /// The node response did not match the capability's expected shape —
    /// a contract violation by the node-client collaborator
    #[error("malformed node response: {0}")]
    MalformedResponse(String),

    /// A mutating request was repeated within the idempotency window
    #[error("duplicate submission of mutating request (idempotency key {0})")]
    DuplicateSubmission(String),
}

fn join_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Bounded failure category surfaced to the calling agent.
///
/// Serialized in snake_case inside failure results so the model sees a
/// stable, machine-matchable tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// No capability registered under the requested name
    UnknownCapability,
    /// Capability name collision at registration time
    DuplicateCapability,
    /// Arguments failed schema validation
    Validation,
    /// Connection or network failure
    Transport,
    /// Node call deadline exceeded
    Timeout,
    /// Domain-level rejection by the node
    NodeRejected,
    /// Node response shape mismatch
    MalformedResponse,
    /// Mutating request repeated within the idempotency window
    DuplicateSubmission,
}

impl ErrorCategory {
    /// Whether a verbatim retry of this failure can plausibly succeed.
    ///
    /// Only transport and timeout failures are transient. The bridge
    /// retries these transparently for read-only capabilities; for mutating
    /// capabilities the decision is left to the caller.
    #[must_use]
    pub const fn is_transient(self) -> bool {
        matches!(self, Self::Transport | Self::Timeout)
    }
}

impl Error {
    /// The bounded category for this error
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::UnknownCapability(_) => ErrorCategory::UnknownCapability,
            Self::DuplicateCapability(_) => ErrorCategory::DuplicateCapability,
            Self::Validation(_) => ErrorCategory::Validation,
            Self::Transport(_) => ErrorCategory::Transport,
            Self::Timeout(_) => ErrorCategory::Timeout,
            Self::NodeRejected(_) => ErrorCategory::NodeRejected,
            Self::MalformedResponse(_) => ErrorCategory::MalformedResponse,
            Self::DuplicateSubmission(_) => ErrorCategory::DuplicateSubmission,
        }
    }

    /// Whether a verbatim retry can plausibly succeed (see
    /// [`ErrorCategory::is_transient`])
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        self.category().is_transient()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_message_lists_every_violation() {
        let err = Error::Validation(vec![
            Violation::param("invoice", "required parameter missing"),
            Violation::param("fee_limit_sat", "must be an integer"),
        ]);

        let msg = err.to_string();
        assert!(msg.contains("invoice: required parameter missing"), "{msg}");
        assert!(msg.contains("fee_limit_sat: must be an integer"), "{msg}");
    }

    #[test]
    fn payload_violation_has_no_param_prefix() {
        let v = Violation::payload("arguments must be a JSON object");
        assert_eq!(v.to_string(), "arguments must be a JSON object");
    }

    #[test]
    fn transient_categories() {
        assert!(Error::Transport("reset".into()).is_transient());
        assert!(Error::Timeout(Duration::from_secs(30)).is_transient());
        assert!(!Error::NodeRejected("expired".into()).is_transient());
        assert!(!Error::MalformedResponse("shape".into()).is_transient());
        assert!(!Error::UnknownCapability("x".into()).is_transient());
        assert!(!Error::Validation(vec![]).is_transient());
    }

    #[test]
    fn categories_serialize_snake_case() {
        let tag = serde_json::to_string(&ErrorCategory::NodeRejected).unwrap();
        assert_eq!(tag, "\"node_rejected\"");
        let tag = serde_json::to_string(&ErrorCategory::DuplicateSubmission).unwrap();
        assert_eq!(tag, "\"duplicate_submission\"");
    }
}
