//! Built-in LND capability table
//!
//! The standard set the bridge exposes to a calling agent. Descriptions are
//! written for the model, not for humans reading code: they say when to use
//! the tool and what it returns.

use crate::Result;
use crate::registry::{Access, Capability, NodeOp, SchemaRegistry};
use crate::schema::{ArgumentSchema, Constraint, ParamSpec, ParamType};

/// Maximum invoice expiry the bridge will request: one year in seconds
const MAX_INVOICE_EXPIRY: i64 = 31_536_000;

/// Build a registry holding the built-in capability set.
///
/// Read-only: `get_info`, `wallet_balance`, `channel_balance`,
/// `list_channels`, `decode_invoice`. Mutating: `add_invoice`,
/// `send_payment`.
///
/// # Errors
///
/// Returns [`DuplicateCapability`](crate::Error::DuplicateCapability) if a
/// name collides, which cannot happen for the static table itself but is
/// propagated rather than panicking.
pub fn builtin() -> Result<SchemaRegistry> {
    let mut registry = SchemaRegistry::new();
    for capability in query_capabilities() {
        registry.register(capability)?;
    }
    for capability in payment_capabilities() {
        registry.register(capability)?;
    }
    Ok(registry)
}

/// A required BOLT11 invoice parameter
fn invoice_param(description: &str) -> ParamSpec {
    ParamSpec::new("invoice", ParamType::String, description)
        .constrain(Constraint::NonEmpty)
        .constrain(Constraint::Bolt11)
}

/// Read-only capabilities: balance, info, and decode queries
fn query_capabilities() -> Vec<Capability> {
    vec![
        Capability::new(
            "get_info",
            "Get the node's identity pubkey, alias, version, block height, \
             sync status, and peer/channel counts.",
            Access::ReadOnly,
            NodeOp::GetInfo,
            ArgumentSchema::empty(),
        ),
        Capability::new(
            "wallet_balance",
            "Get the on-chain wallet balance in satoshis: total, confirmed, \
             unconfirmed, and a per-account breakdown.",
            Access::ReadOnly,
            NodeOp::WalletBalance,
            ArgumentSchema::empty(),
        ),
        Capability::new(
            "channel_balance",
            "Get channel liquidity in satoshis: local (spendable), remote \
             (receivable), and pending-open balances.",
            Access::ReadOnly,
            NodeOp::ChannelBalance,
            ArgumentSchema::empty(),
        ),
        Capability::new(
            "list_channels",
            "List open channels with peer pubkey, capacity, and local/remote \
             balances in satoshis.",
            Access::ReadOnly,
            NodeOp::ListChannels,
            ArgumentSchema::empty().with(
                ParamSpec::new(
                    "active_only",
                    ParamType::Boolean,
                    "Only include channels whose peer is currently online",
                )
                .optional(),
            ),
        ),
        Capability::new(
            "decode_invoice",
            "Decode a BOLT11 invoice without paying it. Returns destination, \
             amount, description, expiry, route hints, and feature flags. \
             Always decode before paying an unfamiliar invoice.",
            Access::ReadOnly,
            NodeOp::DecodePayReq,
            ArgumentSchema::empty()
                .with(invoice_param("BOLT11 payment request (starts with 'ln')")),
        ),
    ]
}

/// Mutating capabilities: these move funds or change node state and are
/// never retried automatically
fn payment_capabilities() -> Vec<Capability> {
    vec![
        Capability::new(
            "add_invoice",
            "Create a BOLT11 invoice for receiving a payment. Returns the \
             payment request string to hand to the payer.",
            Access::Mutating,
            NodeOp::AddInvoice,
            ArgumentSchema::empty()
                .with(
                    ParamSpec::new(
                        "amount_sat",
                        ParamType::Integer,
                        "Invoice amount in satoshis",
                    )
                    .constrain(Constraint::MinInt(1)),
                )
                .with(
                    ParamSpec::new("memo", ParamType::String, "Description shown to the payer")
                        .optional()
                        .constrain(Constraint::MaxLength(639)),
                )
                .with(
                    ParamSpec::new(
                        "expiry_seconds",
                        ParamType::Integer,
                        "Invoice lifetime in seconds",
                    )
                    .optional()
                    .constrain(Constraint::MinInt(1))
                    .constrain(Constraint::MaxInt(MAX_INVOICE_EXPIRY)),
                ),
        ),
        Capability::new(
            "send_payment",
            "Pay a BOLT11 invoice. IRREVERSIBLE: funds leave the node. Decode \
             the invoice first and confirm amount and destination with the user.",
            Access::Mutating,
            NodeOp::SendPayment,
            ArgumentSchema::empty()
                .with(invoice_param("BOLT11 payment request to pay"))
                .with(
                    ParamSpec::new(
                        "fee_limit_sat",
                        ParamType::Integer,
                        "Maximum routing fee in satoshis",
                    )
                    .optional()
                    .constrain(Constraint::MinInt(0)),
                ),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_registers_all_seven() {
        let registry = builtin().unwrap();
        assert_eq!(
            registry.names(),
            [
                "get_info",
                "wallet_balance",
                "channel_balance",
                "list_channels",
                "decode_invoice",
                "add_invoice",
                "send_payment",
            ]
        );
    }

    #[test]
    fn mutating_flags_match_side_effects() {
        let registry = builtin().unwrap();
        for cap in registry.list() {
            let mutating = matches!(cap.name.as_str(), "add_invoice" | "send_payment");
            assert_eq!(
                cap.access.is_mutating(),
                mutating,
                "access flag wrong for {}",
                cap.name
            );
        }
    }

    #[test]
    fn payment_capabilities_require_plausible_invoices() {
        let registry = builtin().unwrap();
        for name in ["decode_invoice", "send_payment"] {
            let cap = registry.lookup(name).unwrap();
            let invoice = cap.schema.get("invoice").unwrap();
            assert!(
                invoice.constraints.contains(&Constraint::Bolt11),
                "{name} missing BOLT11 envelope check"
            );
        }
    }

    #[test]
    fn definitions_render_for_agent_registration() {
        let registry = builtin().unwrap();
        let defs = registry.definitions();
        assert_eq!(defs.len(), 7);

        let send = defs.iter().find(|d| d.name == "send_payment").unwrap();
        assert_eq!(send.parameters["required"], serde_json::json!(["invoice"]));
        assert!(!send.description.is_empty());
    }
}
