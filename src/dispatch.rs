//! Capability dispatch
//!
//! Maps a validated call onto the bound [`NodeClient`] operation, under a
//! deadline. Owns no state; the access-class distinction that drives the
//! retry policy lives on the capability definition and is enforced by the
//! bridge.

use std::time::Duration;

use serde_json::Value;
use tracing::debug;

use crate::node::{
    AddInvoiceRequest, DecodePayReqRequest, ListChannelsRequest, NodeClient, NodeError,
    SendPaymentRequest,
};
use crate::registry::{Capability, NodeOp};
use crate::validate::TypedArgs;
use crate::{Error, Result};

/// Invoke the node operation bound to `capability` with validated
/// arguments.
///
/// The whole call is wrapped in `deadline`; expiry maps to
/// [`Error::Timeout`]. The raw JSON response is returned untouched — the
/// formatter owns shaping it.
///
/// # Errors
///
/// [`Error::Transport`], [`Error::Timeout`], or [`Error::NodeRejected`],
/// mirroring the node client's failure; [`Error::Validation`] only if the
/// validated arguments do not match the operation's binding (a programming
/// error in the capability table).
pub async fn dispatch(
    capability: &Capability,
    args: &TypedArgs,
    client: &dyn NodeClient,
    deadline: Duration,
) -> Result<Value> {
    debug!(capability = %capability.name, op = ?capability.op, "dispatching node call");

    let call = async {
        let response = match capability.op {
            NodeOp::GetInfo => client.get_info().await,
            NodeOp::WalletBalance => client.wallet_balance().await,
            NodeOp::ChannelBalance => client.channel_balance().await,
            NodeOp::ListChannels => {
                let req = ListChannelsRequest {
                    active_only: args.boolean("active_only").unwrap_or(false),
                };
                client.list_channels(req).await
            }
            NodeOp::DecodePayReq => {
                let req = DecodePayReqRequest {
                    pay_req: args.require_str("invoice")?.to_owned(),
                };
                client.decode_pay_req(req).await
            }
            NodeOp::AddInvoice => {
                let req = AddInvoiceRequest {
                    value_sat: args.require_int("amount_sat")?,
                    memo: args.str("memo").map(str::to_owned),
                    expiry_seconds: args.integer("expiry_seconds"),
                };
                client.add_invoice(req).await
            }
            NodeOp::SendPayment => {
                let req = SendPaymentRequest {
                    payment_request: args.require_str("invoice")?.to_owned(),
                    fee_limit_sat: args.integer("fee_limit_sat"),
                };
                client.send_payment(req).await
            }
        };

        response.map_err(|err| map_node_error(err, deadline))
    };

    match tokio::time::timeout(deadline, call).await {
        Ok(result) => result,
        Err(_elapsed) => Err(Error::Timeout(deadline)),
    }
}

fn map_node_error(err: NodeError, deadline: Duration) -> Error {
    match err {
        NodeError::Transport(msg) => Error::Transport(msg),
        NodeError::Timeout => Error::Timeout(deadline),
        NodeError::Rejected(msg) => Error::NodeRejected(msg),
    }
}
