//! Response formatting
//!
//! Parses the node's raw JSON response into the typed record for a
//! capability, then flattens it into a stable payload the calling model can
//! read. Two LND REST wire conventions are normalized here: 64-bit integers
//! arrive as JSON strings (proto3 JSON mapping) and binary fields arrive
//! base64-encoded. Payloads carry plain integers and lowercase hex so
//! results are reproducible and safe to embed in text.
//!
//! A shape mismatch is a contract violation by the node-client
//! collaborator, not a user error, and maps to
//! [`Error::MalformedResponse`]. Formatting a well-formed response is pure
//! and idempotent.

use std::collections::BTreeMap;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::registry::{Capability, NodeOp};
use crate::{Error, Result};

/// Flatten a raw node response into the capability's payload shape.
///
/// # Errors
///
/// [`Error::MalformedResponse`] if the response does not match the
/// capability's expected shape; [`Error::NodeRejected`] if the node
/// reported a domain failure in-band (`payment_error` on send).
pub fn format(capability: &Capability, raw: &Value) -> Result<Value> {
    match capability.op {
        NodeOp::GetInfo => format_get_info(raw),
        NodeOp::WalletBalance => format_wallet_balance(raw),
        NodeOp::ChannelBalance => format_channel_balance(raw),
        NodeOp::ListChannels => format_list_channels(raw),
        NodeOp::DecodePayReq => format_decoded_invoice(raw),
        NodeOp::AddInvoice => format_added_invoice(raw),
        NodeOp::SendPayment => format_sent_payment(raw),
    }
}

fn parse<'de, T: Deserialize<'de>>(op: &str, raw: &'de Value) -> Result<T> {
    T::deserialize(raw).map_err(|e| Error::MalformedResponse(format!("{op}: {e}")))
}

/// Decode an LND base64 binary field and re-encode as lowercase hex
fn hex_from_base64(field: &str, value: &str) -> Result<String> {
    let bytes = BASE64
        .decode(value)
        .map_err(|e| Error::MalformedResponse(format!("{field}: invalid base64: {e}")))?;
    Ok(hex::encode(bytes))
}

// -- wire helpers -------------------------------------------------------------

/// Deserialize an integer that may arrive as a JSON number or, per the
/// proto3 JSON mapping LND uses for 64-bit fields, as a decimal string
fn flex_i64<'de, D>(deserializer: D) -> std::result::Result<i64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    struct FlexI64;

    impl serde::de::Visitor<'_> for FlexI64 {
        type Value = i64;

        fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str("an integer or a string-encoded integer")
        }

        fn visit_i64<E: serde::de::Error>(self, v: i64) -> std::result::Result<i64, E> {
            Ok(v)
        }

        fn visit_u64<E: serde::de::Error>(self, v: u64) -> std::result::Result<i64, E> {
            i64::try_from(v).map_err(E::custom)
        }

        fn visit_str<E: serde::de::Error>(self, v: &str) -> std::result::Result<i64, E> {
            v.parse().map_err(E::custom)
        }
    }

    deserializer.deserialize_any(FlexI64)
}

// -- get_info -----------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct GetInfoResponse {
    identity_pubkey: String,
    #[serde(default)]
    alias: String,
    #[serde(default)]
    version: String,
    #[serde(default, deserialize_with = "flex_i64")]
    block_height: i64,
    #[serde(default)]
    synced_to_chain: bool,
    #[serde(default, deserialize_with = "flex_i64")]
    num_active_channels: i64,
    #[serde(default, deserialize_with = "flex_i64")]
    num_peers: i64,
    #[serde(default)]
    chains: Vec<ChainInfo>,
}

#[derive(Debug, Deserialize)]
struct ChainInfo {
    #[serde(default)]
    chain: String,
    #[serde(default)]
    network: String,
}

fn format_get_info(raw: &Value) -> Result<Value> {
    let info: GetInfoResponse = parse("get_info", raw)?;

    let chains: Vec<Value> = info
        .chains
        .iter()
        .map(|c| json!({"chain": c.chain, "network": c.network}))
        .collect();

    Ok(json!({
        "alias": info.alias,
        "identityPubkey": info.identity_pubkey,
        "version": info.version,
        "blockHeight": info.block_height,
        "syncedToChain": info.synced_to_chain,
        "numActiveChannels": info.num_active_channels,
        "numPeers": info.num_peers,
        "chains": chains,
    }))
}

// -- wallet_balance -----------------------------------------------------------

#[derive(Debug, Deserialize)]
struct WalletBalanceResponse {
    #[serde(deserialize_with = "flex_i64")]
    total_balance: i64,
    #[serde(default, deserialize_with = "flex_i64")]
    confirmed_balance: i64,
    #[serde(default, deserialize_with = "flex_i64")]
    unconfirmed_balance: i64,
    /// Keyed by account name; `BTreeMap` gives a stable breakdown order
    #[serde(default)]
    account_balance: BTreeMap<String, AccountBalance>,
}

#[derive(Debug, Deserialize)]
struct AccountBalance {
    #[serde(default, deserialize_with = "flex_i64")]
    confirmed_balance: i64,
    #[serde(default, deserialize_with = "flex_i64")]
    unconfirmed_balance: i64,
}

fn format_wallet_balance(raw: &Value) -> Result<Value> {
    let balance: WalletBalanceResponse = parse("wallet_balance", raw)?;

    let accounts: Vec<Value> = balance
        .account_balance
        .iter()
        .map(|(name, acct)| {
            json!({
                "accountName": name,
                "confirmedSat": acct.confirmed_balance,
                "unconfirmedSat": acct.unconfirmed_balance,
            })
        })
        .collect();

    Ok(json!({
        "totalSat": balance.total_balance,
        "confirmedSat": balance.confirmed_balance,
        "unconfirmedSat": balance.unconfirmed_balance,
        "accounts": accounts,
    }))
}

// -- channel_balance ----------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
struct Amount {
    #[serde(default, deserialize_with = "flex_i64")]
    sat: i64,
}

#[derive(Debug, Deserialize)]
struct ChannelBalanceResponse {
    local_balance: Amount,
    remote_balance: Amount,
    #[serde(default)]
    pending_open_local_balance: Amount,
    #[serde(default)]
    pending_open_remote_balance: Amount,
}

fn format_channel_balance(raw: &Value) -> Result<Value> {
    let balance: ChannelBalanceResponse = parse("channel_balance", raw)?;

    Ok(json!({
        "localSat": balance.local_balance.sat,
        "remoteSat": balance.remote_balance.sat,
        "pendingOpenLocalSat": balance.pending_open_local_balance.sat,
        "pendingOpenRemoteSat": balance.pending_open_remote_balance.sat,
    }))
}

// -- list_channels ------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ListChannelsResponse {
    #[serde(default)]
    channels: Vec<ChannelInfo>,
}

#[derive(Debug, Deserialize)]
struct ChannelInfo {
    remote_pubkey: String,
    #[serde(default)]
    channel_point: String,
    #[serde(default, deserialize_with = "flex_i64")]
    capacity: i64,
    #[serde(default, deserialize_with = "flex_i64")]
    local_balance: i64,
    #[serde(default, deserialize_with = "flex_i64")]
    remote_balance: i64,
    #[serde(default)]
    active: bool,
    #[serde(default)]
    private: bool,
}

fn format_list_channels(raw: &Value) -> Result<Value> {
    let list: ListChannelsResponse = parse("list_channels", raw)?;

    let channels: Vec<Value> = list
        .channels
        .iter()
        .map(|ch| {
            json!({
                "remotePubkey": ch.remote_pubkey,
                "channelPoint": ch.channel_point,
                "capacitySat": ch.capacity,
                "localBalanceSat": ch.local_balance,
                "remoteBalanceSat": ch.remote_balance,
                "active": ch.active,
                "private": ch.private,
            })
        })
        .collect();

    Ok(json!({ "channels": channels }))
}

// -- decode_invoice -----------------------------------------------------------

#[derive(Debug, Deserialize)]
struct PayReqResponse {
    destination: String,
    /// Already hex on the wire for this call, unlike the binary hashes in
    /// add/send responses
    payment_hash: String,
    #[serde(default, deserialize_with = "flex_i64")]
    num_satoshis: i64,
    #[serde(default)]
    description: String,
    #[serde(default, deserialize_with = "flex_i64")]
    timestamp: i64,
    #[serde(default, deserialize_with = "flex_i64")]
    expiry: i64,
    #[serde(default)]
    route_hints: Vec<RouteHint>,
    #[serde(default)]
    features: BTreeMap<String, FeatureInfo>,
}

#[derive(Debug, Deserialize)]
struct RouteHint {
    #[serde(default)]
    hop_hints: Vec<HopHint>,
}

#[derive(Debug, Deserialize)]
struct HopHint {
    node_id: String,
    #[serde(default, deserialize_with = "flex_i64")]
    chan_id: i64,
    #[serde(default, deserialize_with = "flex_i64")]
    fee_base_msat: i64,
    #[serde(default, deserialize_with = "flex_i64")]
    fee_proportional_millionths: i64,
    #[serde(default, deserialize_with = "flex_i64")]
    cltv_expiry_delta: i64,
}

#[derive(Debug, Deserialize)]
struct FeatureInfo {
    #[serde(default)]
    name: String,
    #[serde(default)]
    is_required: bool,
    #[serde(default)]
    is_known: bool,
}

fn format_decoded_invoice(raw: &Value) -> Result<Value> {
    let payreq: PayReqResponse = parse("decode_invoice", raw)?;

    // Flatten nested hop hints into one ordered sequence
    let hints: Vec<Value> = payreq
        .route_hints
        .iter()
        .flat_map(|hint| &hint.hop_hints)
        .map(|hop| {
            json!({
                "hopPubkey": hop.node_id,
                "chanId": hop.chan_id,
                "feeBaseMsat": hop.fee_base_msat,
                "feeProportionalMillionths": hop.fee_proportional_millionths,
                "cltvExpiryDelta": hop.cltv_expiry_delta,
            })
        })
        .collect();

    // Feature map keys are decimal bit numbers; order numerically, not
    // lexically, so bit 9 precedes bit 10
    let mut features = Vec::with_capacity(payreq.features.len());
    for (bit, feature) in &payreq.features {
        let bit: u64 = bit.parse().map_err(|_| {
            Error::MalformedResponse(format!("decode_invoice: feature bit '{bit}' not numeric"))
        })?;
        features.push((bit, feature));
    }
    features.sort_by_key(|(bit, _)| *bit);
    let features: Vec<Value> = features
        .into_iter()
        .map(|(bit, f)| {
            json!({
                "bit": bit,
                "name": f.name,
                "isRequired": f.is_required,
                "isKnown": f.is_known,
            })
        })
        .collect();

    Ok(json!({
        "destination": payreq.destination,
        "paymentHash": payreq.payment_hash,
        "amountSat": payreq.num_satoshis,
        "description": payreq.description,
        "timestamp": payreq.timestamp,
        "expirySeconds": payreq.expiry,
        "routeHints": hints,
        "features": features,
    }))
}

// -- add_invoice --------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct AddInvoiceResponse {
    /// Payment hash, base64 on the wire
    r_hash: String,
    payment_request: String,
    #[serde(default, deserialize_with = "flex_i64")]
    add_index: i64,
}

fn format_added_invoice(raw: &Value) -> Result<Value> {
    let added: AddInvoiceResponse = parse("add_invoice", raw)?;

    Ok(json!({
        "paymentRequest": added.payment_request,
        "rHash": hex_from_base64("r_hash", &added.r_hash)?,
        "addIndex": added.add_index,
    }))
}

// -- send_payment -------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct SendResponse {
    /// Non-empty when the node rejected the payment at the domain level;
    /// LND reports this in-band with a 200 status
    #[serde(default)]
    payment_error: String,
    #[serde(default)]
    payment_preimage: String,
    #[serde(default)]
    payment_hash: String,
    payment_route: Option<Route>,
}

#[derive(Debug, Deserialize)]
struct Route {
    #[serde(default, deserialize_with = "flex_i64")]
    total_fees: i64,
    #[serde(default, deserialize_with = "flex_i64")]
    total_amt: i64,
    #[serde(default)]
    hops: Vec<Hop>,
}

#[derive(Debug, Deserialize)]
struct Hop {
    #[serde(default, deserialize_with = "flex_i64")]
    chan_id: i64,
    #[serde(default)]
    pub_key: String,
    #[serde(default, deserialize_with = "flex_i64")]
    amt_to_forward: i64,
    #[serde(default, deserialize_with = "flex_i64")]
    fee: i64,
}

fn format_sent_payment(raw: &Value) -> Result<Value> {
    let sent: SendResponse = parse("send_payment", raw)?;

    if !sent.payment_error.is_empty() {
        return Err(Error::NodeRejected(sent.payment_error));
    }

    let (fee_sat, total_amt_sat, hops) = match &sent.payment_route {
        Some(route) => {
            let hops: Vec<Value> = route
                .hops
                .iter()
                .map(|hop| {
                    json!({
                        "chanId": hop.chan_id,
                        "pubKey": hop.pub_key,
                        "amtToForwardSat": hop.amt_to_forward,
                        "feeSat": hop.fee,
                    })
                })
                .collect();
            (route.total_fees, route.total_amt, hops)
        }
        None => (0, 0, Vec::new()),
    };

    Ok(json!({
        "paymentPreimage": hex_from_base64("payment_preimage", &sent.payment_preimage)?,
        "paymentHash": hex_from_base64("payment_hash", &sent.payment_hash)?,
        "feeSat": fee_sat,
        "totalAmtSat": total_amt_sat,
        "hops": hops,
    }))
}
