//! Shared test utilities: a call-counting stub node client

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use async_trait::async_trait;
use lnd_bridge::{
    AddInvoiceRequest, Bridge, BridgeConfig, DecodePayReqRequest, ListChannelsRequest, NodeClient,
    NodeError, RetryPolicy, SendPaymentRequest,
};
use serde_json::Value;

type Reply = Result<Value, NodeError>;

/// Stub node that replays queued responses and records every dispatch.
///
/// Tests assert on call counts to verify that invalid input never reaches
/// the node and that the retry policy is honored.
#[derive(Default)]
pub struct StubNode {
    replies: Mutex<HashMap<&'static str, VecDeque<Reply>>>,
    calls: Mutex<HashMap<&'static str, usize>>,
}

impl StubNode {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful raw response for an operation
    pub fn enqueue_ok(&self, op: &'static str, response: Value) {
        self.enqueue(op, Ok(response));
    }

    /// Queue a node error for an operation
    pub fn enqueue_err(&self, op: &'static str, err: NodeError) {
        self.enqueue(op, Err(err));
    }

    pub fn enqueue(&self, op: &'static str, reply: Reply) {
        self.replies
            .lock()
            .unwrap()
            .entry(op)
            .or_default()
            .push_back(reply);
    }

    /// Number of times an operation was dispatched
    #[must_use]
    pub fn calls(&self, op: &str) -> usize {
        self.calls.lock().unwrap().get(op).copied().unwrap_or(0)
    }

    /// Total dispatches across all operations
    #[must_use]
    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }

    fn take(&self, op: &'static str) -> Reply {
        *self.calls.lock().unwrap().entry(op).or_insert(0) += 1;
        self.replies
            .lock()
            .unwrap()
            .get_mut(op)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| panic!("no stub reply queued for {op}"))
    }
}

#[async_trait]
impl NodeClient for StubNode {
    async fn get_info(&self) -> Reply {
        self.take("get_info")
    }

    async fn wallet_balance(&self) -> Reply {
        self.take("wallet_balance")
    }

    async fn channel_balance(&self) -> Reply {
        self.take("channel_balance")
    }

    async fn list_channels(&self, _req: ListChannelsRequest) -> Reply {
        self.take("list_channels")
    }

    async fn decode_pay_req(&self, _req: DecodePayReqRequest) -> Reply {
        self.take("decode_pay_req")
    }

    async fn add_invoice(&self, _req: AddInvoiceRequest) -> Reply {
        self.take("add_invoice")
    }

    async fn send_payment(&self, _req: SendPaymentRequest) -> Reply {
        self.take("send_payment")
    }
}

/// Install a log subscriber once so `RUST_LOG=lnd_bridge=debug` surfaces
/// bridge traces from failing tests
fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// A bridge over the stub with retry delays shrunk so tests run fast
#[must_use]
pub fn test_bridge(stub: Arc<StubNode>) -> Bridge {
    init_tracing();
    let config = BridgeConfig {
        dispatch_timeout: Duration::from_secs(5),
        dedup_window: Duration::from_secs(60),
        retry: RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
        },
    };
    Bridge::with_config(stub, config).expect("builtin capability table must register")
}
