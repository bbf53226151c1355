//! Client correlator for JSON-RPC 2.0
//!
//! `RpcClient` turns calls into queued request messages and matches incoming
//! responses back to the callers waiting on them. It never touches a socket:
//! a transport drains the queue with [`RpcClient::pop_requests`], delivers the
//! payload however it likes, and feeds the reply to
//! [`RpcClient::process_response`].
//!
//! # Ordering
//!
//! Ids are issued from a counter starting at 1, in submission order, and the
//! outgoing queue keeps that order. Responses may come back in any order.
//!
//! # Cloning
//!
//! `RpcClient` is cheaply cloneable using `Arc` internally. All clones share the
//! same pending table, queue and id counter.
//!
//! # Examples
//!
//! ```rust
//! use jrpc_client::RpcClient;
//! use serde_json::json;
//!
//! # #[tokio::main]
//! # async fn main() -> jrpc_core::Result<()> {
//! let client = RpcClient::new();
//! let call = client.remote_call("min", vec![json!(2), json!(1)])?;
//!
//! let payload = client.pop_requests()?;
//! assert_eq!(payload, r#"{"jsonrpc":"2.0","method":"min","params":[2,1],"id":1}"#);
//!
//! client.process_response(r#"{"jsonrpc":"2.0","result":1,"id":1}"#);
//! assert_eq!(call.await?, json!(1));
//! # Ok(())
//! # }
//! ```

use crate::request::{PendingCall, ResponseFuture};
use crate::{ClientMetrics, Timeout};
use jrpc_core::{codec, Error, Id, JsonRpcErrorData, RequestMessage, Result, APPLICATION_ERROR};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;
use tokio::runtime::Handle;

/// Default message used by [`RpcClient::cancel`]
pub const CANCELLED_MESSAGE: &str = "cancelled";

struct ClientState {
    next_id: u64,
    pending: HashMap<Id, PendingCall>,
    outgoing: Vec<RequestMessage>,
    timeout: Timeout,
}

/// Transport-agnostic JSON-RPC client
#[derive(Clone)]
pub struct RpcClient {
    state: Arc<Mutex<ClientState>>,
    metrics: Option<Arc<ClientMetrics>>,
}

impl RpcClient {
    /// Create a client with the default 10 second call timeout
    pub fn new() -> Self {
        Self::with_timeout(Timeout::default())
    }

    /// Create a client with the given default call timeout
    pub fn with_timeout(timeout: impl Into<Timeout>) -> Self {
        Self {
            state: Arc::new(Mutex::new(ClientState {
                next_id: 1,
                pending: HashMap::new(),
                outgoing: Vec::new(),
                timeout: timeout.into(),
            })),
            metrics: None,
        }
    }

    pub(crate) fn with_metrics(mut self, metrics: Arc<ClientMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Submit a call using the default timeout
    ///
    /// The request is queued before this returns, so the next
    /// [`pop_requests`](Self::pop_requests) includes it.
    ///
    /// # Errors
    ///
    /// `Error::InvalidRequest` if `method` is empty; `Error::Internal` if a
    /// timeout applies but no Tokio runtime is available to run the timer.
    pub fn remote_call(
        &self,
        method: impl Into<String>,
        params: Vec<Value>,
    ) -> Result<ResponseFuture> {
        self.submit(method.into(), params, None)
    }

    /// Submit a call with its own timeout
    ///
    /// `Timeout::After(Duration::ZERO)` rejects the returned future at once with
    /// the timeout error; the request is still queued and its response, if any,
    /// is discarded.
    pub fn remote_call_with_timeout(
        &self,
        method: impl Into<String>,
        params: Vec<Value>,
        timeout: impl Into<Timeout>,
    ) -> Result<ResponseFuture> {
        self.submit(method.into(), params, Some(timeout.into()))
    }

    /// Queue a notification; no id is assigned and no response is expected
    pub fn notify(&self, method: impl Into<String>, params: Vec<Value>) -> Result<()> {
        let method = method.into();
        validate_method(&method)?;
        self.lock()
            .outgoing
            .push(RequestMessage::notification(method, params));
        Ok(())
    }

    fn submit(
        &self,
        method: String,
        params: Vec<Value>,
        timeout: Option<Timeout>,
    ) -> Result<ResponseFuture> {
        validate_method(&method)?;

        let mut state = self.lock();
        let timeout = timeout.unwrap_or(state.timeout);

        let expiry = match timeout {
            Timeout::After(delay) if !delay.is_zero() => {
                let handle = Handle::try_current().map_err(|_| {
                    Error::Internal("call timeouts require a Tokio runtime".to_string())
                })?;
                Some((delay, handle))
            }
            _ => None,
        };

        let id = Id::from(state.next_id);
        state.next_id += 1;
        state
            .outgoing
            .push(RequestMessage::new(method.clone(), params, id.clone()));

        let (mut call, rx) = PendingCall::new(method);

        if timeout.is_immediate() {
            tracing::debug!(id = %id, method = %call.method, "Call rejected on submission, zero timeout");
            call.settle(
                Err(JsonRpcErrorData::timeout().into()),
                "timeout",
                self.metrics.as_deref(),
            );
        } else {
            if let Some((delay, handle)) = expiry {
                call.timer = Some(handle.spawn(expire(
                    Arc::downgrade(&self.state),
                    self.metrics.clone(),
                    id.clone(),
                    delay,
                )));
            }
            tracing::debug!(id = %id, method = %call.method, ?timeout, "Call submitted");
            state.pending.insert(id.clone(), call);
        }

        Ok(ResponseFuture::new(id, rx))
    }

    /// Serialize and clear the outgoing queue
    ///
    /// One queued message is written as a bare object, any other count as an
    /// array in submission order. An empty queue yields `[]`.
    pub fn pop_requests(&self) -> Result<String> {
        let outgoing = std::mem::take(&mut self.lock().outgoing);

        if let Some(ref m) = self.metrics {
            m.record_batch(outgoing.len() as u64);
        }

        codec::encode_envelope(&outgoing)
    }

    /// Match a response payload against the pending calls
    ///
    /// Payloads that cannot be decoded are ignored, and so are invalid items and
    /// responses whose id is not pending. The affected calls keep waiting for
    /// their own timeout.
    pub fn process_response(&self, payload: &str) {
        let responses = match codec::decode_responses(payload) {
            Ok(responses) => responses,
            Err(e) => {
                tracing::debug!(error = %e, "Ignoring undecodable response payload");
                return;
            }
        };

        let mut state = self.lock();
        for response in responses {
            let Some(id) = response.id.clone() else {
                continue;
            };

            match state.pending.remove(&id) {
                Some(call) => {
                    let status = if response.is_success() { "success" } else { "error" };
                    tracing::debug!(id = %id, method = %call.method, status, "Call settled");
                    call.settle(response.into_result(), status, self.metrics.as_deref());
                }
                None => tracing::debug!(id = %id, "Discarding response for unknown call"),
            }
        }
    }

    /// Reject every pending call with `[-32500] cancelled` and clear the queue
    pub fn cancel(&self) {
        self.cancel_with(APPLICATION_ERROR, CANCELLED_MESSAGE);
    }

    /// Reject every pending call with the given error and clear the queue
    ///
    /// Pending table and queue are emptied under a single lock, so no call can
    /// slip in between.
    pub fn cancel_with(&self, code: i32, message: impl Into<String>) {
        let error = JsonRpcErrorData::new(code, message);

        let mut state = self.lock();
        let dropped = state.outgoing.len();
        state.outgoing.clear();

        let calls: Vec<PendingCall> = state.pending.drain().map(|(_, call)| call).collect();
        tracing::debug!(pending = calls.len(), queued = dropped, %error, "Cancelling calls");

        for call in calls {
            call.settle(
                Err(Error::JsonRpc(error.clone())),
                "cancelled",
                self.metrics.as_deref(),
            );
        }
    }

    /// Replace the default timeout, returning the previous one
    pub fn set_timeout(&self, timeout: impl Into<Timeout>) -> Timeout {
        std::mem::replace(&mut self.lock().timeout, timeout.into())
    }

    /// Current default timeout
    pub fn timeout(&self) -> Timeout {
        self.lock().timeout
    }

    /// Number of calls waiting for a response
    pub fn pending_count(&self) -> usize {
        self.lock().pending.len()
    }

    /// Number of messages queued for transmission
    pub fn outgoing_count(&self) -> usize {
        self.lock().outgoing.len()
    }

    fn lock(&self) -> MutexGuard<'_, ClientState> {
        lock_state(&self.state)
    }
}

impl Default for RpcClient {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RpcClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("RpcClient")
            .field("next_id", &state.next_id)
            .field("pending", &state.pending.len())
            .field("outgoing", &state.outgoing.len())
            .field("timeout", &state.timeout)
            .finish()
    }
}

fn lock_state(state: &Mutex<ClientState>) -> MutexGuard<'_, ClientState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn validate_method(method: &str) -> Result<()> {
    if method.is_empty() {
        return Err(Error::InvalidRequest(
            "method must be a non-empty string".to_string(),
        ));
    }
    Ok(())
}

/// Timer task: rejects the call if it is still pending after `delay`
async fn expire(
    state: Weak<Mutex<ClientState>>,
    metrics: Option<Arc<ClientMetrics>>,
    id: Id,
    delay: Duration,
) {
    tokio::time::sleep(delay).await;

    let Some(state) = state.upgrade() else {
        return;
    };

    let call = lock_state(&state).pending.remove(&id);
    if let Some(mut call) = call {
        // This task is the timer; detach instead of aborting ourselves.
        call.timer.take();
        tracing::debug!(id = %id, method = %call.method, "Call timed out");
        call.settle(
            Err(JsonRpcErrorData::timeout().into()),
            "timeout",
            metrics.as_deref(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jrpc_core::TRANSPORT_ERROR;
    use serde_json::json;

    fn expect_error(result: Result<Value>) -> JsonRpcErrorData {
        match result {
            Err(Error::JsonRpc(data)) => data,
            other => panic!("expected a JSON-RPC error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_ids_start_at_one_and_queue_in_order() {
        let client = RpcClient::new();
        let first = client.remote_call("min", vec![json!(1), json!(2)]).unwrap();
        let second = client.remote_call("min", vec![json!(2), json!(1)]).unwrap();

        assert_eq!(first.id(), &Id::from(1i64));
        assert_eq!(second.id(), &Id::from(2i64));

        let payload: Value = serde_json::from_str(&client.pop_requests().unwrap()).unwrap();
        let batch = payload.as_array().unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0]["id"], json!(1));
        assert_eq!(batch[1]["id"], json!(2));
        assert_eq!(client.outgoing_count(), 0);
        assert_eq!(client.pending_count(), 2);
    }

    #[tokio::test]
    async fn test_single_request_is_bare_object() {
        let client = RpcClient::new();
        let _call = client.remote_call("floor", vec![json!(3.7)]).unwrap();

        let payload: Value = serde_json::from_str(&client.pop_requests().unwrap()).unwrap();
        assert_eq!(
            payload,
            json!({"jsonrpc": "2.0", "method": "floor", "params": [3.7], "id": 1})
        );
    }

    #[test]
    fn test_empty_queue_pops_empty_array() {
        let client = RpcClient::with_timeout(Timeout::Never);
        assert_eq!(client.pop_requests().unwrap(), "[]");
    }

    #[tokio::test]
    async fn test_empty_method_is_rejected() {
        let client = RpcClient::new();
        let result = client.remote_call("", vec![]);
        assert!(matches!(result, Err(Error::InvalidRequest(_))));
        assert_eq!(client.outgoing_count(), 0);
        assert_eq!(client.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_process_response_resolves_result() {
        let client = RpcClient::new();
        let call = client.remote_call("min", vec![json!(3), json!(4)]).unwrap();

        client.process_response(r#"{"jsonrpc":"2.0","result":3,"id":1}"#);

        assert_eq!(call.await.unwrap(), json!(3));
        assert_eq!(client.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_integral_float_id_settles_call() {
        let client = RpcClient::new();
        let call = client.remote_call("floor", vec![json!(1.5)]).unwrap();

        client.process_response(r#"{"jsonrpc":"2.0","result":1,"id":1.0}"#);

        assert_eq!(call.await.unwrap(), json!(1));
        assert_eq!(client.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_process_response_rejects_with_error_object() {
        let client = RpcClient::new();
        let call = client.remote_call("throwError", vec![]).unwrap();

        client.process_response(
            r#"{"jsonrpc":"2.0","error":{"code":-32500,"message":"boom","data":{"k":1}},"id":1}"#,
        );

        let error = expect_error(call.await);
        assert_eq!(error.code, -32500);
        assert_eq!(error.message, "boom");
        assert_eq!(error.data, Some(json!({"k": 1})));
    }

    #[tokio::test]
    async fn test_batch_response_in_any_order() {
        let client = RpcClient::new();
        let first = client.remote_call("a", vec![]).unwrap();
        let second = client.remote_call("b", vec![]).unwrap();

        client.process_response(
            r#"[{"jsonrpc":"2.0","result":"b","id":2},{"jsonrpc":"2.0","result":"a","id":1}]"#,
        );

        assert_eq!(first.await.unwrap(), json!("a"));
        assert_eq!(second.await.unwrap(), json!("b"));
    }

    #[tokio::test]
    async fn test_unknown_ids_and_garbage_are_ignored() {
        let client = RpcClient::new();
        let _call = client.remote_call("min", vec![]).unwrap();

        client.process_response("not json");
        client.process_response(r#"{"jsonrpc":"2.0","result":1,"id":99}"#);
        client.process_response(r#"{"jsonrpc":"2.0","id":1}"#);
        client.process_response(r#"{"jsonrpc":"1.0","result":1,"id":1}"#);

        assert_eq!(client.pending_count(), 1);
    }

    #[tokio::test]
    async fn test_zero_timeout_rejects_immediately() {
        let client = RpcClient::new();
        let call = client
            .remote_call_with_timeout("min", vec![json!(1)], Duration::ZERO)
            .unwrap();

        assert_eq!(client.outgoing_count(), 1);
        assert_eq!(client.pending_count(), 0);

        let error = expect_error(call.await);
        assert_eq!(error.code, TRANSPORT_ERROR);
        assert_eq!(error.message, "timeout");

        // Late response finds nothing pending
        client.process_response(r#"{"jsonrpc":"2.0","result":1,"id":1}"#);
        assert_eq!(client.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_default_zero_timeout_applies_to_remote_call() {
        let client = RpcClient::new();
        let previous = client.set_timeout(Duration::ZERO);
        assert_eq!(previous, Timeout::default());

        let error = expect_error(client.remote_call("min", vec![]).unwrap().await);
        assert_eq!(error.code, TRANSPORT_ERROR);
    }

    #[tokio::test]
    async fn test_call_expires_after_timeout() {
        let client = RpcClient::new();
        let call = client
            .remote_call_with_timeout("slow", vec![], Duration::from_millis(20))
            .unwrap();

        let error = expect_error(call.await);
        assert_eq!(error, JsonRpcErrorData::timeout());
        assert_eq!(client.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_never_timeout_keeps_call_pending() {
        let client = RpcClient::with_timeout(Timeout::from_millis(-1));
        let call = client.remote_call("slow", vec![]).unwrap();

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(client.pending_count(), 1);

        client.process_response(r#"{"jsonrpc":"2.0","result":null,"id":1}"#);
        assert_eq!(call.await.unwrap(), Value::Null);
    }

    #[tokio::test]
    async fn test_cancel_rejects_everything_and_clears_queue() {
        let client = RpcClient::new();
        let first = client.remote_call("a", vec![]).unwrap();
        let second = client.remote_call("b", vec![]).unwrap();

        client.cancel();

        assert_eq!(client.pending_count(), 0);
        assert_eq!(client.outgoing_count(), 0);

        for call in [first, second] {
            let error = expect_error(call.await);
            assert_eq!(error.code, APPLICATION_ERROR);
            assert_eq!(error.message, "cancelled");
        }
    }

    #[tokio::test]
    async fn test_cancel_with_custom_error() {
        let client = RpcClient::new();
        let call = client.remote_call("a", vec![]).unwrap();

        client.cancel_with(-1, "shutting down");

        let error = expect_error(call.await);
        assert_eq!(error.code, -1);
        assert_eq!(error.message, "shutting down");
    }

    #[tokio::test]
    async fn test_dropped_future_stays_pending() {
        let client = RpcClient::new();
        drop(client.remote_call("a", vec![]).unwrap());
        assert_eq!(client.pending_count(), 1);

        client.process_response(r#"{"jsonrpc":"2.0","result":1,"id":1}"#);
        assert_eq!(client.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_notify_queues_without_id() {
        let client = RpcClient::new();
        client.notify("log", vec![json!("started")]).unwrap();

        assert_eq!(client.pending_count(), 0);
        assert_eq!(
            client.pop_requests().unwrap(),
            r#"{"jsonrpc":"2.0","method":"log","params":["started"]}"#
        );
    }

    #[test]
    fn test_timeout_call_outside_runtime_fails() {
        let client = RpcClient::new();
        let result = client.remote_call("a", vec![]);
        assert!(matches!(result, Err(Error::Internal(_))));
        assert_eq!(client.outgoing_count(), 0);
    }
}
