//! Correlation integration tests
//!
//! Responses are matched by id regardless of arrival order, timeouts and
//! cancellation settle each call exactly once.

use async_trait::async_trait;
use jrpc_client::{HttpClient, RpcClient, Timeout, Transport};
use jrpc_core::{Error, JsonRpcErrorData, Result};
use serde_json::{json, Value};
use std::time::Duration;

/// Echoes each request's params back as its result, in reverse order
struct ReversingTransport;

#[async_trait]
impl Transport for ReversingTransport {
    async fn send(&self, body: String) -> Result<Option<String>> {
        let payload: Value = serde_json::from_str(&body)?;
        let requests = match payload {
            Value::Array(items) => items,
            single => vec![single],
        };

        let replies: Vec<Value> = requests
            .iter()
            .rev()
            .filter(|req| req.get("id").is_some())
            .map(|req| json!({"jsonrpc": "2.0", "result": req["params"], "id": req["id"]}))
            .collect();

        Ok(Some(serde_json::to_string(&replies)?))
    }
}

fn expect_error(result: Result<Value>) -> JsonRpcErrorData {
    match result {
        Err(Error::JsonRpc(data)) => data,
        other => panic!("expected a JSON-RPC error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_reverse_order_replies_reach_the_right_callers() {
    let client = HttpClient::with_transport(RpcClient::new(), ReversingTransport);

    let calls: Vec<_> = (0..5)
        .map(|n| client.remote_call("echo", vec![json!(n)]).unwrap())
        .collect();
    client.send().await.unwrap();

    for (n, call) in calls.into_iter().enumerate() {
        assert_eq!(call.await.unwrap(), json!([n]));
    }
    assert_eq!(client.rpc().pending_count(), 0);
}

#[tokio::test]
async fn test_notifications_mixed_into_batch() {
    let client = HttpClient::with_transport(RpcClient::new(), ReversingTransport);

    let first = client.remote_call("echo", vec![json!("a")]).unwrap();
    client.notify("log", vec![json!("ignored")]).unwrap();
    let second = client.remote_call("echo", vec![json!("b")]).unwrap();
    client.send().await.unwrap();

    assert_eq!(first.await.unwrap(), json!(["a"]));
    assert_eq!(second.await.unwrap(), json!(["b"]));
}

#[tokio::test]
async fn test_zero_timeout_wins_over_response() {
    let client = HttpClient::with_transport(RpcClient::new(), ReversingTransport);
    let previous = client.set_timeout(Timeout::from_millis(0));
    assert_eq!(previous, Timeout::After(Duration::from_secs(10)));

    let call = client.remote_call("echo", vec![json!(1)]).unwrap();

    // Still transmitted; the reply is discarded
    client.send().await.unwrap();

    let error = expect_error(call.await);
    assert_eq!(error.code, -32300);
    assert_eq!(error.message, "timeout");
}

#[tokio::test]
async fn test_timeout_then_late_response() {
    let client = RpcClient::new();
    let call = client
        .remote_call_with_timeout("slow", vec![], Duration::from_millis(10))
        .unwrap();
    let payload = client.pop_requests().unwrap();

    let error = expect_error(call.await);
    assert_eq!(error, JsonRpcErrorData::timeout());

    let reply = ReversingTransport.send(payload).await.unwrap().unwrap();
    client.process_response(&reply);
    assert_eq!(client.pending_count(), 0);
}

#[tokio::test]
async fn test_cancel_settles_each_call_once() {
    let client = RpcClient::new();
    let calls: Vec<_> = (0..3)
        .map(|_| client.remote_call("never", vec![]).unwrap())
        .collect();
    let payload = client.pop_requests().unwrap();

    client.cancel();

    // A response arriving after the cancel has nothing to resolve
    let reply = ReversingTransport.send(payload).await.unwrap().unwrap();
    client.process_response(&reply);

    for call in calls {
        let error = expect_error(call.await);
        assert_eq!(error.code, -32500);
        assert_eq!(error.message, "cancelled");
    }
}

#[tokio::test]
async fn test_concurrent_submitters_get_unique_ids() {
    let client = RpcClient::with_timeout(Timeout::Never);

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let client = client.clone();
            tokio::spawn(async move {
                (0..25)
                    .map(|_| client.remote_call("m", vec![]).unwrap().id().clone())
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut ids = std::collections::HashSet::new();
    for task in tasks {
        for id in task.await.unwrap() {
            assert!(ids.insert(id));
        }
    }

    assert_eq!(ids.len(), 200);
    assert_eq!(client.pending_count(), 200);
}
