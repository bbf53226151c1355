//! Pending call tracking for the JSON-RPC client
//!
//! Every submitted call owns a oneshot channel. The sending half lives in the
//! client's pending table as a [`PendingCall`]; the receiving half is handed to the
//! caller wrapped in a [`ResponseFuture`].
//!
//! # Call Lifecycle
//!
//! 1. **Submit**: an id is assigned and the request is queued for transmission
//! 2. **Register**: a `PendingCall` is stored under that id, with an expiry timer
//!    when a timeout applies
//! 3. **Settle**: the first of response, timeout or cancel removes the entry,
//!    aborts the timer and sends the outcome through the channel
//!
//! Whatever settles the call first wins; the entry is gone afterwards, so a late
//! response finds nothing to resolve and is discarded.

use crate::ClientMetrics;
use jrpc_core::{Error, Id, Result};
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Instant;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// A call waiting for its response
pub(crate) struct PendingCall {
    pub(crate) method: String,
    started: Instant,
    tx: oneshot::Sender<Result<Value>>,
    pub(crate) timer: Option<JoinHandle<()>>,
}

impl PendingCall {
    pub(crate) fn new(method: String) -> (Self, oneshot::Receiver<Result<Value>>) {
        let (tx, rx) = oneshot::channel();
        let call = Self {
            method,
            started: Instant::now(),
            tx,
            timer: None,
        };
        (call, rx)
    }

    /// Deliver the outcome to the caller and stop the expiry timer
    pub(crate) fn settle(
        mut self,
        outcome: Result<Value>,
        status: &str,
        metrics: Option<&ClientMetrics>,
    ) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }

        if let Some(m) = metrics {
            m.record_call(&self.method, status, self.started.elapsed().as_secs_f64());
        }

        // The caller may have dropped its future
        let _ = self.tx.send(outcome);
    }
}

/// Future resolving to the outcome of one remote call
///
/// Resolves to the remote result, or to [`Error::JsonRpc`] carrying the remote
/// error object, the timeout error (-32300) or the cancellation error.
///
/// Dropping the future does not withdraw the call: the pending entry stays until
/// a response, timeout or cancel removes it.
#[must_use = "dropping a ResponseFuture discards the call's outcome"]
#[derive(Debug)]
pub struct ResponseFuture {
    id: Id,
    rx: oneshot::Receiver<Result<Value>>,
}

impl ResponseFuture {
    pub(crate) fn new(id: Id, rx: oneshot::Receiver<Result<Value>>) -> Self {
        Self { id, rx }
    }

    /// Id the call was submitted under
    pub fn id(&self) -> &Id {
        &self.id
    }
}

impl Future for ResponseFuture {
    type Output = Result<Value>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.rx).poll(cx) {
            Poll::Ready(Ok(outcome)) => Poll::Ready(outcome),
            Poll::Ready(Err(_)) => Poll::Ready(Err(Error::Internal(format!(
                "call {} was dropped before it settled",
                self.id
            )))),
            Poll::Pending => Poll::Pending,
        }
    }
}
