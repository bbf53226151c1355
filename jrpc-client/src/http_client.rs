//! Client pairing the correlator with a transport
//!
//! `HttpClient` owns an [`RpcClient`] and a [`Transport`]. Calls are queued on
//! the correlator; [`HttpClient::send`] ships everything queued so far as one
//! payload and feeds the reply back, which settles the matching futures.
//!
//! # Examples
//!
//! ```rust,no_run
//! use jrpc_client::HttpClient;
//! use serde_json::json;
//!
//! # async fn example() -> jrpc_core::Result<()> {
//! let client = HttpClient::connect("http://localhost:8080/rpc")?;
//!
//! // One call, one exchange
//! let low = client.call("min", vec![json!(3), json!(4)]).await?;
//!
//! // Several calls, one batch
//! let a = client.remote_call("min", vec![json!(2), json!(1)])?;
//! let b = client.remote_call("floor", vec![json!(5.9)])?;
//! client.send().await?;
//! assert_eq!(a.await?, json!(1));
//! assert_eq!(b.await?, json!(5));
//! # let _ = low;
//! # Ok(())
//! # }
//! ```

use crate::{ClientMetrics, HttpTransport, ResponseFuture, RpcClient, Timeout, Transport};
use jrpc_core::Result;
use serde_json::Value;
use std::sync::Arc;

/// JSON-RPC client over a request/reply transport
#[derive(Clone)]
pub struct HttpClient {
    rpc: RpcClient,
    transport: Arc<dyn Transport>,
    metrics: Option<Arc<ClientMetrics>>,
}

impl HttpClient {
    /// Create a client posting to `url` with default settings
    pub fn connect(url: impl Into<String>) -> Result<Self> {
        Ok(Self::with_transport(RpcClient::new(), HttpTransport::new(url)?))
    }

    /// Combine an existing correlator with any transport
    pub fn with_transport(rpc: RpcClient, transport: impl Transport + 'static) -> Self {
        Self {
            rpc,
            transport: Arc::new(transport),
            metrics: None,
        }
    }

    pub(crate) fn with_metrics(mut self, metrics: Arc<ClientMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Queue a call; it is transmitted by the next [`send`](Self::send)
    pub fn remote_call(
        &self,
        method: impl Into<String>,
        params: Vec<Value>,
    ) -> Result<ResponseFuture> {
        self.rpc.remote_call(method, params)
    }

    /// Queue a call with its own timeout
    pub fn remote_call_with_timeout(
        &self,
        method: impl Into<String>,
        params: Vec<Value>,
        timeout: impl Into<Timeout>,
    ) -> Result<ResponseFuture> {
        self.rpc.remote_call_with_timeout(method, params, timeout)
    }

    /// Queue a notification
    pub fn notify(&self, method: impl Into<String>, params: Vec<Value>) -> Result<()> {
        self.rpc.notify(method, params)
    }

    /// Replace the default call timeout, returning the previous one
    pub fn set_timeout(&self, timeout: impl Into<Timeout>) -> Timeout {
        self.rpc.set_timeout(timeout)
    }

    /// Transmit everything queued and process the reply
    ///
    /// Does nothing when the queue is empty. A transport failure is returned
    /// here; the calls it carried stay pending until their timeout or a cancel.
    pub async fn send(&self) -> Result<()> {
        if self.rpc.outgoing_count() == 0 {
            return Ok(());
        }

        let payload = self.rpc.pop_requests()?;

        match self.transport.send(payload).await {
            Ok(Some(reply)) => {
                self.rpc.process_response(&reply);
                Ok(())
            }
            Ok(None) => Ok(()),
            Err(e) => {
                if let Some(ref m) = self.metrics {
                    m.record_transport_error();
                }
                tracing::warn!(error = %e, "Failed to exchange payload");
                Err(e)
            }
        }
    }

    /// Submit one call, transmit it and wait for its outcome
    ///
    /// Anything else already queued travels in the same payload.
    #[tracing::instrument(skip(self, params), fields(method = %method.as_ref()))]
    pub async fn call(
        &self,
        method: impl Into<String> + AsRef<str>,
        params: Vec<Value>,
    ) -> Result<Value> {
        let future = self.rpc.remote_call(method, params)?;
        self.send().await?;
        future.await
    }

    /// Reject every pending call with the default cancellation error
    pub fn cancel(&self) {
        self.rpc.cancel();
    }

    /// The underlying correlator
    pub fn rpc(&self) -> &RpcClient {
        &self.rpc
    }
}
