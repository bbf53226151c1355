//! Server dispatcher for JSON-RPC payloads
//!
//! [`Server::process_request`] takes one serialized payload (a single request
//! or a batch) and produces the serialized reply, if any. It never touches a
//! socket; the HTTP binding and tests call it directly.
//!
//! # Processing
//!
//! 1. Text that is not JSON gets a single parse error response without an id,
//!    and nothing is dispatched
//! 2. The ids of all id-bearing items, in order, seed a [`BatchAggregator`]
//! 3. Each item is handled in request order:
//!    - malformed item: invalid request error, tagged with its id if readable
//!    - unknown method: method not found error
//!    - otherwise the handler is invoked right away and the future it returns
//!      is spawned, so handlers of one batch run concurrently
//! 4. The reply lists responses in request order, whatever order handlers
//!    finished in
//!
//! Notifications are dispatched like any other request; their outcome is
//! logged and dropped.

use crate::batch::{BatchAggregator, BatchOutput};
use crate::{Router, ServerMetrics};
use futures::FutureExt;
use jrpc_core::{codec, Error, Id, JsonRpcErrorData, RequestItem, ResponseMessage, Result};
use serde_json::Value;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, RwLock};
use std::time::Instant;
use tokio::runtime::Handle;

/// Transport-agnostic JSON-RPC server
///
/// Cheaply cloneable; clones share the handler registry.
///
/// # Examples
///
/// ```rust
/// use jrpc_server::{from_fn, RouterBuilder, Server};
/// use serde_json::json;
///
/// # #[tokio::main]
/// # async fn main() {
/// let server = Server::new(
///     RouterBuilder::new()
///         .handler("min", from_fn(|params| {
///             Ok(params.iter().filter_map(|v| v.as_i64()).min().into())
///         }))
///         .build(),
/// );
///
/// let reply = server
///     .process_request(r#"{"jsonrpc":"2.0","method":"min","params":[2,1],"id":1}"#)
///     .await;
/// assert_eq!(reply.as_deref(), Some(r#"{"jsonrpc":"2.0","result":1,"id":1}"#));
/// # }
/// ```
#[derive(Clone, Default)]
pub struct Server {
    router: Arc<RwLock<Router>>,
    metrics: Option<Arc<ServerMetrics>>,
}

impl Server {
    /// Create a server dispatching to `router`
    pub fn new(router: Router) -> Self {
        Self {
            router: Arc::new(RwLock::new(router)),
            metrics: None,
        }
    }

    /// Create a server builder
    pub fn builder() -> crate::ServerBuilder {
        crate::ServerBuilder::new()
    }

    pub(crate) fn with_metrics(mut self, metrics: Arc<ServerMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Replace the handler registry
    ///
    /// Payloads already being processed keep the registry they started with.
    pub fn set_environment(&self, router: Router) {
        let mut current = self
            .router
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        tracing::debug!(methods = router.len(), "Replacing handler registry");
        *current = router;
    }

    /// Snapshot of the current handler registry
    pub fn environment(&self) -> Router {
        self.router
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Process one payload and return a future resolving to the reply
    ///
    /// Handlers are invoked before this returns; the output only waits for
    /// their results. Resolves to `None` when nothing must be sent back
    /// (notifications only, or an empty batch).
    ///
    /// Handler futures are spawned on the current Tokio runtime. Outside a
    /// runtime a handler that has already finished when invoked (any
    /// [`from_fn`](crate::from_fn) handler) is still served; any other gets an
    /// application error response.
    pub fn process_request(&self, payload: &str) -> BatchOutput {
        let items = match codec::decode_requests(payload) {
            Ok(items) => items,
            Err(e) => {
                tracing::debug!(error = %e, "Rejecting undecodable payload");
                if let Some(ref m) = self.metrics {
                    m.record_payload("parse_error", 0);
                    m.record_error(e.code());
                }
                let error = match e {
                    Error::JsonRpc(data) => data,
                    other => JsonRpcErrorData::parse_error(other),
                };
                let reply = codec::encode(&ResponseMessage::failure(error, None)).ok();
                return BatchOutput::ready(reply);
            }
        };

        if let Some(ref m) = self.metrics {
            m.record_payload("decoded", items.len() as u64);
        }

        let ids: Vec<Id> = items.iter().filter_map(RequestItem::id).cloned().collect();
        tracing::debug!(items = items.len(), expected = ids.len(), "Dispatching payload");

        let (aggregator, output) = BatchAggregator::new(ids);
        let aggregator = Arc::new(aggregator);
        let router = self.environment();
        let runtime = Handle::try_current().ok();
        let mut next_position = 0;

        for item in items {
            // Slots follow the id-bearing items in request order
            let position = item.id().map(|_| {
                next_position += 1;
                next_position - 1
            });

            match item {
                RequestItem::Invalid { id, error } => {
                    tracing::debug!(id = ?id, %error, "Invalid request item");
                    self.reject(&aggregator, error, id, position);
                }
                RequestItem::Valid(request) => {
                    let Some(handler) = router.get(&request.method) else {
                        tracing::debug!(method = %request.method, "Method not found");
                        self.reject(
                            &aggregator,
                            JsonRpcErrorData::method_not_found(&request.method),
                            request.id,
                            position,
                        );
                        continue;
                    };

                    let params = request.positional_params();
                    let started = Instant::now();

                    // Sync handlers do their work here, so guard the call itself too
                    let pending = std::panic::catch_unwind(AssertUnwindSafe(|| {
                        handler.handle(params)
                    }));

                    let task = DispatchTask {
                        aggregator: Arc::clone(&aggregator),
                        metrics: self.metrics.clone(),
                        method: request.method,
                        id: request.id,
                        position,
                        started,
                    };

                    let future = match pending {
                        Ok(future) => AssertUnwindSafe(future).catch_unwind(),
                        Err(_) => {
                            task.complete(Err(handler_panicked()));
                            continue;
                        }
                    };

                    match runtime {
                        Some(ref handle) => {
                            handle.spawn(async move {
                                let outcome = future
                                    .await
                                    .unwrap_or_else(|_| Err(handler_panicked()));
                                task.complete(outcome);
                            });
                        }
                        // Without a runtime only an already finished handler can be served
                        None => {
                            let outcome = match future.now_or_never() {
                                Some(outcome) => {
                                    outcome.unwrap_or_else(|_| Err(handler_panicked()))
                                }
                                None => Err(Error::Application(
                                    "no Tokio runtime to run the handler on".to_string(),
                                )),
                            };
                            task.complete(outcome);
                        }
                    }
                }
            }
        }

        output
    }

    fn reject(
        &self,
        aggregator: &BatchAggregator,
        error: JsonRpcErrorData,
        id: Option<Id>,
        position: Option<usize>,
    ) {
        if let Some(ref m) = self.metrics {
            m.record_error(error.code);
        }
        if let Some(position) = position {
            aggregator.add_response_at(position, ResponseMessage::failure(error, id));
        }
    }
}

impl std::fmt::Debug for Server {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Server")
            .field("router", &self.environment())
            .finish()
    }
}

/// Everything needed to report one handler's outcome
struct DispatchTask {
    aggregator: Arc<BatchAggregator>,
    metrics: Option<Arc<ServerMetrics>>,
    method: String,
    id: Option<Id>,
    position: Option<usize>,
    started: Instant,
}

impl DispatchTask {
    fn complete(self, outcome: Result<Value>) {
        let status = if outcome.is_ok() { "success" } else { "error" };
        if let Some(ref m) = self.metrics {
            m.record_request(&self.method, status, self.started.elapsed().as_secs_f64());
        }

        let (Some(id), Some(position)) = (self.id, self.position) else {
            if let Err(e) = outcome {
                tracing::warn!(method = %self.method, error = %e, "Notification handler failed");
            }
            return;
        };

        let response = match outcome {
            Ok(value) => ResponseMessage::result(value, id),
            Err(e) => {
                let error = error_response_data(e);
                tracing::debug!(method = %self.method, id = %id, %error, "Handler failed");
                if let Some(ref m) = self.metrics {
                    m.record_error(error.code);
                }
                ResponseMessage::failure(error, Some(id))
            }
        };

        self.aggregator.add_response_at(position, response);
    }
}

/// Map a handler error to the error object sent to the caller
///
/// Structured JSON-RPC errors and invalid params keep their codes; anything
/// else is an application error carrying the error's text.
pub fn error_response_data(error: Error) -> JsonRpcErrorData {
    match error {
        Error::JsonRpc(data) => data,
        Error::InvalidParams(msg) => JsonRpcErrorData::invalid_params(msg),
        other => JsonRpcErrorData::application_error(other.to_string()),
    }
}

fn handler_panicked() -> Error {
    Error::Application("handler panicked".to_string())
}
