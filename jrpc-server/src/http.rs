//! HTTP binding for the dispatcher
//!
//! Every POST body is one payload for [`Server::process_request`]:
//!
//! | Condition                                           | Status |
//! |-----------------------------------------------------|--------|
//! | reply produced                                      | 200 with `Content-Type: application/json-rpc` |
//! | nothing to reply (notifications, empty batch)       | 204    |
//! | `Content-Type` present but not `application/json-rpc` | 415  |
//! | body larger than the configured limit               | 413    |
//! | body not valid UTF-8 or unreadable                  | 400    |
//! | method other than POST                              | 405    |
//!
//! A request without a `Content-Type` header is accepted.

use crate::{Server, ServerMetrics};
use bytes::Bytes;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::Incoming;
use hyper::header::{HeaderValue, ALLOW, CONTENT_TYPE};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use jrpc_core::{Error, Result, CONTENT_TYPE as JSON_RPC};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Default request body limit (1 MiB)
pub const DEFAULT_MAX_BODY_SIZE: usize = 1024 * 1024;

/// JSON-RPC server listening for HTTP/1.1 requests
pub struct HttpServer {
    listener: TcpListener,
    server: Server,
    max_body_size: usize,
    metrics: Option<Arc<ServerMetrics>>,
}

impl HttpServer {
    pub(crate) fn new(
        listener: TcpListener,
        server: Server,
        max_body_size: usize,
        metrics: Option<Arc<ServerMetrics>>,
    ) -> Self {
        Self {
            listener,
            server,
            max_body_size,
            metrics,
        }
    }

    /// Bind `addr` and serve `server` with default settings
    pub async fn bind(addr: SocketAddr, server: Server) -> Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self::new(listener, server, DEFAULT_MAX_BODY_SIZE, None))
    }

    /// The dispatcher behind this listener
    pub fn server(&self) -> &Server {
        &self.server
    }

    /// Get the local address the server is bound to
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept connections until the listener fails
    ///
    /// Each connection is served in its own task.
    #[tracing::instrument(skip(self), name = "server.run")]
    pub async fn run(&self) -> Result<()> {
        tracing::info!(addr = ?self.local_addr().ok(), "Starting JSON-RPC HTTP server");

        loop {
            let (stream, peer) = self
                .listener
                .accept()
                .await
                .map_err(|e| Error::Io(e.to_string()))?;

            tracing::debug!(peer = %peer, "Connection accepted");

            let server = self.server.clone();
            let max_body_size = self.max_body_size;
            let metrics = self.metrics.clone();

            tokio::spawn(async move {
                let io = TokioIo::new(stream);
                let service = service_fn(move |req| {
                    let server = server.clone();
                    let metrics = metrics.clone();
                    async move {
                        let response = handle(server, max_body_size, req).await;
                        if let Some(ref m) = metrics {
                            m.record_http_response(response.status().as_u16());
                        }
                        Ok::<_, Infallible>(response)
                    }
                });

                if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                    if e.is_incomplete_message() {
                        tracing::debug!(peer = %peer, error = %e, "Client disconnected");
                    } else {
                        tracing::error!(peer = %peer, error = %e, "Error serving connection");
                    }
                }
            });
        }
    }
}

async fn handle(
    server: Server,
    max_body_size: usize,
    req: Request<Incoming>,
) -> Response<Full<Bytes>> {
    if req.method() != Method::POST {
        tracing::debug!(method = %req.method(), "Rejecting non-POST request");
        let mut response = status_only(StatusCode::METHOD_NOT_ALLOWED);
        response
            .headers_mut()
            .insert(ALLOW, HeaderValue::from_static("POST"));
        return response;
    }

    if let Some(content_type) = req.headers().get(CONTENT_TYPE) {
        let acceptable = content_type
            .to_str()
            .map(|ct| ct.contains(JSON_RPC))
            .unwrap_or(false);
        if !acceptable {
            tracing::debug!(content_type = ?content_type, "Unsupported content type");
            return status_only(StatusCode::UNSUPPORTED_MEDIA_TYPE);
        }
    }

    let body = match Limited::new(req.into_body(), max_body_size).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
            tracing::warn!(limit = max_body_size, "Request body too large");
            return status_only(StatusCode::PAYLOAD_TOO_LARGE);
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read request body");
            return status_only(StatusCode::BAD_REQUEST);
        }
    };

    let payload = match std::str::from_utf8(&body) {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!(error = %e, "Request body is not valid UTF-8");
            return status_only(StatusCode::BAD_REQUEST);
        }
    };

    match server.process_request(payload).await {
        Some(reply) => {
            let mut response = Response::new(Full::new(Bytes::from(reply)));
            response
                .headers_mut()
                .insert(CONTENT_TYPE, HeaderValue::from_static(JSON_RPC));
            response
        }
        None => status_only(StatusCode::NO_CONTENT),
    }
}

fn status_only(status: StatusCode) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::new()));
    *response.status_mut() = status;
    response
}
