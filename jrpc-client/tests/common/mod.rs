//! Common test utilities for jrpc-client integration tests
//!
//! A small hyper server with scripted replies, so the client can be tested
//! against exact status codes and headers without a full jrpc-server.

#![allow(dead_code)]

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{HeaderMap, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

/// What the mock server answers with
#[derive(Debug, Clone)]
pub struct MockReply {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: String,
}

impl MockReply {
    /// 200 with a JSON-RPC payload
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            content_type: Some("application/json-rpc".to_string()),
            body: body.into(),
        }
    }

    /// 204 with no body
    pub fn no_content() -> Self {
        Self {
            status: 204,
            content_type: None,
            body: String::new(),
        }
    }

    /// Arbitrary status with a plain-text body
    pub fn status(status: u16) -> Self {
        Self {
            status,
            content_type: Some("text/plain".to_string()),
            body: "nope".to_string(),
        }
    }

    pub fn with_content_type(mut self, content_type: &str) -> Self {
        self.content_type = Some(content_type.to_string());
        self
    }
}

/// A request captured by the mock server
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub method: String,
    pub headers: HeaderMap,
    pub body: String,
}

impl CapturedRequest {
    /// Value of a header, matched case-insensitively
    pub fn header(&self, name: &str) -> Option<String> {
        self.headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
    }

    pub fn method(&self) -> &str {
        &self.method
    }
}

/// Mock HTTP server for client testing
pub struct MockHttpServer {
    addr: SocketAddr,
    requests: mpsc::UnboundedReceiver<CapturedRequest>,
}

impl MockHttpServer {
    /// Start a server answering every request with the handler's reply
    pub async fn with_handler<F>(handler: F) -> Self
    where
        F: Fn(&str) -> MockReply + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = mpsc::unbounded_channel();
        let handler = Arc::new(handler);

        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let handler = handler.clone();
                let tx = tx.clone();
                tokio::spawn(async move {
                    let service = service_fn(move |req| {
                        let handler = handler.clone();
                        let tx = tx.clone();
                        async move { Ok::<_, Infallible>(respond(req, &*handler, &tx).await) }
                    });

                    let _ = http1::Builder::new()
                        .serve_connection(TokioIo::new(stream), service)
                        .await;
                });
            }
        });

        Self { addr, requests: rx }
    }

    /// Start a server giving the same reply to everything
    pub async fn replying(reply: MockReply) -> Self {
        Self::with_handler(move |_| reply.clone()).await
    }

    pub fn url(&self) -> String {
        format!("http://{}/rpc", self.addr)
    }

    /// Next request the server has seen
    pub async fn next_request(&mut self) -> Option<CapturedRequest> {
        tokio::time::timeout(std::time::Duration::from_secs(5), self.requests.recv())
            .await
            .ok()
            .flatten()
    }
}

async fn respond<F>(
    req: Request<Incoming>,
    handler: &F,
    requests: &mpsc::UnboundedSender<CapturedRequest>,
) -> Response<Full<Bytes>>
where
    F: Fn(&str) -> MockReply,
{
    let (parts, body) = req.into_parts();
    let body = body
        .collect()
        .await
        .map(|collected| collected.to_bytes())
        .unwrap_or_default();
    let body = String::from_utf8_lossy(&body).into_owned();

    let reply = handler(&body);
    let _ = requests.send(CapturedRequest {
        method: parts.method.to_string(),
        headers: parts.headers,
        body,
    });

    let mut response = Response::new(Full::new(Bytes::from(reply.body)));
    *response.status_mut() =
        StatusCode::from_u16(reply.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    if let Some(value) = reply
        .content_type
        .and_then(|content_type| HeaderValue::from_str(&content_type).ok())
    {
        response.headers_mut().insert(CONTENT_TYPE, value);
    }
    response
}

/// Helper to create a JSON-RPC result response
pub fn mock_response(id: i64, result: serde_json::Value) -> String {
    serde_json::json!({
        "jsonrpc": "2.0",
        "result": result,
        "id": id
    })
    .to_string()
}

/// Helper to create a JSON-RPC error response
pub fn mock_error_response(id: i64, code: i32, message: &str) -> String {
    serde_json::json!({
        "jsonrpc": "2.0",
        "error": {
            "code": code,
            "message": message
        },
        "id": id
    })
    .to_string()
}
