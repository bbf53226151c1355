//! Transport adapters for the client
//!
//! A transport carries one serialized payload to the peer and hands back the
//! serialized reply, if the peer sent one. The correlator does not care how.

use async_trait::async_trait;
use jrpc_core::{Error, Result, CONTENT_TYPE};
use reqwest::{header, Method, StatusCode};
use std::time::Duration;

/// One request/reply exchange with a JSON-RPC peer
#[async_trait]
pub trait Transport: Send + Sync {
    /// Deliver `body` and return the reply payload, or `None` when the peer had
    /// nothing to say (for example a batch of notifications)
    async fn send(&self, body: String) -> Result<Option<String>>;
}

/// HTTP transport built on reqwest
///
/// Each exchange is one request with `Content-Type: application/json-rpc`.
/// The reply is accepted when the status is 200 (payload in the body) or
/// 204 (no payload), and when its content type, if any, is
/// `application/json-rpc`. Everything else is an `Error::Transport`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    url: String,
    method: Method,
}

impl HttpTransport {
    /// Create a transport posting to `url`
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| Error::Transport(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self::with_client(client, url))
    }

    /// Create a transport on a preconfigured reqwest client
    pub fn with_client(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
            method: Method::POST,
        }
    }

    /// Create a transport whose HTTP requests give up after `timeout`
    pub fn with_request_timeout(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Transport(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self::with_client(client, url))
    }

    /// Use a different HTTP method than POST
    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Endpoint URL
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Transport for HttpTransport {
    #[tracing::instrument(skip(self, body), fields(url = %self.url, bytes = body.len()))]
    async fn send(&self, body: String) -> Result<Option<String>> {
        let response = self
            .client
            .request(self.method.clone(), &self.url)
            .header(header::CONTENT_TYPE, CONTENT_TYPE)
            .body(body)
            .send()
            .await
            .map_err(|e| Error::Transport(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        if status != StatusCode::OK && status != StatusCode::NO_CONTENT {
            return Err(Error::Transport(format!(
                "server responded with {} status code",
                status.as_u16()
            )));
        }

        if let Some(content_type) = response.headers().get(header::CONTENT_TYPE) {
            let content_type = content_type.to_str().unwrap_or_default();
            if !content_type.contains(CONTENT_TYPE) {
                return Err(Error::Transport(format!(
                    "server responded with unexpected content-type: {}",
                    content_type
                )));
            }
        }

        if status == StatusCode::NO_CONTENT {
            tracing::debug!("Server sent no payload");
            return Ok(None);
        }

        let text = response
            .text()
            .await
            .map_err(|e| Error::Transport(format!("Failed to read response body: {}", e)))?;

        tracing::debug!(bytes = text.len(), "Received response payload");
        Ok((!text.is_empty()).then_some(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_post() {
        let transport = HttpTransport::new("http://127.0.0.1:8080/rpc").unwrap();
        assert_eq!(transport.url(), "http://127.0.0.1:8080/rpc");
        assert_eq!(transport.method, Method::POST);

        let transport = transport.with_method(Method::PUT);
        assert_eq!(transport.method, Method::PUT);
    }

    #[tokio::test]
    async fn test_connection_failure_is_transport_error() {
        // Port 9 (discard) on localhost is closed in test environments
        let transport =
            HttpTransport::with_request_timeout("http://127.0.0.1:9/", Duration::from_secs(2))
                .unwrap();
        let result = transport.send("[]".to_string()).await;
        assert!(matches!(result, Err(Error::Transport(_))));
    }
}
