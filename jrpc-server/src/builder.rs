//! Server builder for constructing JSON-RPC servers
//!
//! The builder collects method handlers, the HTTP bind address, the request
//! body limit and observability settings. [`ServerBuilder::build`] yields a
//! transport-independent [`Server`]; [`ServerBuilder::build_http`] also binds
//! a listener and wraps the server in an [`HttpServer`].
//!
//! # Examples
//!
//! ```rust,no_run
//! use jrpc_server::{from_fn, Server};
//! use serde_json::json;
//!
//! # async fn example() -> jrpc_core::Result<()> {
//! let http = Server::builder()
//!     .bind_str("127.0.0.1:8080")?
//!     .handler("ping", from_fn(|_| Ok(json!("pong"))))
//!     .max_body_size(64 * 1024)
//!     .with_default_observability()
//!     .service_name("ping-server")
//!     .build_http()
//!     .await?;
//!
//! http.run().await?;
//! # Ok(())
//! # }
//! ```

use crate::{Handler, HttpServer, Router, Server, ServerMetrics, DEFAULT_MAX_BODY_SIZE};
use jrpc_core::{Error, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Builder for configuring and creating a server
pub struct ServerBuilder {
    addr: Option<SocketAddr>,
    router: Router,
    max_body_size: usize,
    observability_config: Option<jrpc_core::ObservabilityConfig>,
    service_name: Option<String>,
}

impl ServerBuilder {
    /// Create a new server builder
    pub fn new() -> Self {
        Self {
            addr: None,
            router: Router::new(),
            max_body_size: DEFAULT_MAX_BODY_SIZE,
            observability_config: None,
            service_name: None,
        }
    }

    /// Set the address the HTTP listener binds to
    pub fn bind(mut self, addr: SocketAddr) -> Self {
        self.addr = Some(addr);
        self
    }

    /// Set the bind address from a string
    pub fn bind_str(self, addr: &str) -> Result<Self> {
        let addr: SocketAddr = addr
            .parse()
            .map_err(|e| Error::InvalidRequest(format!("Invalid address: {}", e)))?;
        Ok(self.bind(addr))
    }

    /// Register a handler for a method
    pub fn handler(mut self, method: impl Into<String>, handler: Box<dyn Handler>) -> Self {
        self.router.register(method, handler);
        self
    }

    /// Use a prepared router, replacing handlers registered so far
    pub fn router(mut self, router: Router) -> Self {
        self.router = router;
        self
    }

    /// Largest accepted HTTP request body in bytes (1 MiB unless set)
    pub fn max_body_size(mut self, limit: usize) -> Self {
        self.max_body_size = limit;
        self
    }

    /// Enable OpenTelemetry observability with custom configuration
    pub fn with_observability(mut self, config: jrpc_core::ObservabilityConfig) -> Self {
        self.observability_config = Some(config);
        self
    }

    /// Enable OpenTelemetry observability with default configuration
    pub fn with_default_observability(mut self) -> Self {
        self.observability_config = Some(jrpc_core::ObservabilityConfig::default());
        self
    }

    /// Set service name for observability (used if observability is enabled)
    pub fn service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = Some(name.into());
        self
    }

    /// Build the dispatcher without binding anything
    pub fn build(self) -> Result<Server> {
        let (server, _) = self.into_parts()?;
        Ok(server)
    }

    /// Bind the listener and build an HTTP server
    pub async fn build_http(self) -> Result<HttpServer> {
        let addr = self
            .addr
            .ok_or_else(|| Error::InvalidRequest("No bind address specified".to_string()))?;
        let max_body_size = self.max_body_size;

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| Error::Io(e.to_string()))?;

        let (server, metrics) = self.into_parts()?;

        tracing::info!(addr = %addr, max_body_size, "Server listening");

        Ok(HttpServer::new(listener, server, max_body_size, metrics))
    }

    fn into_parts(self) -> Result<(Server, Option<Arc<ServerMetrics>>)> {
        let metrics = if let Some(mut config) = self.observability_config {
            if let Some(name) = self.service_name {
                config.service_name = name;
            }

            jrpc_core::init_observability(config.clone()).map_err(|e| {
                Error::Internal(format!("Failed to initialize observability: {}", e))
            })?;

            Some(Arc::new(ServerMetrics::new(config.service_name)))
        } else {
            None
        };

        let mut server = Server::new(self.router);
        if let Some(ref m) = metrics {
            server = server.with_metrics(m.clone());
        }

        Ok((server, metrics))
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::from_fn;
    use serde_json::json;

    #[test]
    fn test_builder_registers_handlers() {
        let server = ServerBuilder::new()
            .handler("test", from_fn(|_| Ok(json!({"status": "ok"}))))
            .build()
            .unwrap();

        assert!(server.environment().has_method("test"));
    }

    #[tokio::test]
    async fn test_build_http_requires_address() {
        let result = ServerBuilder::new().build_http().await;
        assert!(matches!(result, Err(Error::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_build_http_binds_ephemeral_port() {
        let addr: SocketAddr = "127.0.0.1:0".parse().unwrap();
        let http = ServerBuilder::new()
            .bind(addr)
            .handler("ping", from_fn(|_| Ok(json!("pong"))))
            .build_http()
            .await
            .unwrap();

        assert_ne!(http.local_addr().unwrap().port(), 0);
        assert!(http.server().environment().has_method("ping"));
    }

    #[test]
    fn test_router_replaces_handlers() {
        let router = crate::RouterBuilder::new()
            .handler("b", from_fn(|_| Ok(json!(2))))
            .build();

        let server = ServerBuilder::new()
            .handler("a", from_fn(|_| Ok(json!(1))))
            .router(router)
            .build()
            .unwrap();

        assert!(!server.environment().has_method("a"));
        assert!(server.environment().has_method("b"));
    }

    #[test]
    fn test_builder_bind_str_valid() {
        let builder = ServerBuilder::new().bind_str("127.0.0.1:8080").unwrap();
        assert_eq!(builder.addr, Some("127.0.0.1:8080".parse().unwrap()));
    }

    #[test]
    fn test_builder_bind_str_invalid() {
        let result = ServerBuilder::new().bind_str("invalid:address");
        assert!(result.is_err());
    }

    #[test]
    fn test_builder_default() {
        let builder = ServerBuilder::default()
            .with_default_observability()
            .service_name("calc");
        assert!(builder.addr.is_none());
        assert_eq!(builder.max_body_size, DEFAULT_MAX_BODY_SIZE);
        assert!(builder.observability_config.is_some());
        assert_eq!(builder.service_name.as_deref(), Some("calc"));
    }
}
