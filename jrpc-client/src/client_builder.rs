//! Client builder for configuring the endpoint, timeouts and observability
//!
//! # Examples
//!
//! ```rust,no_run
//! use jrpc_client::{ClientBuilder, Timeout};
//! use std::time::Duration;
//!
//! # fn example() -> jrpc_core::Result<()> {
//! let client = ClientBuilder::new("http://localhost:8080/rpc")
//!     .timeout(Duration::from_secs(2))
//!     .with_default_observability()
//!     .service_name("calculator-client")
//!     .build()?;
//!
//! // Calls that may wait forever
//! let patient = ClientBuilder::new("http://localhost:8080/rpc")
//!     .timeout(Timeout::Never)
//!     .build()?;
//! # Ok(())
//! # }
//! ```

use crate::{ClientMetrics, HttpClient, HttpTransport, RpcClient, Timeout};
use jrpc_core::{Error, Result};
use std::sync::Arc;
use std::time::Duration;

/// Builder for configuring and creating an [`HttpClient`]
pub struct ClientBuilder {
    url: String,
    timeout: Timeout,
    request_timeout: Option<Duration>,
    observability_config: Option<jrpc_core::ObservabilityConfig>,
    service_name: Option<String>,
}

impl ClientBuilder {
    /// Create a new client builder for the given endpoint
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout: Timeout::default(),
            request_timeout: None,
            observability_config: None,
            service_name: None,
        }
    }

    /// Default per-call timeout (10 seconds unless set)
    pub fn timeout(mut self, timeout: impl Into<Timeout>) -> Self {
        self.timeout = timeout.into();
        self
    }

    /// Limit for a single HTTP exchange, independent of call timeouts
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
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

    /// Build the client
    ///
    /// No connection is made until the first [`HttpClient::send`].
    pub fn build(self) -> Result<HttpClient> {
        let metrics = if let Some(mut config) = self.observability_config {
            if let Some(name) = self.service_name {
                config.service_name = name;
            }

            jrpc_core::init_observability(config.clone()).map_err(|e| {
                Error::Internal(format!("Failed to initialize observability: {}", e))
            })?;

            Some(Arc::new(ClientMetrics::new(config.service_name)))
        } else {
            None
        };

        let transport = match self.request_timeout {
            Some(limit) => HttpTransport::with_request_timeout(&self.url, limit)?,
            None => HttpTransport::new(&self.url)?,
        };

        let mut rpc = RpcClient::with_timeout(self.timeout);
        if let Some(ref m) = metrics {
            rpc = rpc.with_metrics(m.clone());
        }

        let mut client = HttpClient::with_transport(rpc, transport);
        if let Some(m) = metrics {
            client = client.with_metrics(m);
        }

        tracing::info!(url = %self.url, timeout = ?self.timeout, "Client ready");
        Ok(client)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_creation() {
        let builder = ClientBuilder::new("http://localhost:8080");
        assert_eq!(builder.url, "http://localhost:8080");
        assert_eq!(builder.timeout, Timeout::default());
        assert!(builder.request_timeout.is_none());
        assert!(builder.observability_config.is_none());
        assert!(builder.service_name.is_none());
    }

    #[test]
    fn test_builder_settings() {
        let builder = ClientBuilder::new("http://localhost:8080")
            .timeout(Duration::from_millis(500))
            .request_timeout(Duration::from_secs(5))
            .service_name("calc");

        assert_eq!(builder.timeout, Timeout::After(Duration::from_millis(500)));
        assert_eq!(builder.request_timeout, Some(Duration::from_secs(5)));
        assert_eq!(builder.service_name.as_deref(), Some("calc"));
    }

    #[test]
    fn test_build_applies_timeout() {
        let client = ClientBuilder::new("http://localhost:8080")
            .timeout(Timeout::Never)
            .build()
            .unwrap();

        assert_eq!(client.rpc().timeout(), Timeout::Never);
    }

    #[test]
    fn test_with_observability() {
        let builder = ClientBuilder::new("http://localhost:8080")
            .with_default_observability()
            .service_name("test-service");

        assert!(builder.observability_config.is_some());
        assert_eq!(builder.service_name.as_deref(), Some("test-service"));
    }
}
