//! JSON-RPC 2.0 client with request correlation
//!
//! This crate issues JSON-RPC calls and matches the responses back to the
//! callers waiting on them. The correlator is transport-agnostic; an HTTP
//! binding is included.
//!
//! # Core Features
//!
//! - **Correlation**: ids assigned per call, responses matched in any order
//! - **Batching**: everything queued between two sends travels as one payload
//! - **Timeouts**: per-call expiry with a configurable default
//! - **Cancellation**: reject every outstanding call at once
//! - **HTTP Transport**: reqwest-based adapter, or bring your own [`Transport`]
//! - **Observability**: OpenTelemetry metrics and `tracing` spans
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use jrpc_client::HttpClient;
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = HttpClient::connect("http://localhost:8080/rpc")?;
//!
//!     let result = client.call("min", vec![json!(3), json!(4)]).await?;
//!     println!("Result: {}", result);
//!
//!     Ok(())
//! }
//! ```
//!
//! # Without a Transport
//!
//! ```rust
//! use jrpc_client::RpcClient;
//! use serde_json::json;
//!
//! # #[tokio::main]
//! # async fn main() -> jrpc_core::Result<()> {
//! let client = RpcClient::new();
//! let call = client.remote_call("floor", vec![json!(5.5)])?;
//!
//! let outgoing = client.pop_requests()?;
//! // ... deliver `outgoing` somehow, then:
//! client.process_response(r#"{"jsonrpc":"2.0","result":5,"id":1}"#);
//!
//! assert_eq!(call.await?, json!(5));
//! # let _ = outgoing;
//! # Ok(())
//! # }
//! ```

mod client;
mod client_builder;
mod http_client;
mod metrics;
mod request;
mod timeout;
mod transport;

pub use client::{RpcClient, CANCELLED_MESSAGE};
pub use client_builder::ClientBuilder;
pub use http_client::HttpClient;
pub use metrics::ClientMetrics;
pub use request::ResponseFuture;
pub use timeout::Timeout;
pub use transport::{HttpTransport, Transport};
