//! JSON-RPC 2.0 server with batch aggregation
//!
//! This crate dispatches JSON-RPC payloads to registered handlers and builds
//! the reply. Handlers of one batch run concurrently; the reply always lists
//! responses in request order. An HTTP/1.1 binding built on hyper is included.
//!
//! # Core Features
//!
//! - **Method Routing**: register sync, async or typed handlers by name
//! - **Batch Aggregation**: one reply per payload, in request order
//! - **Notifications**: dispatched, never answered
//! - **HTTP Binding**: POST endpoint with content-type and body-size checks
//! - **Observability**: OpenTelemetry metrics and `tracing` spans
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use jrpc_server::{from_typed_fn, Server};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let http = Server::builder()
//!         .bind_str("127.0.0.1:8080")?
//!         .handler("min", from_typed_fn(|(a, b): (i64, i64)| async move {
//!             Ok(a.min(b))
//!         }))
//!         .build_http()
//!         .await?;
//!
//!     http.run().await?;
//!     Ok(())
//! }
//! ```
//!
//! # Without HTTP
//!
//! ```rust
//! use jrpc_server::{from_fn, Server};
//! use serde_json::json;
//!
//! # #[tokio::main]
//! # async fn main() -> jrpc_core::Result<()> {
//! let server = Server::builder()
//!     .handler("echo", from_fn(|params| Ok(json!(params))))
//!     .build()?;
//!
//! let reply = server
//!     .process_request(r#"{"jsonrpc":"2.0","method":"echo","params":[1],"id":"a"}"#)
//!     .await;
//! assert_eq!(reply.as_deref(), Some(r#"{"jsonrpc":"2.0","result":[1],"id":"a"}"#));
//! # Ok(())
//! # }
//! ```

mod batch;
mod builder;
mod dispatcher;
mod handler;
mod http;
mod metrics;
mod router;

pub use batch::{BatchAggregator, BatchOutput};
pub use builder::ServerBuilder;
pub use dispatcher::{error_response_data, Server};
pub use handler::{
    from_async_fn, from_fn, from_typed_fn, AsyncHandler, Handler, HandlerResult, SyncHandler,
};
pub use http::{HttpServer, DEFAULT_MAX_BODY_SIZE};
pub use metrics::ServerMetrics;
pub use router::{Router, RouterBuilder};
