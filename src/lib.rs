//! JRPC - JSON-RPC 2.0 with client correlation and server batch aggregation
//!
//! This is the convenience crate that re-exports all JRPC sub-crates.
//! Use it if you want a single dependency that provides both client and
//! server functionality.
//!
//! # Architecture
//!
//! - **jrpc-core**: message types, codec, error handling, observability
//! - **jrpc-server**: dispatcher, batch aggregator and HTTP binding
//! - **jrpc-client**: call correlator and HTTP transport
//!
//! # Quick Start - Server
//!
//! ```rust,no_run
//! use jrpc::Server;
//! use jrpc::server::from_typed_fn;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let http = Server::builder()
//!         .bind_str("127.0.0.1:8080")?
//!         .handler("min", from_typed_fn(|numbers: Vec<i64>| async move {
//!             Ok(numbers.into_iter().min())
//!         }))
//!         .build_http()
//!         .await?;
//!
//!     http.run().await?;
//!     Ok(())
//! }
//! ```
//!
//! # Quick Start - Client
//!
//! ```rust,no_run
//! use jrpc::HttpClient;
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = HttpClient::connect("http://localhost:8080")?;
//!
//!     let min = client.remote_call("min", vec![json!(3), json!(4)])?;
//!     let floor = client.remote_call("floor", vec![json!(5.4)])?;
//!     client.send().await?;
//!
//!     println!("min = {}, floor = {}", min.await?, floor.await?);
//!     Ok(())
//! }
//! ```

pub use jrpc_client as client;
pub use jrpc_core as core;
pub use jrpc_server as server;

pub use jrpc_client::{HttpClient, RpcClient};
pub use jrpc_server::{HttpServer, Server};
