//! Core JSON-RPC 2.0 types and codec for jrpc
//!
//! This crate holds everything the client correlator and the server dispatcher
//! share:
//!
//! - **Types**: ids, params, request and response messages
//! - **Codec**: envelope encoding and per-item validation
//! - **Errors**: the standard and reserved error codes plus the crate-wide error type
//! - **Observability**: tracing subscriber and OpenTelemetry bootstrap
//!
//! Nothing here touches a socket. The `jrpc-client` and `jrpc-server` crates
//! move payloads as plain strings and leave transport to an adapter.
//!
//! # Example
//!
//! ```rust
//! use jrpc_core::{codec, Id, RequestItem, RequestMessage};
//! use serde_json::json;
//!
//! let request = RequestMessage::new("min", vec![json!(2), json!(1)], Id::from(1i64));
//! let payload = codec::encode_envelope(&[request]).unwrap();
//! assert_eq!(payload, r#"{"jsonrpc":"2.0","method":"min","params":[2,1],"id":1}"#);
//!
//! let items = codec::decode_requests(&payload).unwrap();
//! assert!(matches!(&items[0], RequestItem::Valid(req) if req.method == "min"));
//! ```

pub mod codec;
pub mod error;
pub mod observability;
pub mod types;

pub use codec::RequestItem;
pub use error::{
    Error, JsonRpcErrorData, Result, APPLICATION_ERROR, INTERNAL_ERROR, INVALID_PARAMS,
    INVALID_REQUEST, METHOD_NOT_FOUND, PARSE_ERROR, SYSTEM_ERROR, TRANSPORT_ERROR,
};
pub use observability::{init_observability, shutdown_observability, ObservabilityConfig};
pub use types::{Id, Outcome, Params, RequestMessage, ResponseMessage, JSONRPC_VERSION};

/// Media type for JSON-RPC payloads over HTTP
pub const CONTENT_TYPE: &str = "application/json-rpc";

/// Default client-side request timeout in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;
