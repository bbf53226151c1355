//! Error types for jrpc
//!
//! This module provides error handling for both ends of a JSON-RPC 2.0 exchange.
//! It defines two main error types:
//!
//! - **Error**: Application-level errors for internal use (uses thiserror)
//! - **JsonRpcErrorData**: Wire-format errors as they appear in a response's `error` member
//!
//! # Error Codes
//!
//! JSON-RPC 2.0 reserves the standard codes below; jrpc adds three
//! implementation-defined codes used by the client correlator and the dispatcher:
//! - `-32700`: Parse error (payload is not valid JSON)
//! - `-32600`: Invalid request (item does not match the request grammar)
//! - `-32601`: Method not found
//! - `-32602`: Invalid params
//! - `-32603`: Internal error
//! - `-32400`: System error
//! - `-32500`: Application error (a handler failed)
//! - `-32300`: Transport error (timeouts and transport failures)
//!
//! # Examples
//!
//! ```rust
//! use jrpc_core::{Error, JsonRpcErrorData};
//!
//! let error = Error::MethodNotFound("unknownMethod".into());
//! assert_eq!(error.code(), -32601);
//!
//! let json_error = JsonRpcErrorData::method_not_found("unknownMethod");
//! assert_eq!(json_error.code, -32601);
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Payload could not be parsed as JSON.
pub const PARSE_ERROR: i32 = -32700;
/// Item is not a valid request object.
pub const INVALID_REQUEST: i32 = -32600;
/// No handler is registered for the method.
pub const METHOD_NOT_FOUND: i32 = -32601;
/// Reserved for handler-side parameter validation.
pub const INVALID_PARAMS: i32 = -32602;
/// Reserved for internal failures.
pub const INTERNAL_ERROR: i32 = -32603;
/// Reserved for system-level failures.
pub const SYSTEM_ERROR: i32 = -32400;
/// Default code for a failed handler and for client-side cancellation.
pub const APPLICATION_ERROR: i32 = -32500;
/// Timeouts and transport failures.
pub const TRANSPORT_ERROR: i32 = -32300;

/// Result type for jrpc operations
///
/// Used throughout the jrpc crates for consistent error handling.
pub type Result<T> = std::result::Result<T, Error>;

/// Application-level error type for jrpc operations
///
/// # Error Categories
///
/// - **Wire errors**: JsonRpc (a structured error received from or destined for a peer)
/// - **Protocol errors**: InvalidRequest, MethodNotFound, InvalidParams
/// - **Transport errors**: Transport, Io
/// - **Processing errors**: Serialization, Internal, Application
///
/// Every variant maps onto a wire code through [`Error::code`], so an error raised
/// anywhere in the stack can be reported to a peer without losing its category.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// JSON-RPC protocol error (already in wire format)
    ///
    /// Client futures reject with this variant: remote failures, timeouts and
    /// cancellation all carry the structured error object.
    #[error("JSON-RPC error: {0}")]
    JsonRpc(#[from] JsonRpcErrorData),

    /// Serialization or deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Transport adapter failure
    ///
    /// Connection errors, unexpected HTTP status codes or content types.
    /// These never become JSON-RPC error objects on the wire.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Input/output error
    #[error("IO error: {0}")]
    Io(String),

    /// Invalid JSON-RPC request format
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Method not found in the handler registry
    #[error("Method not found: {0}")]
    MethodNotFound(String),

    /// Invalid method parameters
    ///
    /// Handlers return this when positional params do not match what they expect.
    /// The dispatcher preserves its `-32602` code instead of folding it into an
    /// application error.
    #[error("Invalid params: {0}")]
    InvalidParams(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// Handler failure with a free-form message
    ///
    /// The message is sent verbatim as the `message` of an application error.
    #[error("{0}")]
    Application(String),
}

impl Error {
    /// Wire code this error is reported with
    pub fn code(&self) -> i32 {
        match self {
            Error::JsonRpc(data) => data.code,
            Error::Serialization(_) | Error::Internal(_) => INTERNAL_ERROR,
            Error::Transport(_) | Error::Io(_) => TRANSPORT_ERROR,
            Error::InvalidRequest(_) => INVALID_REQUEST,
            Error::MethodNotFound(_) => METHOD_NOT_FOUND,
            Error::InvalidParams(_) => INVALID_PARAMS,
            Error::Application(_) => APPLICATION_ERROR,
        }
    }

    /// Structured error data, when the error came from (or is bound for) the wire
    pub fn as_error_data(&self) -> Option<&JsonRpcErrorData> {
        match self {
            Error::JsonRpc(data) => Some(data),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

/// JSON-RPC 2.0 error object
///
/// This structure is the exact wire format of the `error` member of a response.
///
/// # Examples
///
/// ```rust
/// use jrpc_core::JsonRpcErrorData;
/// use serde_json::json;
///
/// let error = JsonRpcErrorData::method_not_found("calculate");
/// assert_eq!(error.code, -32601);
///
/// let custom = JsonRpcErrorData::with_data(
///     1001,
///     "Insufficient funds",
///     json!({"balance": 50, "required": 100})
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcErrorData {
    /// Numeric error code indicating the error type
    pub code: i32,

    /// Human-readable error message
    pub message: String,

    /// Optional additional error information
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl JsonRpcErrorData {
    /// Create a new JSON-RPC error with code and message
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    /// Create a new JSON-RPC error with additional data
    pub fn with_data(code: i32, message: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            code,
            message: message.into(),
            data: Some(data),
        }
    }

    /// Create a parse error (-32700)
    ///
    /// Sent as the single, untagged response to a payload that is not valid JSON.
    /// The parser's own diagnostic is appended to the message.
    pub fn parse_error(detail: impl std::fmt::Display) -> Self {
        Self::new(PARSE_ERROR, format!("parse error: {}", detail))
    }

    /// Create an invalid request error (-32600)
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::new(INVALID_REQUEST, msg)
    }

    /// Create a method not found error (-32601)
    ///
    /// # Examples
    ///
    /// ```rust
    /// use jrpc_core::JsonRpcErrorData;
    ///
    /// let error = JsonRpcErrorData::method_not_found("calculateFoo");
    /// assert_eq!(error.message, "Method not found: calculateFoo");
    /// ```
    pub fn method_not_found(method: impl Into<String>) -> Self {
        Self::new(METHOD_NOT_FOUND, format!("Method not found: {}", method.into()))
    }

    /// Create an invalid params error (-32602)
    pub fn invalid_params(msg: impl Into<String>) -> Self {
        Self::new(INVALID_PARAMS, msg)
    }

    /// Create an internal error (-32603)
    pub fn internal_error(msg: impl Into<String>) -> Self {
        Self::new(INTERNAL_ERROR, msg)
    }

    /// Create a system error (-32400)
    pub fn system_error(msg: impl Into<String>) -> Self {
        Self::new(SYSTEM_ERROR, msg)
    }

    /// Create an application error (-32500)
    ///
    /// This is what a failing handler turns into at the dispatch boundary, and what
    /// pending client calls are rejected with on cancellation.
    pub fn application_error(msg: impl Into<String>) -> Self {
        Self::new(APPLICATION_ERROR, msg)
    }

    /// Create a transport error (-32300)
    ///
    /// Client calls that expire are rejected with `transport_error("timeout")`.
    /// Timeouts are client-local and never produce wire traffic.
    pub fn transport_error(msg: impl Into<String>) -> Self {
        Self::new(TRANSPORT_ERROR, msg)
    }

    /// The rejection used when a pending call's timer fires
    pub fn timeout() -> Self {
        Self::transport_error("timeout")
    }
}

impl std::fmt::Display for JsonRpcErrorData {
    /// Formats as "[code] message", e.g. "[-32601] Method not found: unknownMethod"
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for JsonRpcErrorData {}
