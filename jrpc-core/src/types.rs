//! JSON-RPC 2.0 message types
//!
//! This module implements the data structures exchanged between the client
//! correlator and the server dispatcher:
//!
//! - **Id**: correlates a request with its response
//! - **Params**: positional list or a single structured value
//! - **RequestMessage**: a call; without an id it is a notification
//! - **ResponseMessage**: the outcome of a call, either a result or a failure
//!
//! # Notifications
//!
//! A request without an `id` is a notification. The server still invokes its
//! handler but never produces a response for it, not even an error.
//!
//! # Params
//!
//! Only positional parameters are bound to handlers. A single structured value
//! (an object) is accepted on the wire and coerced into a one-element positional
//! list, so handlers always see an ordered list of arguments.

use crate::error::{Error, JsonRpcErrorData};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Protocol version carried by every message
pub const JSONRPC_VERSION: &str = "2.0";

/// JSON-RPC 2.0 request ID
///
/// An id is either a string or a number. Numbers keep their JSON representation,
/// so an id such as `1.5` echoes back unchanged.
///
/// `0` and `""` are ordinary ids. A `null` id is never constructed: on the wire it
/// is read as "no id", which makes the request a notification.
///
/// # Examples
///
/// ```rust
/// use jrpc_core::Id;
///
/// let id1: Id = "req-123".into();
/// let id2: Id = 42i64.into();
///
/// assert_eq!(id1.to_string(), "\"req-123\"");
/// assert_eq!(id2.to_string(), "42");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Id {
    /// String identifier
    String(String),
    /// Numeric identifier, kept exactly as it appeared on the wire
    Number(serde_json::Number),
}

impl Id {
    /// Read an id from a raw JSON value
    ///
    /// Returns `None` for anything that is not a string or a number, including `null`.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(Id::String(s.clone())),
            Value::Number(n) => Some(Id::Number(n.clone())),
            _ => None,
        }
    }
}

/// Comparison key: integral numbers compare equal however they were written,
/// so `1`, `1.0` and `1e0` name the same call.
#[derive(PartialEq, Eq, Hash)]
enum IdKey<'a> {
    String(&'a str),
    Integer(i128),
    Float(u64),
}

impl Id {
    fn key(&self) -> IdKey<'_> {
        match self {
            Id::String(s) => IdKey::String(s),
            Id::Number(n) => {
                if let Some(i) = n.as_i64() {
                    IdKey::Integer(i128::from(i))
                } else if let Some(u) = n.as_u64() {
                    IdKey::Integer(i128::from(u))
                } else {
                    let f = n.as_f64().unwrap_or(f64::NAN);
                    if f.fract() == 0.0 && f.abs() < 1.8e19 {
                        IdKey::Integer(f as i128)
                    } else {
                        IdKey::Float(f.to_bits())
                    }
                }
            }
        }
    }
}

impl PartialEq for Id {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Id {}

impl Hash for Id {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl fmt::Display for Id {
    /// Strings are quoted, numbers are displayed as-is
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Id::String(s) => write!(f, "\"{}\"", s),
            Id::Number(n) => write!(f, "{}", n),
        }
    }
}

impl From<String> for Id {
    fn from(s: String) -> Self {
        Id::String(s)
    }
}

impl From<&str> for Id {
    fn from(s: &str) -> Self {
        Id::String(s.to_string())
    }
}

impl From<i64> for Id {
    fn from(n: i64) -> Self {
        Id::Number(n.into())
    }
}

impl From<u64> for Id {
    fn from(n: u64) -> Self {
        Id::Number(n.into())
    }
}

/// Request parameters
///
/// The two shapes JSON-RPC allows are kept as explicit variants rather than being
/// told apart at dispatch time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Params {
    /// Ordered list of arguments
    Positional(Vec<Value>),
    /// A single structured value, bound as one positional argument
    Singleton(Value),
}

impl Params {
    /// Coerce into the positional list handed to a handler
    ///
    /// ```rust
    /// use jrpc_core::Params;
    /// use serde_json::json;
    ///
    /// let params = Params::Singleton(json!({"a": 1}));
    /// assert_eq!(params.into_positional(), vec![json!({"a": 1})]);
    /// ```
    pub fn into_positional(self) -> Vec<Value> {
        match self {
            Params::Positional(list) => list,
            Params::Singleton(value) => vec![value],
        }
    }
}

impl From<Vec<Value>> for Params {
    fn from(list: Vec<Value>) -> Self {
        Params::Positional(list)
    }
}

/// JSON-RPC 2.0 request message
///
/// A request with an `id` expects exactly one response carrying the same id.
/// Without an `id` it is a notification.
///
/// # Examples
///
/// ```rust
/// use jrpc_core::{Id, RequestMessage};
/// use serde_json::json;
///
/// let req = RequestMessage::new("min", vec![json!(2), json!(1)], Id::from(1i64));
/// assert!(!req.is_notification());
///
/// let notif = RequestMessage::notification("log", vec![json!("started")]);
/// assert!(notif.is_notification());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestMessage {
    /// JSON-RPC version - always "2.0"
    pub jsonrpc: String,
    /// Name of the remote method to invoke
    pub method: String,
    /// Parameters, skipped in JSON if None
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Params>,
    /// Correlation id; `None` marks a notification
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Id>,
}

impl RequestMessage {
    /// Create a request that expects a response
    pub fn new(method: impl Into<String>, params: Vec<Value>, id: Id) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: method.into(),
            params: Some(Params::Positional(params)),
            id: Some(id),
        }
    }

    /// Create a notification (no id, no response)
    pub fn notification(method: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: method.into(),
            params: Some(Params::Positional(params)),
            id: None,
        }
    }

    /// True when no response may be produced for this request
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }

    /// Positional arguments for the handler; absent params become an empty list
    pub fn positional_params(&self) -> Vec<Value> {
        self.params
            .clone()
            .map(Params::into_positional)
            .unwrap_or_default()
    }
}

/// Outcome carried by a response
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Successful result value (may be `null`)
    Result(Value),
    /// Structured failure
    Failure(JsonRpcErrorData),
}

/// JSON-RPC 2.0 response message
///
/// A response carries either a result or an error, never both. The `id` echoes
/// the request's id; it is absent only on the untagged parse-error response sent
/// when a payload could not be decoded at all.
///
/// # Examples
///
/// ```rust
/// use jrpc_core::{Id, JsonRpcErrorData, ResponseMessage};
/// use serde_json::json;
///
/// let ok = ResponseMessage::result(json!(1), Id::from(1i64));
/// assert!(ok.is_success());
/// assert_eq!(
///     serde_json::to_string(&ok).unwrap(),
///     r#"{"jsonrpc":"2.0","result":1,"id":1}"#
/// );
///
/// let err = ResponseMessage::failure(JsonRpcErrorData::method_not_found("x"), Some(Id::from(2i64)));
/// assert!(err.is_error());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseMessage {
    /// Result or failure
    pub outcome: Outcome,
    /// Id of the request this answers
    pub id: Option<Id>,
}

impl ResponseMessage {
    /// Create a successful response
    pub fn result(result: Value, id: Id) -> Self {
        Self {
            outcome: Outcome::Result(result),
            id: Some(id),
        }
    }

    /// Create an error response; `id` is `None` only when it could not be determined
    pub fn failure(error: JsonRpcErrorData, id: Option<Id>) -> Self {
        Self {
            outcome: Outcome::Failure(error),
            id,
        }
    }

    /// Check if the response represents a successful result
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, Outcome::Result(_))
    }

    /// Check if the response represents an error
    pub fn is_error(&self) -> bool {
        matches!(self.outcome, Outcome::Failure(_))
    }

    /// The error object, if this is a failure
    pub fn error(&self) -> Option<&JsonRpcErrorData> {
        match &self.outcome {
            Outcome::Failure(error) => Some(error),
            Outcome::Result(_) => None,
        }
    }

    /// Convert into the value a caller awaits
    pub fn into_result(self) -> crate::Result<Value> {
        match self.outcome {
            Outcome::Result(value) => Ok(value),
            Outcome::Failure(error) => Err(Error::JsonRpc(error)),
        }
    }
}

impl Serialize for ResponseMessage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = if self.id.is_some() { 3 } else { 2 };
        let mut state = serializer.serialize_struct("ResponseMessage", len)?;
        state.serialize_field("jsonrpc", JSONRPC_VERSION)?;
        match &self.outcome {
            Outcome::Result(value) => state.serialize_field("result", value)?,
            Outcome::Failure(error) => state.serialize_field("error", error)?,
        }
        match &self.id {
            Some(id) => state.serialize_field("id", id)?,
            None => state.skip_field("id")?,
        }
        state.end()
    }
}
