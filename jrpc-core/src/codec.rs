//! Codec for JSON-RPC message envelopes
//!
//! A payload on the wire is either a single message object or an array of them
//! (a batch). This module converts between payload text and structured messages,
//! and validates each item against the JSON-RPC 2.0 grammar.
//!
//! # Envelopes
//!
//! - **Encode**: one message is written bare, any other count as an ordered array
//! - **Decode**: a payload that is not an array is treated as a batch of one
//!
//! # Validation
//!
//! Payload-level and item-level failures are kept apart:
//!
//! - Text that is not JSON fails the whole payload with a parse error (-32700)
//! - A request item that breaks the grammar becomes [`RequestItem::Invalid`],
//!   carrying its id when one can be read, so the rest of the batch proceeds
//! - A response item that breaks the grammar is dropped
//!
//! # Examples
//!
//! ```rust
//! use jrpc_core::codec::{self, RequestItem};
//!
//! let items = codec::decode_requests(r#"[
//!     {"jsonrpc":"2.0","method":"min","params":[3,4],"id":1},
//!     {"jsonrpc":"2.0","method":{},"id":2}
//! ]"#).unwrap();
//!
//! assert!(matches!(items[0], RequestItem::Valid(_)));
//! assert!(matches!(items[1], RequestItem::Invalid { .. }));
//! ```

use crate::error::{Error, JsonRpcErrorData, Result};
use crate::types::{Id, Outcome, Params, RequestMessage, ResponseMessage, JSONRPC_VERSION};
use serde::Serialize;
use serde_json::{Map, Value};

/// A request item from a decoded payload
#[derive(Debug, Clone, PartialEq)]
pub enum RequestItem {
    /// Item matches the request grammar
    Valid(RequestMessage),
    /// Item does not match the request grammar
    Invalid {
        /// Id read from the item, if it had a usable one
        id: Option<Id>,
        /// Why the item was rejected
        error: JsonRpcErrorData,
    },
}

impl RequestItem {
    /// The id a response to this item would be tagged with
    pub fn id(&self) -> Option<&Id> {
        match self {
            RequestItem::Valid(request) => request.id.as_ref(),
            RequestItem::Invalid { id, .. } => id.as_ref(),
        }
    }
}

/// Encode any serializable message to a JSON string
pub fn encode<T: Serialize + ?Sized>(msg: &T) -> Result<String> {
    serde_json::to_string(msg).map_err(|e| Error::Serialization(e.to_string()))
}

/// Encode messages as one envelope
///
/// Exactly one message is written as a bare object; zero or several as an array.
///
/// ```rust
/// use jrpc_core::{codec, Id, RequestMessage};
///
/// let one = vec![RequestMessage::new("ping", vec![], Id::from(1i64))];
/// assert!(codec::encode_envelope(&one).unwrap().starts_with('{'));
///
/// let two = vec![one[0].clone(), RequestMessage::new("ping", vec![], Id::from(2i64))];
/// assert!(codec::encode_envelope(&two).unwrap().starts_with('['));
/// ```
pub fn encode_envelope<T: Serialize>(messages: &[T]) -> Result<String> {
    match messages {
        [single] => encode(single),
        many => encode(many),
    }
}

/// Decode payload text into its list of raw items
///
/// # Errors
///
/// Returns `Error::JsonRpc` with a parse error (-32700) if the text is not JSON.
pub fn decode_envelope(data: &str) -> Result<Vec<Value>> {
    let value: Value = serde_json::from_str(data)
        .map_err(|e| Error::JsonRpc(JsonRpcErrorData::parse_error(e)))?;

    Ok(match value {
        Value::Array(items) => items,
        single => vec![single],
    })
}

/// Decode a request payload into validated items, in payload order
pub fn decode_requests(data: &str) -> Result<Vec<RequestItem>> {
    Ok(decode_envelope(data)?
        .into_iter()
        .map(validate_request)
        .collect())
}

/// Decode a response payload, keeping only items that match the response grammar
pub fn decode_responses(data: &str) -> Result<Vec<ResponseMessage>> {
    Ok(decode_envelope(data)?
        .into_iter()
        .filter_map(|value| {
            let response = validate_response(value);
            if response.is_none() {
                tracing::debug!("Skipping invalid response item");
            }
            response
        })
        .collect())
}

/// Read a usable id from a raw item
///
/// Anything other than a string or a number (including `null`) counts as no id.
pub fn item_id(value: &Value) -> Option<Id> {
    value.get("id").and_then(Id::from_value)
}

/// Validate one raw item against the request grammar
///
/// A valid request is an object with `"jsonrpc": "2.0"`, a non-empty string
/// `method`, optional `params` that are an array or an object, and an optional
/// `id` that is a string or a number. `null` params and a `null` id are read as
/// absent.
pub fn validate_request(value: Value) -> RequestItem {
    let id = item_id(&value);

    let obj = match value {
        Value::Object(obj) => obj,
        _ => {
            return RequestItem::Invalid {
                id,
                error: JsonRpcErrorData::invalid_request("invalid request: expected an object"),
            }
        }
    };

    match parse_request_object(obj) {
        Ok(request) => RequestItem::Valid(request),
        Err(reason) => RequestItem::Invalid {
            id,
            error: JsonRpcErrorData::invalid_request(format!("invalid request: {}", reason)),
        },
    }
}

fn parse_request_object(mut obj: Map<String, Value>) -> std::result::Result<RequestMessage, &'static str> {
    if !has_version(&obj) {
        return Err("jsonrpc must be \"2.0\"");
    }

    let method = match obj.remove("method") {
        Some(Value::String(method)) if !method.is_empty() => method,
        _ => return Err("method must be a non-empty string"),
    };

    let params = match obj.remove("params") {
        None | Some(Value::Null) => None,
        Some(Value::Array(list)) => Some(Params::Positional(list)),
        Some(value @ Value::Object(_)) => Some(Params::Singleton(value)),
        Some(_) => return Err("params must be an array or an object"),
    };

    let id = match obj.remove("id") {
        None | Some(Value::Null) => None,
        Some(value) => Some(Id::from_value(&value).ok_or("id must be a string or a number")?),
    };

    Ok(RequestMessage {
        jsonrpc: JSONRPC_VERSION.to_string(),
        method,
        params,
        id,
    })
}

/// Validate one raw item against the response grammar
///
/// A valid response is an object with `"jsonrpc": "2.0"`, exactly one of
/// `result` (any value, `null` included) or `error` (`{code, message, data?}`),
/// and an `id` that is a string or a number.
pub fn validate_response(value: Value) -> Option<ResponseMessage> {
    let mut obj = match value {
        Value::Object(obj) => obj,
        _ => return None,
    };

    if !has_version(&obj) {
        return None;
    }

    let id = obj.get("id").and_then(Id::from_value)?;

    let outcome = match (obj.remove("result"), obj.remove("error")) {
        (Some(result), None) => Outcome::Result(result),
        (None, Some(error)) => Outcome::Failure(serde_json::from_value(error).ok()?),
        _ => return None,
    };

    Some(ResponseMessage {
        outcome,
        id: Some(id),
    })
}

fn has_version(obj: &Map<String, Value>) -> bool {
    obj.get("jsonrpc").and_then(Value::as_str) == Some(JSONRPC_VERSION)
}
