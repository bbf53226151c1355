//! Handler traits and types for JSON-RPC methods
//!
//! A handler receives the positional params of one request and produces its
//! result. Invocation itself is synchronous; the work happens in the returned
//! future, which the dispatcher spawns so that handlers of one batch run
//! concurrently.
//!
//! # Creating Handlers
//!
//! 1. **from_fn**: a plain closure; its result is wrapped in a ready future
//! 2. **from_async_fn**: an async closure working on raw JSON values
//! 3. **from_typed_fn**: an async closure whose params are deserialized from
//!    the positional list (a tuple works well) and whose result is serialized
//!
//! # Errors
//!
//! Whatever a handler returns as `Err` becomes an error response:
//!
//! - `Error::JsonRpc(data)` is sent as-is
//! - `Error::InvalidParams` becomes -32602
//! - anything else becomes an application error (-32500) carrying the error's
//!   display text as the message
//!
//! # Examples
//!
//! ```rust
//! use jrpc_server::{from_async_fn, from_fn, from_typed_fn};
//! use jrpc_core::Error;
//!
//! // Sync handler on raw values
//! let min = from_fn(|params| {
//!     params
//!         .iter()
//!         .filter_map(|v| v.as_i64())
//!         .min()
//!         .map(Into::into)
//!         .ok_or_else(|| Error::InvalidParams("expected numbers".into()))
//! });
//!
//! // Async handler
//! let echo = from_async_fn(|params| async move { Ok(serde_json::Value::Array(params)) });
//!
//! // Typed handler: params [a, b] become the tuple (a, b)
//! let add = from_typed_fn(|(a, b): (i64, i64)| async move { Ok(a + b) });
//! ```

use futures::future;
use jrpc_core::{Error, Result};
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Result type for handler functions
///
/// A pinned, boxed future resolving to the handler's outcome. `Send` so the
/// dispatcher can spawn it on the multi-threaded runtime.
pub type HandlerResult = Pin<Box<dyn Future<Output = Result<Value>> + Send>>;

/// Trait for JSON-RPC method handlers
///
/// You typically don't implement this trait directly; use [`from_fn`],
/// [`from_async_fn`] or [`from_typed_fn`].
pub trait Handler: Send + Sync {
    /// Start handling one request
    ///
    /// `params` is the request's positional list. A request whose params were a
    /// single object arrives as a one-element list; a request without params as
    /// an empty one.
    fn handle(&self, params: Vec<Value>) -> HandlerResult;
}

/// Wrapper that adapts a synchronous function into a Handler
pub struct SyncHandler<F>
where
    F: Fn(Vec<Value>) -> Result<Value> + Send + Sync,
{
    func: F,
}

impl<F> Handler for SyncHandler<F>
where
    F: Fn(Vec<Value>) -> Result<Value> + Send + Sync,
{
    fn handle(&self, params: Vec<Value>) -> HandlerResult {
        Box::pin(future::ready((self.func)(params)))
    }
}

/// Wrapper that adapts an async function into a Handler
pub struct AsyncHandler<F, Fut>
where
    F: Fn(Vec<Value>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Value>> + Send + 'static,
{
    func: F,
}

impl<F, Fut> Handler for AsyncHandler<F, Fut>
where
    F: Fn(Vec<Value>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Value>> + Send + 'static,
{
    fn handle(&self, params: Vec<Value>) -> HandlerResult {
        Box::pin((self.func)(params))
    }
}

/// Create a handler from a synchronous function on raw JSON values
///
/// The function runs at dispatch time, in request order.
pub fn from_fn<F>(func: F) -> Box<dyn Handler>
where
    F: Fn(Vec<Value>) -> Result<Value> + Send + Sync + 'static,
{
    Box::new(SyncHandler { func })
}

/// Create a handler from an async function on raw JSON values
pub fn from_async_fn<F, Fut>(func: F) -> Box<dyn Handler>
where
    F: Fn(Vec<Value>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value>> + Send + 'static,
{
    Box::new(AsyncHandler { func })
}

/// Create a handler from an async function with automatic type conversion
///
/// The positional params are deserialized from a JSON array into `P`, so a
/// tuple receives the arguments in order and a `Vec<T>` receives them all.
///
/// - If params can't be deserialized to `P`: `Error::InvalidParams`
/// - If the result can't be serialized to JSON: `Error::Serialization`
/// - Function errors are passed through unchanged
///
/// ```rust
/// use jrpc_server::from_typed_fn;
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct Point { x: f64, y: f64 }
///
/// // Called as {"method": "norm", "params": [{"x": 3, "y": 4}]}
/// let norm = from_typed_fn(|(p,): (Point,)| async move { Ok((p.x * p.x + p.y * p.y).sqrt()) });
/// ```
pub fn from_typed_fn<P, R, F, Fut>(func: F) -> Box<dyn Handler>
where
    P: serde::de::DeserializeOwned + Send + 'static,
    R: serde::Serialize + Send + 'static,
    F: Fn(P) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R>> + Send + 'static,
{
    let func = Arc::new(func);

    from_async_fn(move |params: Vec<Value>| {
        let func = Arc::clone(&func);
        async move {
            let params: P = serde_json::from_value(Value::Array(params))
                .map_err(|e| Error::InvalidParams(e.to_string()))?;

            let result = func(params).await?;

            serde_json::to_value(result).map_err(|e| Error::Serialization(e.to_string()))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use serde_json::json;

    #[derive(Deserialize)]
    struct AddParams {
        a: i32,
        b: i32,
    }

    #[derive(Serialize, Deserialize)]
    struct AddResult {
        sum: i32,
    }

    #[tokio::test]
    async fn test_sync_handler() {
        let handler = from_fn(|params| Ok(json!(params.len())));
        let result = handler.handle(vec![json!(1), json!(2)]).await.unwrap();
        assert_eq!(result, json!(2));
    }

    #[tokio::test]
    async fn test_async_handler() {
        let handler = from_async_fn(|params| async move { Ok(Value::Array(params)) });
        let result = handler.handle(vec![json!("x")]).await.unwrap();
        assert_eq!(result, json!(["x"]));
    }

    #[tokio::test]
    async fn test_typed_handler_tuple() {
        let handler = from_typed_fn(|(a, b): (i64, i64)| async move { Ok(a.min(b)) });
        let result = handler.handle(vec![json!(4), json!(3)]).await.unwrap();
        assert_eq!(result, json!(3));
    }

    #[tokio::test]
    async fn test_typed_handler_struct_argument() {
        let handler = from_typed_fn(|(params,): (AddParams,)| async move {
            Ok(AddResult {
                sum: params.a + params.b,
            })
        });

        let result = handler.handle(vec![json!({"a": 5, "b": 3})]).await.unwrap();

        let sum: AddResult = serde_json::from_value(result).unwrap();
        assert_eq!(sum.sum, 8);
    }

    #[tokio::test]
    async fn test_typed_handler_rejects_bad_params() {
        let handler = from_typed_fn(|(a, b): (i64, i64)| async move { Ok(a + b) });
        let result = handler.handle(vec![json!("one")]).await;
        assert!(matches!(result, Err(Error::InvalidParams(_))));
    }

    #[tokio::test]
    async fn test_sync_handler_runs_at_invocation() {
        let calls = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let counter = calls.clone();
        let handler = from_fn(move |_| {
            counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Ok(Value::Null)
        });

        let pending = handler.handle(vec![]);
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 1);
        pending.await.unwrap();
    }
}
