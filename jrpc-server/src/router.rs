//! Handler registry for JSON-RPC methods
//!
//! The router is the dispatcher's environment: a map from method names to
//! handlers. It is cheaply cloneable (`Arc`-based), and replacing a server's
//! router with [`Server::set_environment`](crate::Server::set_environment)
//! only affects payloads processed afterwards.
//!
//! # Examples
//!
//! ```rust
//! use jrpc_server::{from_fn, RouterBuilder};
//! use serde_json::json;
//!
//! let router = RouterBuilder::new()
//!     .handler("ping", from_fn(|_| Ok(json!("pong"))))
//!     .handler("count", from_fn(|params| Ok(json!(params.len()))))
//!     .build();
//!
//! assert!(router.has_method("ping"));
//! ```

use crate::handler::Handler;
use std::collections::HashMap;
use std::sync::Arc;

/// Router for JSON-RPC methods
#[derive(Clone, Default)]
pub struct Router {
    handlers: Arc<HashMap<String, Arc<dyn Handler>>>,
}

impl Router {
    /// Create a new empty router
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for a method, replacing any previous one
    pub fn register(&mut self, method: impl Into<String>, handler: Box<dyn Handler>) {
        let handlers = Arc::make_mut(&mut self.handlers);
        handlers.insert(method.into(), Arc::from(handler));
    }

    /// Get a handler for a method
    pub fn get(&self, method: &str) -> Option<Arc<dyn Handler>> {
        self.handlers.get(method).cloned()
    }

    /// Check if a method is registered
    pub fn has_method(&self, method: &str) -> bool {
        self.handlers.contains_key(method)
    }

    /// Get all registered method names
    pub fn methods(&self) -> Vec<String> {
        self.handlers.keys().cloned().collect()
    }

    /// Number of registered methods
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// True when no method is registered
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut methods = self.methods();
        methods.sort();
        f.debug_struct("Router").field("methods", &methods).finish()
    }
}

/// Builder for constructing a router
#[derive(Default)]
pub struct RouterBuilder {
    router: Router,
}

impl RouterBuilder {
    /// Create a new router builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a handler for a method
    pub fn handler(mut self, method: impl Into<String>, handler: Box<dyn Handler>) -> Self {
        self.router.register(method, handler);
        self
    }

    /// Build the router
    pub fn build(self) -> Router {
        self.router
    }
}
