//! Batch response aggregation
//!
//! Handlers of one payload finish in whatever order they finish, but the reply
//! has to list responses in request order. A [`BatchAggregator`] is created per
//! payload from the ordered ids of its id-bearing requests, one slot per id.
//! Each response is stored in its slot as it arrives, and once every slot is
//! filled the reply is serialized and delivered through the paired
//! [`BatchOutput`], exactly once.
//!
//! - No ids at all (only notifications, or an empty batch): the output resolves
//!   at once to `None`
//! - One id: the reply is the bare response object
//! - Several ids: the reply is an array in request order
//!
//! Duplicate ids in one payload each get their own slot. The dispatcher knows
//! which request a response answers and stores it with
//! [`BatchAggregator::add_response_at`]; [`BatchAggregator::add_response`] only
//! has the id to go by and takes the first empty slot for it. Responses without
//! an id, with an id that is not part of the batch, or arriving after
//! finalization are dropped.
//!
//! # Examples
//!
//! ```rust
//! use jrpc_core::{Id, ResponseMessage};
//! use jrpc_server::BatchAggregator;
//! use serde_json::json;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let (aggregator, output) = BatchAggregator::new([Id::from(1i64), Id::from(2i64)]);
//!
//! aggregator.add_response(ResponseMessage::result(json!("b"), Id::from(2i64)));
//! aggregator.add_response(ResponseMessage::result(json!("a"), Id::from(1i64)));
//!
//! assert_eq!(
//!     output.await.as_deref(),
//!     Some(r#"[{"jsonrpc":"2.0","result":"a","id":1},{"jsonrpc":"2.0","result":"b","id":2}]"#)
//! );
//! # }
//! ```

use jrpc_core::{codec, Id, ResponseMessage};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Mutex, MutexGuard};
use std::task::{Context, Poll};
use tokio::sync::oneshot;

struct AggregatorState {
    ids: Vec<Id>,
    positions_of: HashMap<Id, Vec<usize>>,
    slots: Vec<Option<ResponseMessage>>,
    collected: usize,
    done: Option<oneshot::Sender<Option<String>>>,
}

/// Collects the responses of one batch and serializes them in request order
pub struct BatchAggregator {
    state: Mutex<AggregatorState>,
}

impl BatchAggregator {
    /// Create an aggregator expecting one response per id, in the given order
    ///
    /// Slot `n` belongs to the `n`-th id.
    pub fn new(ids: impl IntoIterator<Item = Id>) -> (Self, BatchOutput) {
        let ids: Vec<Id> = ids.into_iter().collect();
        let mut positions_of: HashMap<Id, Vec<usize>> = HashMap::new();
        for (position, id) in ids.iter().enumerate() {
            positions_of.entry(id.clone()).or_default().push(position);
        }

        let (tx, rx) = oneshot::channel();
        let done = if ids.is_empty() {
            let _ = tx.send(None);
            None
        } else {
            Some(tx)
        };

        let aggregator = Self {
            state: Mutex::new(AggregatorState {
                slots: vec![None; ids.len()],
                ids,
                positions_of,
                collected: 0,
                done,
            }),
        };

        (aggregator, BatchOutput { rx })
    }

    /// Store a response in the first empty slot registered for its id
    ///
    /// When one batch repeats an id, use [`add_response_at`](Self::add_response_at)
    /// to keep each response next to the request it answers.
    pub fn add_response(&self, response: ResponseMessage) {
        let Some(id) = response.id.clone() else {
            tracing::debug!("Dropping response without id");
            return;
        };

        let mut state = self.lock();
        let position = state
            .positions_of
            .get(&id)
            .and_then(|positions| positions.iter().copied().find(|&p| state.slots[p].is_none()));

        match position {
            Some(position) => state.fill(position, response),
            None => tracing::debug!(id = %id, "Dropping response with unexpected id"),
        }
    }

    /// Store a response in slot `position`
    ///
    /// The response is dropped if the slot is out of range, already filled, or
    /// registered for a different id.
    pub fn add_response_at(&self, position: usize, response: ResponseMessage) {
        let mut state = self.lock();

        let expected_id = state.ids.get(position);
        if expected_id.is_none() || expected_id != response.id.as_ref() {
            tracing::debug!(position, id = ?response.id, "Dropping response for unknown slot");
            return;
        }
        if state.slots[position].is_some() {
            tracing::debug!(position, "Dropping response for filled slot");
            return;
        }

        state.fill(position, response);
    }

    /// Number of responses the batch waits for
    pub fn expected(&self) -> usize {
        self.lock().slots.len()
    }

    /// Number of responses stored so far
    pub fn collected(&self) -> usize {
        self.lock().collected
    }

    /// True once the reply has been delivered
    pub fn is_done(&self) -> bool {
        self.lock().done.is_none()
    }

    fn lock(&self) -> MutexGuard<'_, AggregatorState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl AggregatorState {
    fn fill(&mut self, position: usize, response: ResponseMessage) {
        if self.done.is_none() {
            tracing::debug!(position, "Dropping response for finalized batch");
            return;
        }

        self.slots[position] = Some(response);
        self.collected += 1;

        if self.collected == self.slots.len() {
            let responses: Vec<ResponseMessage> =
                self.slots.iter_mut().filter_map(Option::take).collect();
            let reply = match codec::encode_envelope(&responses) {
                Ok(reply) => Some(reply),
                Err(e) => {
                    tracing::error!(error = %e, "Failed to serialize batch reply");
                    None
                }
            };

            if let Some(done) = self.done.take() {
                let _ = done.send(reply);
            }
        }
    }
}

/// Future resolving to the serialized reply of one payload
///
/// `None` means there is nothing to send back.
#[must_use = "the reply is only available by awaiting the output"]
#[derive(Debug)]
pub struct BatchOutput {
    rx: oneshot::Receiver<Option<String>>,
}

impl BatchOutput {
    /// An output that is already resolved
    pub fn ready(reply: Option<String>) -> Self {
        let (tx, rx) = oneshot::channel();
        let _ = tx.send(reply);
        Self { rx }
    }
}

impl Future for BatchOutput {
    type Output = Option<String>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|reply| reply.ok().flatten())
    }
}
