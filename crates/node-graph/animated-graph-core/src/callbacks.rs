//! Boxed host callbacks: driver completion and value listeners.
//!
//! Both are `Send` so commands carrying them can be produced on another thread and
//! marshaled onto the engine's context.

use crate::types::{AnimationId, NodeTag};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome delivered to a driver's completion callback.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EndResult {
    /// `true` when the driver ran to completion, `false` when it was cancelled.
    pub finished: bool,
    /// Observable value of the target node when the driver ended.
    pub value: f64,
}

/// Completion callback invoked exactly once per driver lifecycle.
pub struct Completion(Box<dyn FnOnce(EndResult) + Send>);

impl Completion {
    pub fn new(f: impl FnOnce(EndResult) + Send + 'static) -> Self {
        Completion(Box::new(f))
    }

    pub(crate) fn invoke(self, result: EndResult) {
        (self.0)(result);
    }
}

impl fmt::Debug for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Completion(..)")
    }
}

/// Listener called with a value node's raw value after each pass that updated it.
pub struct ValueListener(Box<dyn FnMut(f64) + Send>);

impl ValueListener {
    pub fn new(f: impl FnMut(f64) + Send + 'static) -> Self {
        ValueListener(Box::new(f))
    }

    pub(crate) fn call(&mut self, value: f64) {
        (self.0)(value)
    }
}

impl fmt::Debug for ValueListener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ValueListener(..)")
    }
}

/// Record queued when a driver started without a completion callback ends.
///
/// Drained with [`NodesManager::drain_ended_drivers`](crate::NodesManager::drain_ended_drivers).
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DriverEnded {
    pub id: AnimationId,
    pub finished: bool,
    pub value: f64,
}

/// Record queued for listeners registered without a closure.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ValueUpdate {
    pub tag: NodeTag,
    pub value: f64,
}
