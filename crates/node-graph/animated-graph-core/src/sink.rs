//! Consumers of resolved property maps.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::SinkError;
use crate::types::{PropMap, SinkId};

/// Receives the flat property map of each props node after a pass updates it.
///
/// Failures are reported back to the engine, which logs and drops that delivery
/// without aborting the pass.
pub trait PropsSink {
    fn apply_props(&mut self, sink: &str, props: &PropMap) -> Result<(), SinkError>;
}

impl<F> PropsSink for F
where
    F: FnMut(&str, &PropMap) -> Result<(), SinkError>,
{
    fn apply_props(&mut self, sink: &str, props: &PropMap) -> Result<(), SinkError> {
        self(sink, props)
    }
}

#[derive(Debug, Default)]
struct Recorded {
    deliveries: Vec<(SinkId, PropMap)>,
    missing: HashSet<SinkId>,
}

/// Sink that stores every delivery. Clones share the same log.
#[derive(Clone, Debug, Default)]
pub struct RecordingSink {
    inner: Arc<Mutex<Recorded>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Recorded> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Make deliveries to `sink` fail with [`SinkError::Missing`] until it is restored.
    pub fn mark_missing(&self, sink: impl Into<SinkId>) {
        self.lock().missing.insert(sink.into());
    }

    pub fn restore(&self, sink: &str) {
        self.lock().missing.remove(sink);
    }

    /// Remove and return everything delivered so far.
    pub fn take(&self) -> Vec<(SinkId, PropMap)> {
        std::mem::take(&mut self.lock().deliveries)
    }

    pub fn len(&self) -> usize {
        self.lock().deliveries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Most recent map delivered to `sink`.
    pub fn last_for(&self, sink: &str) -> Option<PropMap> {
        self.lock()
            .deliveries
            .iter()
            .rev()
            .find(|(id, _)| id == sink)
            .map(|(_, props)| props.clone())
    }
}

impl PropsSink for RecordingSink {
    fn apply_props(&mut self, sink: &str, props: &PropMap) -> Result<(), SinkError> {
        let mut recorded = self.lock();
        if recorded.missing.contains(sink) {
            return Err(SinkError::Missing(sink.to_string()));
        }
        recorded.deliveries.push((sink.to_string(), props.clone()));
        Ok(())
    }
}
