//! Value state shared by every value-kind node.

use crate::callbacks::ValueListener;

/// Where listener notifications for a value node go.
#[derive(Debug)]
pub enum Listener {
    /// Queue a [`ValueUpdate`](crate::ValueUpdate) for the host to drain.
    ///
    /// The queue is unbounded: hosts using this mode must call
    /// [`NodesManager::drain_value_updates`](crate::NodesManager::drain_value_updates)
    /// regularly. Pending entries are dropped on unlisten and when the node is dropped.
    Outbox,
    Callback(ValueListener),
}

/// Raw value plus additive offset. The observable value is `value + offset`.
#[derive(Debug)]
pub struct ValueState {
    pub value: f64,
    pub offset: f64,
    pub(crate) listener: Option<Listener>,
}

impl ValueState {
    pub fn new(value: f64, offset: f64) -> Self {
        Self {
            value,
            offset,
            listener: None,
        }
    }

    /// Observable value.
    #[inline]
    pub fn get(&self) -> f64 {
        self.value + self.offset
    }

    /// Merge the offset into the raw value and reset the offset to zero.
    pub fn flatten_offset(&mut self) {
        self.value += self.offset;
        self.offset = 0.0;
    }

    /// Move the raw value into the offset and reset the raw value to zero.
    pub fn extract_offset(&mut self) {
        self.offset += self.value;
        self.value = 0.0;
    }

    pub fn has_listener(&self) -> bool {
        self.listener.is_some()
    }
}

impl Default for ValueState {
    fn default() -> Self {
        Self::new(f64::NAN, 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flatten_then_extract_preserves_observable_value() {
        let mut state = ValueState::new(3.0, 7.0);
        let before = state.get();
        state.flatten_offset();
        assert_eq!(state.value, 10.0);
        assert_eq!(state.offset, 0.0);
        state.extract_offset();
        assert_eq!(state.get(), before);
        assert_eq!(state.value, 0.0);
        assert_eq!(state.offset, 10.0);
    }

    #[test]
    fn default_raw_value_is_nan() {
        let state = ValueState::default();
        assert!(state.value.is_nan());
        assert_eq!(state.offset, 0.0);
    }
}
