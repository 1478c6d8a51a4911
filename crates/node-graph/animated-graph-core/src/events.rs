//! Routing of external event payloads into value nodes.

use std::borrow::Cow;

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::types::{NodeTag, SinkId};

/// A field path into an event payload and the value node it feeds.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventBinding {
    pub path: Vec<String>,
    pub target: NodeTag,
}

/// Map a handler-style name (`onScroll`) to its dispatched form (`topScroll`).
/// Other names pass through unchanged.
pub fn normalize_event_name(event: &str) -> Cow<'_, str> {
    match event.strip_prefix("on") {
        Some(rest) => Cow::Owned(format!("top{rest}")),
        None => Cow::Borrowed(event),
    }
}

/// `(sink, event name) -> bindings`, kept outside the node graph. Event names are
/// stored and looked up in their normalized form.
#[derive(Debug, Default)]
pub struct EventRouter {
    routes: HashMap<SinkId, HashMap<String, Vec<EventBinding>>>,
}

impl EventRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, sink: SinkId, event: String, binding: EventBinding) {
        self.routes
            .entry(sink)
            .or_default()
            .entry(normalize_event_name(&event).into_owned())
            .or_default()
            .push(binding);
    }

    /// Remove every binding of `(sink, event)` that feeds `target`. Returns how many
    /// were removed.
    pub fn remove(&mut self, sink: &str, event: &str, target: NodeTag) -> usize {
        let Some(events) = self.routes.get_mut(sink) else {
            return 0;
        };
        let event = normalize_event_name(event);
        let Some(bindings) = events.get_mut(&*event) else {
            return 0;
        };
        let before = bindings.len();
        bindings.retain(|b| b.target != target);
        let removed = before - bindings.len();
        if bindings.is_empty() {
            events.remove(&*event);
        }
        if events.is_empty() {
            self.routes.remove(sink);
        }
        removed
    }

    /// Drop every binding that feeds `target`.
    pub fn remove_target(&mut self, target: NodeTag) {
        for events in self.routes.values_mut() {
            for bindings in events.values_mut() {
                bindings.retain(|b| b.target != target);
            }
            events.retain(|_, bindings| !bindings.is_empty());
        }
        self.routes.retain(|_, events| !events.is_empty());
    }

    pub fn bindings(&self, sink: &str, event: &str) -> &[EventBinding] {
        self.routes
            .get(sink)
            .and_then(|events| events.get(&*normalize_event_name(event)))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

/// Walk `path` through nested objects and return the terminal number.
pub fn extract(payload: &serde_json::Value, path: &[String]) -> Option<f64> {
    path.iter()
        .try_fold(payload, |value, key| value.get(key.as_str()))
        .and_then(serde_json::Value::as_f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn path(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|p| p.to_string()).collect()
    }

    #[test]
    fn extracts_nested_number() {
        let payload = json!({ "contentOffset": { "y": 42.5 } });
        assert_eq!(extract(&payload, &path(&["contentOffset", "y"])), Some(42.5));
        assert_eq!(extract(&payload, &path(&["contentOffset", "x"])), None);
        assert_eq!(extract(&payload, &path(&["contentOffset"])), None);
    }

    #[test]
    fn handler_names_match_dispatched_names() {
        assert_eq!(normalize_event_name("onScroll"), "topScroll");
        assert_eq!(normalize_event_name("topScroll"), "topScroll");
        assert_eq!(normalize_event_name("scroll"), "scroll");

        let mut router = EventRouter::new();
        router.add(
            "list".into(),
            "onScroll".into(),
            EventBinding { path: path(&["y"]), target: NodeTag(1) },
        );
        assert_eq!(router.bindings("list", "topScroll").len(), 1);
        assert_eq!(router.bindings("list", "onScroll").len(), 1);
        assert_eq!(router.remove("list", "topScroll", NodeTag(1)), 1);
        assert!(router.is_empty());
    }

    #[test]
    fn remove_prunes_empty_entries() {
        let mut router = EventRouter::new();
        router.add(
            "scroll".into(),
            "onScroll".into(),
            EventBinding { path: path(&["y"]), target: NodeTag(1) },
        );
        router.add(
            "scroll".into(),
            "onScroll".into(),
            EventBinding { path: path(&["x"]), target: NodeTag(2) },
        );
        assert_eq!(router.bindings("scroll", "onScroll").len(), 2);
        assert_eq!(router.remove("scroll", "onScroll", NodeTag(1)), 1);
        assert_eq!(router.bindings("scroll", "onScroll").len(), 1);
        router.remove_target(NodeTag(2));
        assert!(router.is_empty());
        assert!(router.bindings("scroll", "onScroll").is_empty());
    }
}
