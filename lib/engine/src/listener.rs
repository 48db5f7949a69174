//! Progress listener registry.
//!
//! Listeners are plain function values invoked synchronously once per node
//! outcome; SSE and logging layers subscribe here. A panicking listener is
//! caught at the call site and its panic discarded, so observers can never
//! abort or corrupt a run.

use crate::error::NodeFault;
use crate::node::NodeId;
use chrono::{DateTime, Utc};
use flowdeck_core::ListenerId;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::panic::{AssertUnwindSafe, catch_unwind};

/// Outcome of one node execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeEventStatus {
    /// The node executed and published an output.
    Success,
    /// The node faulted; its branch is dead for this run.
    Failed,
}

/// A per-node progress event delivered to listeners.
///
/// Consumers must treat events as an unordered multiset keyed by `node_id`;
/// per-node events are atomic but no cross-node ordering is guaranteed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeEvent {
    /// The node this event describes.
    pub node_id: NodeId,
    /// Success or failure.
    pub status: NodeEventStatus,
    /// The published output, on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<JsonValue>,
    /// The fault description, on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// When the outcome was observed.
    pub timestamp: DateTime<Utc>,
}

impl NodeEvent {
    pub(crate) fn success(node_id: NodeId, output: JsonValue) -> Self {
        Self {
            node_id,
            status: NodeEventStatus::Success,
            output: Some(output),
            error: None,
            timestamp: Utc::now(),
        }
    }

    pub(crate) fn failed(node_id: NodeId, fault: &NodeFault) -> Self {
        Self {
            node_id,
            status: NodeEventStatus::Failed,
            output: None,
            error: Some(fault.to_string()),
            timestamp: Utc::now(),
        }
    }
}

type ListenerFn = Box<dyn Fn(&NodeEvent) + Send + Sync>;

/// Registry of progress listeners.
#[derive(Default)]
pub struct ListenerRegistry {
    listeners: Vec<(ListenerId, ListenerFn)>,
}

impl ListenerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a listener, returning a handle for later removal.
    pub fn add_listener(
        &mut self,
        listener: impl Fn(&NodeEvent) + Send + Sync + 'static,
    ) -> ListenerId {
        let id = ListenerId::new();
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Removes a listener by handle. Returns false if the handle is unknown.
    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
        self.listeners.len() != before
    }

    /// Number of registered listeners.
    #[must_use]
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    /// Returns true if no listeners are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Delivers an event to every listener, swallowing panics.
    pub(crate) fn notify(&self, event: &NodeEvent) {
        for (id, listener) in &self.listeners {
            if catch_unwind(AssertUnwindSafe(|| listener(event))).is_err() {
                tracing::warn!(
                    listener_id = %id,
                    node_id = %event.node_id,
                    "listener panicked; discarding"
                );
            }
        }
    }
}

impl std::fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn sample_event() -> NodeEvent {
        NodeEvent::success(NodeId::from("t"), serde_json::json!({"output": "x"}))
    }

    #[test]
    fn listeners_receive_events() {
        let seen: Arc<Mutex<Vec<NodeEvent>>> = Arc::new(Mutex::new(Vec::new()));
        let mut registry = ListenerRegistry::new();

        let seen_clone = Arc::clone(&seen);
        registry.add_listener(move |event| {
            seen_clone.lock().unwrap().push(event.clone());
        });

        registry.notify(&sample_event());
        registry.notify(&sample_event());

        assert_eq!(seen.lock().unwrap().len(), 2);
    }

    #[test]
    fn removed_listener_stops_receiving() {
        let seen: Arc<Mutex<Vec<NodeEvent>>> = Arc::new(Mutex::new(Vec::new()));
        let mut registry = ListenerRegistry::new();

        let seen_clone = Arc::clone(&seen);
        let id = registry.add_listener(move |event| {
            seen_clone.lock().unwrap().push(event.clone());
        });

        registry.notify(&sample_event());
        assert!(registry.remove_listener(id));
        registry.notify(&sample_event());

        assert_eq!(seen.lock().unwrap().len(), 1);
        assert!(registry.is_empty());
    }

    #[test]
    fn remove_unknown_listener_returns_false() {
        let mut registry = ListenerRegistry::new();
        assert!(!registry.remove_listener(ListenerId::new()));
    }

    #[test]
    fn panicking_listener_does_not_block_others() {
        let seen: Arc<Mutex<Vec<NodeEvent>>> = Arc::new(Mutex::new(Vec::new()));
        let mut registry = ListenerRegistry::new();

        registry.add_listener(|_| panic!("bad listener"));
        let seen_clone = Arc::clone(&seen);
        registry.add_listener(move |event| {
            seen_clone.lock().unwrap().push(event.clone());
        });

        registry.notify(&sample_event());

        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn failed_event_carries_fault_message() {
        let fault = NodeFault::ToolNotFound {
            reference_id: "summarize".to_string(),
        };
        let event = NodeEvent::failed(NodeId::from("x"), &fault);
        assert_eq!(event.status, NodeEventStatus::Failed);
        assert!(event.error.as_deref().unwrap().contains("summarize"));
        assert!(event.output.is_none());
    }
}
