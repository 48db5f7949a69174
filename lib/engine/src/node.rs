//! Node types for automation graphs.
//!
//! Nodes are the building blocks of automations. Each node has:
//! - An id unique within its automation
//! - A type determining how the executor dispatches it
//! - A reference id resolving to an invocable unit in an external registry
//! - A free-form configuration map captured by the editor

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// A unique identifier for a node within an automation.
///
/// Unlike the platform's ULID-backed ids, node ids are authored in the visual
/// editor and are free-form strings. Uniqueness is enforced per automation,
/// not globally.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Creates a node id from a string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// The type of an automation node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    /// Entry points that initiate an execution run.
    Trigger,
    /// A step backed by a registered tool.
    Tool,
    /// A step backed by a registered agent (wraps an LLM call; opaque here).
    Agent,
    /// Conditional branching over named predicates.
    Condition,
}

/// A node in an automation graph.
///
/// Nodes are immutable once constructed; `Automation::update` replaces the
/// whole collection rather than patching individual nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Unique identifier for this node within the automation.
    pub id: NodeId,
    /// The node type, determining executor dispatch.
    #[serde(rename = "type")]
    pub node_type: NodeType,
    /// Opaque id into the external tool/agent/condition registry.
    pub reference_id: String,
    /// Free-form configuration captured by the editor.
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub config: serde_json::Map<String, JsonValue>,
}

impl Node {
    /// Creates a new node with an empty configuration.
    #[must_use]
    pub fn new(id: impl Into<NodeId>, node_type: NodeType, reference_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            node_type,
            reference_id: reference_id.into(),
            config: serde_json::Map::new(),
        }
    }

    /// Adds a configuration entry.
    #[must_use]
    pub fn with_config(mut self, key: impl Into<String>, value: JsonValue) -> Self {
        self.config.insert(key.into(), value);
        self
    }

    /// Returns true if this node is a trigger (graph entry point).
    #[must_use]
    pub fn is_trigger(&self) -> bool {
        self.node_type == NodeType::Trigger
    }

    /// Returns a boolean configuration entry, if present and boolean.
    #[must_use]
    pub fn config_bool(&self, key: &str) -> Option<bool> {
        self.config.get(key).and_then(JsonValue::as_bool)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_id_from_str() {
        let id = NodeId::from("fetch-mail");
        assert_eq!(id.as_str(), "fetch-mail");
        assert_eq!(id.to_string(), "fetch-mail");
    }

    #[test]
    fn trigger_detection() {
        let trigger = Node::new("t", NodeType::Trigger, "webhook");
        let tool = Node::new("x", NodeType::Tool, "summarize");
        assert!(trigger.is_trigger());
        assert!(!tool.is_trigger());
    }

    #[test]
    fn config_bool_lookup() {
        let node = Node::new("c", NodeType::Condition, "router")
            .with_config("evaluate_all", serde_json::json!(false))
            .with_config("label", serde_json::json!("not a bool"));

        assert_eq!(node.config_bool("evaluate_all"), Some(false));
        assert_eq!(node.config_bool("label"), None);
        assert_eq!(node.config_bool("missing"), None);
    }

    #[test]
    fn node_serde_roundtrip() {
        let node = Node::new("t", NodeType::Trigger, "webhook")
            .with_config("path", serde_json::json!("/hooks/inbox"));
        let json = serde_json::to_string(&node).expect("serialize");
        let parsed: Node = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(node, parsed);
    }

    #[test]
    fn node_type_serializes_snake_case() {
        let json = serde_json::to_string(&NodeType::Condition).expect("serialize");
        assert_eq!(json, "\"condition\"");
    }
}
