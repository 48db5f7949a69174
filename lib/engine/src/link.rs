//! Link types for automation graphs.
//!
//! Links are directed, keyed data-flow edges: "take the value published under
//! `from_output` by `from_node` and deliver it as `to_input` into `to_node`".
//! Multiple links may terminate at the same node; the executor merges them
//! into a keyed input object (fan-in).

use crate::node::NodeId;
use serde::{Deserialize, Serialize};

/// Default output slot name used by the generic UI-drawn edge.
pub const DEFAULT_OUTPUT: &str = "output";

/// Default input slot name used by the generic UI-drawn edge.
pub const DEFAULT_INPUT: &str = "input";

/// A directed data-flow edge between two nodes' named slots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    /// The source node id.
    pub from_node: NodeId,
    /// The output slot on the source node.
    pub from_output: String,
    /// The target node id.
    pub to_node: NodeId,
    /// The input slot on the target node.
    pub to_input: String,
}

impl Link {
    /// Creates a new link between named slots.
    #[must_use]
    pub fn new(
        from_node: impl Into<NodeId>,
        from_output: impl Into<String>,
        to_node: impl Into<NodeId>,
        to_input: impl Into<String>,
    ) -> Self {
        Self {
            from_node: from_node.into(),
            from_output: from_output.into(),
            to_node: to_node.into(),
            to_input: to_input.into(),
        }
    }

    /// Creates a link using the default slot names ("output" -> "input").
    #[must_use]
    pub fn direct(from_node: impl Into<NodeId>, to_node: impl Into<NodeId>) -> Self {
        Self::new(from_node, DEFAULT_OUTPUT, to_node, DEFAULT_INPUT)
    }

    /// Returns true if this link uses the default slot names on both ends.
    ///
    /// A single inbound link with default slots delivers the source output
    /// unwrapped instead of as a keyed object.
    #[must_use]
    pub fn is_default_slots(&self) -> bool {
        self.from_output == DEFAULT_OUTPUT && self.to_input == DEFAULT_INPUT
    }
}
