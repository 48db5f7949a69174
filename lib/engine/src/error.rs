//! Error types for the engine crate.
//!
//! The taxonomy separates three severities:
//! - `AutomationError`: aggregate-level invariant violations (eager)
//! - `ExecuteError`: structural faults that abort a run and mark the
//!   automation `Error`
//! - `NodeFault`: per-node faults isolated to one branch, captured into the
//!   execution context without failing the run

use crate::node::NodeId;
use flowdeck_core::AutomationId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Errors from automation aggregate operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AutomationError {
    /// Two nodes share the same id within one automation.
    DuplicateNodeId { node_id: NodeId },
}

impl fmt::Display for AutomationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateNodeId { node_id } => {
                write!(f, "duplicate node id: {node_id}")
            }
        }
    }
}

impl std::error::Error for AutomationError {}

/// Structural faults detected during execution.
///
/// These indicate a graph that cannot meaningfully run (or is corrupt). They
/// abort the entire run, leave the automation in `Error` status, and surface
/// to the caller as the `Err` arm of `Executor::execute`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecuteError {
    /// The automation has nodes but none of them is a trigger.
    NoTriggerNode { automation_id: AutomationId },
    /// A trigger node's tool reference did not resolve.
    TriggerToolNotFound {
        node_id: NodeId,
        reference_id: String,
    },
    /// A link points at a node id that does not exist in the graph.
    TargetNodeNotFound { from_node: NodeId, to_node: NodeId },
}

impl fmt::Display for ExecuteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoTriggerNode { automation_id } => {
                write!(f, "automation {automation_id} has no trigger node")
            }
            Self::TriggerToolNotFound {
                node_id,
                reference_id,
            } => {
                write!(
                    f,
                    "trigger node {node_id} references unknown tool '{reference_id}'"
                )
            }
            Self::TargetNodeNotFound { from_node, to_node } => {
                write!(
                    f,
                    "link from {from_node} targets nonexistent node {to_node}"
                )
            }
        }
    }
}

impl std::error::Error for ExecuteError {}

/// Per-node faults isolated to one branch of a run.
///
/// Captured into `ExecutionContext::errors`; sibling branches and the overall
/// run still complete. Serializable so the HTTP layer can return the errors
/// map in a success response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeFault {
    /// The node's tool reference did not resolve.
    ToolNotFound { reference_id: String },
    /// The node's agent reference did not resolve.
    AgentNotFound { reference_id: String },
    /// The resolved executable failed during invocation.
    Invocation { message: String },
    /// The condition evaluator failed for this node.
    Condition { message: String },
}

impl fmt::Display for NodeFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ToolNotFound { reference_id } => {
                write!(f, "tool not found: {reference_id}")
            }
            Self::AgentNotFound { reference_id } => {
                write!(f, "agent not found: {reference_id}")
            }
            Self::Invocation { message } => write!(f, "invocation failed: {message}"),
            Self::Condition { message } => write!(f, "condition evaluation failed: {message}"),
        }
    }
}

impl std::error::Error for NodeFault {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn automation_error_display() {
        let err = AutomationError::DuplicateNodeId {
            node_id: NodeId::from("fetch"),
        };
        assert!(err.to_string().contains("duplicate node id: fetch"));
    }

    #[test]
    fn execute_error_display() {
        let err = ExecuteError::TargetNodeNotFound {
            from_node: NodeId::from("a"),
            to_node: NodeId::from("ghost"),
        };
        assert!(err.to_string().contains("nonexistent node ghost"));
    }

    #[test]
    fn node_fault_display() {
        let err = NodeFault::ToolNotFound {
            reference_id: "summarize".to_string(),
        };
        assert!(err.to_string().contains("tool not found: summarize"));
    }

    #[test]
    fn node_fault_serde_tagged() {
        let fault = NodeFault::Invocation {
            message: "boom".to_string(),
        };
        let json = serde_json::to_value(&fault).expect("serialize");
        assert_eq!(json["kind"], "invocation");
        assert_eq!(json["message"], "boom");
    }
}
